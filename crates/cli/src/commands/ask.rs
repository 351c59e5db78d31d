//! `safina ask`: Run one query and print the response as JSON.

use crate::runtime;
use safina_config::AppConfig;

pub async fn run(
    config: &AppConfig,
    query: &str,
    session: Option<String>,
    provider: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = runtime::build_orchestrator(config)?;
    let response = orchestrator
        .process_query(query, session.as_deref(), provider.as_deref())
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
