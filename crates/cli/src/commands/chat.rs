//! `safina chat`: Interactive mode on a single session.

use crate::runtime;
use safina_config::AppConfig;
use safina_core::response::Status;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config: &AppConfig, provider: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = runtime::build_orchestrator(config)?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          Safina — Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", provider.as_deref().unwrap_or(&config.default_provider));
    println!("  Tools:     {}", orchestrator.registry().all_tools().len());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session: Option<String> = None;

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }

        let response = orchestrator
            .process_query(query, session.as_deref(), provider.as_deref())
            .await;
        session = response.session_id.clone();

        println!();
        let prefix = if response.status == Status::Error { "[Error]" } else { "Safina >" };
        for text in response.message.lines() {
            println!("  {prefix} {text}");
        }
        for suggestion in &response.suggestions {
            println!("    → {suggestion}");
        }
        println!();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
