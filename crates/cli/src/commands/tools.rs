//! `safina tools`: Print the catalog advertised to tool selection.

use crate::runtime;
use safina_config::AppConfig;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = runtime::build_orchestrator(config)?;

    println!("🧰 Tool Catalog");
    println!("===============");
    for tool in orchestrator.registry().all_tools() {
        println!();
        println!("  {} (handler: {})", tool.name, tool.handler);
        println!("    {}", tool.description);
        for (param, spec) in &tool.parameters {
            let required = if spec.required { "required" } else { "optional" };
            println!("    • {param}: {} ({required}) — {}", spec.kind, spec.description);
        }
    }
    Ok(())
}
