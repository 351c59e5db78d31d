//! `safina providers`: Show configured providers and whether they respond.

use safina_config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let manager = safina_providers::build_from_config(config);

    println!("🤖 Providers");
    println!("============");
    println!();

    if manager.is_empty() {
        println!("  No providers enabled. Add one under [providers] in config.toml.");
        return Ok(());
    }

    let default = manager.default_name().unwrap_or("-");
    for (name, available) in manager.list_availability().await {
        let mark = if available { "✅" } else { "❌" };
        let role = if name == default { " (default)" } else { "" };
        println!("  {mark} {name}{role}");
    }

    if !manager.fallback_order().is_empty() {
        println!();
        println!("  Fallback order: {}", manager.fallback_order().join(" → "));
    }

    println!();
    println!("  Environment variables:");
    println!("    SAFINA_API_KEY, GEMINI_API_KEY, SAFINA_PROVIDER, SAFINA_MODEL");

    Ok(())
}
