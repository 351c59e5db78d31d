//! `safina doctor`: Diagnose configuration, data files, and providers.

use safina_config::AppConfig;
use safina_tools::{FaqBook, TableLookup};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Safina Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config before continuing.");
            return Ok(());
        }
    };

    if config.api_key.is_some() || config.providers.values().any(|p| p.api_key.is_some()) {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set SAFINA_API_KEY or GEMINI_API_KEY");
        issues += 1;
    }

    match TableLookup::from_csv_files(&config.data.qualified_path, &config.data.disqualified_path) {
        Ok(lookup) if lookup.qualified_len() + lookup.disqualified_len() > 0 => {
            println!(
                "  ✅ Eligibility data loaded ({} qualified, {} disqualified)",
                lookup.qualified_len(),
                lookup.disqualified_len()
            );
        }
        Ok(_) => {
            println!("  ⚠️  Eligibility data is empty — check [data] paths");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Eligibility data unreadable: {e}");
            issues += 1;
        }
    }

    match FaqBook::from_json_file(&config.data.faq_path) {
        Ok(book) if !book.is_empty() => println!("  ✅ FAQ knowledge base loaded ({} entries)", book.len()),
        Ok(_) => {
            println!("  ⚠️  FAQ knowledge base is empty");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ FAQ file unreadable: {e}");
            issues += 1;
        }
    }

    let manager = safina_providers::build_from_config(&config);
    let availability = manager.list_availability().await;
    let up = availability.values().filter(|v| **v).count();
    if up > 0 {
        println!("  ✅ {up}/{} provider(s) reachable", availability.len());
    } else {
        println!("  ❌ No provider reachable — queries will return a degraded response");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
