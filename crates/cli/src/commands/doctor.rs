//! `kgrag doctor`: Diagnose configuration, graph and provider health.

use kgrag_config::AppConfig;
use kgrag_core::Provider;
use kgrag_graph::load_triples;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 kgrag Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, run `kgrag config init` (using defaults)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured; set KGRAG_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    match &config.graph.triples_path {
        Some(path) => match load_triples(path, config.graph.path_limit).await {
            Ok((_, report)) if report.triples > 0 => {
                println!(
                    "  ✅ Graph loaded: {} triples, {} entities, {} edges ({} lines skipped)",
                    report.triples, report.entities, report.edges, report.skipped
                );
            }
            Ok(_) => {
                println!("  ❌ Triple file {} contains no usable triples", path.display());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Graph could not be loaded: {e}");
                issues += 1;
            }
        },
        None => {
            println!("  ❌ No triple file; set graph.triples_path or KGRAG_GRAPH");
            issues += 1;
        }
    }

    let router = kgrag_providers::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' responded with an error", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ No default provider configured");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
