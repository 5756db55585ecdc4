//! `kgrag config`: Configuration management commands.

use kgrag_config::{AppConfig, EntityIndexKind};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() {
                warnings.push("No API key set (set KGRAG_API_KEY or OPENAI_API_KEY env var)");
            }

            match &config.graph.triples_path {
                None => warnings.push("No triple file set (graph.triples_path or KGRAG_GRAPH)"),
                Some(path) if !path.exists() => warnings.push("Triple file does not exist"),
                Some(_) => {}
            }

            if config.graph.entity_index == EntityIndexKind::Vector
                && config.graph.embedding_model.is_empty()
            {
                warnings.push("Vector entity index selected without graph.embedding_model");
            }

            if config.budget.rerank_candidate_cap == 0 {
                warnings.push("budget.rerank_candidate_cap is 0; path reranking will never run");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!("   Mode:      {:?}", config.query.mode);
            println!("   Seeding:   {:?}", config.query.seed_mode);
            println!("   Budget:    {} tokens", config.budget.max_context_tokens);
            println!(
                "   Graph:     {}",
                config
                    .graph
                    .triples_path
                    .as_ref()
                    .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");
    if config_path.exists() && !force {
        println!("   ⚠️  {} already exists (use --force to overwrite)", config_path.display());
        return Ok(());
    }
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
    println!("   ✅ Wrote {}", config_path.display());
    Ok(())
}
