pub mod batch;
pub mod config_cmd;
pub mod doctor;
pub mod evaluate;
pub mod query;

use kgrag_config::{AppConfig, EntityIndexKind, QueryMode};
use kgrag_core::graph::EntityLookup;
use kgrag_graph::{KeywordEntityIndex, VectorEntityIndex, load_triples};
use kgrag_pipeline::{GraphServices, QueryEngine};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct Overrides {
    pub graph: Option<PathBuf>,
    pub mode: Option<QueryMode>,
}

/// Load the configuration and apply `overrides`.
pub fn load_config(overrides: Overrides) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(graph) = overrides.graph {
        config.graph.triples_path = Some(graph);
    }
    if let Some(mode) = overrides.mode {
        config.query.mode = mode;
    }
    Ok(config)
}

fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() || config.default_provider == "ollama" {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    KGRAG_API_KEY   = 'sk-...'   (generic)");
    eprintln!("    OPENAI_API_KEY  = 'sk-...'   (for OpenAI direct)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Load the knowledge graph, build the entity index and wire the query engine.
pub async fn build_engine(config: &AppConfig) -> Result<QueryEngine, Box<dyn std::error::Error>> {
    require_api_key(config)?;

    let path = config
        .graph
        .triples_path
        .clone()
        .ok_or("No triple file configured. Set graph.triples_path, KGRAG_GRAPH or pass --graph")?;

    let (graph, report) = load_triples(&path, config.graph.path_limit).await?;
    if report.triples == 0 {
        return Err(format!("No triples loaded from {}", path.display()).into());
    }
    let graph = Arc::new(graph.with_separator(config.budget.relation_separator.clone()));

    let router = kgrag_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let entities: Arc<dyn EntityLookup> = match config.graph.entity_index {
        EntityIndexKind::Keyword => Arc::new(KeywordEntityIndex::new(graph.entity_names())),
        EntityIndexKind::Vector => Arc::new(
            VectorEntityIndex::build(
                provider.clone(),
                config.graph.embedding_model.clone(),
                graph.entity_names(),
            )
            .await?,
        ),
    };

    let services = GraphServices {
        entities,
        graph: graph.clone(),
        relations: graph,
    };
    Ok(QueryEngine::from_config(config, provider, services))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_rejected() {
        let mut config = AppConfig::default();
        config.api_key = None;
        assert!(require_api_key(&config).is_err());

        config.default_provider = "ollama".into();
        assert!(require_api_key(&config).is_ok());
    }

    #[tokio::test]
    async fn engine_needs_a_triple_file() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.graph.triples_path = None;
        let err = build_engine(&config).await.err().unwrap();
        assert!(err.to_string().contains("No triple file configured"));
    }

    #[tokio::test]
    async fn engine_builds_over_keyword_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "Paris\tcapitalOf\tFrance\t2015-06-20\n").unwrap();

        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.graph.triples_path = Some(path);
        config.query.mode = QueryMode::PathRerank;

        let engine = build_engine(&config).await.unwrap();
        assert_eq!(engine.strategy(), "path_rerank");
        assert_eq!(engine.model(), config.default_model);
    }
}
