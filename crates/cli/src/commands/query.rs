//! `kgrag query`: Answer a single question.

use super::{Overrides, build_engine, load_config};

pub async fn run(
    question: &str,
    overrides: Overrides,
    show_context: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let engine = build_engine(&config).await?;

    eprint!("  Thinking...");
    let outcome = engine.query(question).await;
    eprint!("\r              \r");
    let outcome = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if show_context {
        match &outcome.context {
            Some(context) => {
                println!("── Context ({} tokens) ──", outcome.metadata.context_tokens);
                println!("{context}");
                println!();
            }
            None => println!("── No evidence found ──\n"),
        }
    }

    println!("{}", outcome.answer);
    println!();
    println!(
        "  Strategy: {}  Seeds: {}  Calls: {}  Retrieval: {} ms  Total: {} ms",
        outcome.metadata.strategy,
        outcome.metadata.seeds.len(),
        outcome.metadata.generation_calls,
        outcome.timings.retrieval_ms,
        outcome.timings.total_ms
    );

    Ok(())
}
