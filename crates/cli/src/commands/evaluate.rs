//! `kgrag eval`: Score a results file and write per-item and aggregate reports.

use kgrag_eval::{EvalStats, HitsAtK, ItemScore, RunRecord, load_run_records, score_item};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One line of `evaluation_result.jsonl`.
#[derive(Serialize)]
struct ScoredLine<'a> {
    #[serde(flatten)]
    record: &'a RunRecord,
    #[serde(flatten)]
    score: &'a ItemScore,
}

fn default_output_dir(results: &Path) -> PathBuf {
    results
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("evaluation_output")
}

fn pct(x: f64) -> String {
    format!("{x:.4} ({:.2}%)", x * 100.0)
}

fn print_hits(hits: &HitsAtK, indent: &str) {
    println!("{indent}hits@1:  {}", pct(hits.hits_at_1.accuracy));
    println!("{indent}hits@5:  {}", pct(hits.hits_at_5.accuracy));
    println!("{indent}hits@10: {}", pct(hits.hits_at_10.accuracy));
}

fn print_breakdown(title: &str, groups: &BTreeMap<String, HitsAtK>) {
    println!("\n  {title}:");
    for (label, hits) in groups {
        println!("    {label} ({} questions)", hits.hits_at_1.count);
        print_hits(hits, "      ");
    }
}

fn print_stats(stats: &EvalStats) {
    println!();
    println!("  📊 Evaluation");
    println!("  ========================================");

    let ex = &stats.extraction;
    println!("\n  Extraction:");
    println!("    answer1 extracted:  {}/{} {}", ex.answer1_extracted, ex.total, pct(ex.answer1_rate));
    println!("    any of answer1..5:  {}/{} {}", ex.any_extracted, ex.total, pct(ex.any_rate));
    for position in ex.by_position.keys() {
        println!(
            "      answer{position}: {} ({:.4})",
            ex.by_position[position],
            ex.position_rate(*position)
        );
    }

    println!("\n  Overall ({} questions):", stats.overall.hits_at_1.count);
    print_hits(&stats.overall, "    ");

    print_breakdown("By question label", &stats.by_qlabel);
    print_breakdown("By answer type", &stats.by_answer_type);

    if stats.latency.samples > 0 {
        println!("\n  Run telemetry ({} samples):", stats.latency.samples);
        println!("    Average retrieval time: {:.1} ms", stats.latency.avg_retrieval_ms);
        println!("    Average total time:     {:.1} ms", stats.latency.avg_total_ms);
        println!("    Average context tokens: {:.1}", stats.latency.avg_context_tokens);
    }
}

pub async fn run(results: &Path, output_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (records, skipped) = load_run_records(results).await?;
    if skipped > 0 {
        println!("  ⚠️  Skipped {skipped} unparseable line(s)");
    }

    let scores: Vec<ItemScore> = records
        .iter()
        .map(|r| score_item(&r.answers, &r.output))
        .collect();

    let mut lines = String::new();
    for (record, score) in records.iter().zip(&scores) {
        lines.push_str(&serde_json::to_string(&ScoredLine { record, score })?);
        lines.push('\n');
    }

    let stats = EvalStats::from_scored(records.iter().zip(&scores));

    let output_dir = output_dir.unwrap_or_else(|| default_output_dir(results));
    tokio::fs::create_dir_all(&output_dir).await?;
    let result_path = output_dir.join("evaluation_result.jsonl");
    let stats_path = output_dir.join("statistics.json");
    tokio::fs::write(&result_path, lines).await?;
    tokio::fs::write(&stats_path, serde_json::to_string_pretty(&stats)?).await?;

    print_stats(&stats);

    println!();
    println!("  ✅ Scored {} results", records.len());
    println!("  ✅ Per-item results: {}", result_path.display());
    println!("  ✅ Statistics:       {}", stats_path.display());

    Ok(())
}
