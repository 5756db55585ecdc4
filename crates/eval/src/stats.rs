//! Aggregate statistics over a scored run.

use crate::dataset::RunRecord;
use crate::scoring::{HIT5_POSITIONS, ItemScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Correct / total for one measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitTally {
    pub count: usize,
    pub correct: usize,
    pub accuracy: f64,
}

impl HitTally {
    fn record(&mut self, hit: bool) {
        self.count += 1;
        if hit {
            self.correct += 1;
        }
        self.accuracy = rate(self.correct, self.count);
    }
}

/// hits@1, hits@5 and hits@10 for one slice of the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitsAtK {
    pub hits_at_1: HitTally,
    pub hits_at_5: HitTally,
    pub hits_at_10: HitTally,
}

impl HitsAtK {
    fn record(&mut self, score: &ItemScore) {
        self.hits_at_1.record(score.hits_at_1);
        self.hits_at_5.record(score.hits_at_5);
        self.hits_at_10.record(score.hits_at_10);
    }
}

/// How often the `answerN` format could be read back from outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total: usize,
    pub answer1_extracted: usize,
    pub answer1_rate: f64,
    pub any_extracted: usize,
    pub any_rate: f64,
    /// Outputs with a value at each position 1..=5.
    pub by_position: BTreeMap<usize, usize>,
}

impl ExtractionStats {
    pub fn position_rate(&self, position: usize) -> f64 {
        rate(
            self.by_position.get(&position).copied().unwrap_or(0),
            self.total,
        )
    }
}

/// Average run telemetry over the records that carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub avg_retrieval_ms: f64,
    pub avg_total_ms: f64,
    pub avg_context_tokens: f64,
}

/// Everything reported for one evaluated run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalStats {
    pub overall: HitsAtK,
    pub by_qlabel: BTreeMap<String, HitsAtK>,
    pub by_answer_type: BTreeMap<String, HitsAtK>,
    pub extraction: ExtractionStats,
    pub latency: LatencyStats,
}

impl EvalStats {
    pub fn from_scored<'a>(items: impl IntoIterator<Item = (&'a RunRecord, &'a ItemScore)>) -> Self {
        let mut stats = Self {
            extraction: ExtractionStats {
                by_position: (1..=HIT5_POSITIONS).map(|p| (p, 0)).collect(),
                ..ExtractionStats::default()
            },
            ..Self::default()
        };

        let (mut retrieval_sum, mut total_sum, mut tokens_sum) = (0u64, 0u64, 0usize);

        for (record, score) in items {
            stats.overall.record(score);
            stats
                .by_qlabel
                .entry(record.qlabel())
                .or_default()
                .record(score);
            stats
                .by_answer_type
                .entry(record.answer_type())
                .or_default()
                .record(score);

            let extraction = &mut stats.extraction;
            extraction.total += 1;
            if score.extracted_answer1.is_some() {
                extraction.answer1_extracted += 1;
            }
            if !score.extracted.is_empty() {
                extraction.any_extracted += 1;
            }
            for position in score.extracted.keys() {
                *extraction.by_position.entry(*position).or_default() += 1;
            }

            if let (Some(tokens), Some(retrieval), Some(total)) =
                (record.context_tokens, record.retrieval_ms, record.total_ms)
            {
                stats.latency.samples += 1;
                tokens_sum += tokens;
                retrieval_sum += retrieval;
                total_sum += total;
            }
        }

        let extraction = &mut stats.extraction;
        extraction.answer1_rate = rate(extraction.answer1_extracted, extraction.total);
        extraction.any_rate = rate(extraction.any_extracted, extraction.total);

        let samples = stats.latency.samples;
        if samples > 0 {
            stats.latency.avg_retrieval_ms = retrieval_sum as f64 / samples as f64;
            stats.latency.avg_total_ms = total_sum as f64 / samples as f64;
            stats.latency.avg_context_tokens = tokens_sum as f64 / samples as f64;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::QaItem;
    use crate::scoring::score_item;

    fn record(answer: &str, output: &str, qlabel: Option<&str>) -> RunRecord {
        let mut attributes = serde_json::Map::new();
        if let Some(label) = qlabel {
            attributes.insert("qlabel".into(), label.into());
        }
        let item = QaItem {
            id: 0,
            question: "q".into(),
            answers: vec![answer.into()],
            attributes,
        };
        RunRecord::new(&item, output)
    }

    fn evaluate(records: &[RunRecord]) -> EvalStats {
        let scores: Vec<ItemScore> = records
            .iter()
            .map(|r| score_item(&r.answers, &r.output))
            .collect();
        EvalStats::from_scored(records.iter().zip(scores.iter()))
    }

    #[test]
    fn overall_and_per_label_accuracy() {
        let records = vec![
            record("Paris", "answer1:\"Paris\"", Some("equal")),
            record("Paris", "answer1:\"Lyon\", answer2:\"Paris\"", Some("equal")),
            record("Paris", "I don't know", None),
        ];
        let stats = evaluate(&records);

        assert_eq!(stats.overall.hits_at_1.count, 3);
        assert_eq!(stats.overall.hits_at_1.correct, 1);
        assert_eq!(stats.overall.hits_at_5.correct, 2);
        assert_eq!(stats.overall.hits_at_10.correct, 2);
        assert!((stats.overall.hits_at_5.accuracy - 2.0 / 3.0).abs() < 1e-9);

        let equal = &stats.by_qlabel["equal"];
        assert_eq!(equal.hits_at_5.correct, 2);
        assert_eq!(equal.hits_at_5.accuracy, 1.0);
        assert_eq!(stats.by_qlabel["Unknown"].hits_at_10.correct, 0);
        assert_eq!(stats.by_answer_type["Unknown"].hits_at_1.count, 3);
    }

    #[test]
    fn extraction_rates() {
        let records = vec![
            record("a", "answer1:\"a\", answer2:\"b\"", None),
            record("a", "answer2:\"a\"", None),
            record("a", "nothing", None),
            record("a", "still nothing", None),
        ];
        let stats = evaluate(&records);
        let ex = &stats.extraction;
        assert_eq!(ex.total, 4);
        assert_eq!(ex.answer1_extracted, 1);
        assert_eq!(ex.any_extracted, 2);
        assert_eq!(ex.answer1_rate, 0.25);
        assert_eq!(ex.any_rate, 0.5);
        assert_eq!(ex.by_position[&2], 2);
        assert_eq!(ex.position_rate(2), 0.5);
        assert_eq!(ex.position_rate(5), 0.0);
    }

    #[test]
    fn latency_averages_only_records_with_telemetry() {
        let records = vec![
            record("a", "a", None).with_telemetry(100, 10, 1000),
            record("a", "a", None).with_telemetry(300, 30, 3000),
            record("a", "a", None),
        ];
        let stats = evaluate(&records);
        assert_eq!(stats.latency.samples, 2);
        assert_eq!(stats.latency.avg_context_tokens, 200.0);
        assert_eq!(stats.latency.avg_retrieval_ms, 20.0);
        assert_eq!(stats.latency.avg_total_ms, 2000.0);
    }

    #[test]
    fn empty_run_has_zero_rates() {
        let stats = EvalStats::from_scored(std::iter::empty());
        assert_eq!(stats.overall.hits_at_1.count, 0);
        assert_eq!(stats.extraction.answer1_rate, 0.0);
        assert_eq!(stats.latency.samples, 0);
        assert_eq!(stats.extraction.by_position.len(), 5);
    }
}
