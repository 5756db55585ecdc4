//! Per-question scoring.
//!
//! Outputs are expected to list ranked candidates as `answer1:"..."`,
//! `answer2:"..."` and so on. Three hit measures are computed:
//!
//! | Measure | Matches when |
//! |---------|--------------|
//! | hits@1  | the extracted `answer1` equals or contains a gold answer |
//! | hits@5  | any extracted `answer1`..`answer5` equals or contains a gold answer |
//! | hits@10 | a gold answer appears anywhere in the whole output |
//!
//! All comparisons are made on [`normalize_text`] forms.

use crate::normalize::normalize_text;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Positions considered by hits@5.
pub const HIT5_POSITIONS: usize = 5;

const QUOTES: &str = "\"'“”‘’";

/// Scores for one output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub hits_at_1: bool,
    pub hits_at_5: bool,
    pub hits_at_10: bool,
    #[serde(default)]
    pub extracted_answer1: Option<String>,
    /// Extracted candidates keyed by position (1-based).
    #[serde(default)]
    pub extracted: BTreeMap<usize, String>,
    /// Match result per candidate inspected for hits@5, up to the first hit.
    #[serde(default)]
    pub hit5_details: BTreeMap<usize, bool>,
}

fn answer_patterns(position: usize) -> [String; 2] {
    [
        format!(r"(?i)answer{position}\s*:\s*[{QUOTES}]([^{QUOTES}]*?)[{QUOTES}]"),
        format!(r"(?i)answer{position}\s*:\s*([^,\n\r]+)"),
    ]
}

/// Extract the candidate labelled `answer{position}`.
///
/// A quoted value is preferred; otherwise the text up to the next comma or
/// line break is taken. Blank values count as missing.
pub fn extract_answer(output: &str, position: usize) -> Option<String> {
    if output.is_empty() {
        return None;
    }

    for pattern in answer_patterns(position) {
        let re = Regex::new(&pattern).ok()?;
        if let Some(text) = re
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
        {
            return Some(text.to_string());
        }
    }
    None
}

/// Extract `answer1`..`answer{up_to}`, skipping positions that are absent.
pub fn extract_answers(output: &str, up_to: usize) -> BTreeMap<usize, String> {
    (1..=up_to)
        .filter_map(|position| extract_answer(output, position).map(|text| (position, text)))
        .collect()
}

fn normalized_answers(answers: &[String]) -> Vec<String> {
    answers
        .iter()
        .map(|a| normalize_text(a))
        .filter(|a| !a.is_empty())
        .collect()
}

fn candidate_matches(gold: &[String], candidate: &str) -> bool {
    let candidate = normalize_text(candidate);
    if candidate.is_empty() {
        return false;
    }
    gold.iter()
        .any(|g| *g == candidate || candidate.contains(g.as_str()))
}

/// Score one output against its gold answers.
pub fn score_item(answers: &[String], output: &str) -> ItemScore {
    let gold = normalized_answers(answers);

    let extracted_answer1 = extract_answer(output, 1);
    let extracted = extract_answers(output, HIT5_POSITIONS);

    if gold.is_empty() || output.is_empty() {
        return ItemScore {
            extracted_answer1,
            extracted,
            ..ItemScore::default()
        };
    }

    let normalized_output = normalize_text(output);
    let hits_at_10 = gold.iter().any(|g| normalized_output.contains(g.as_str()));

    let hits_at_1 = extracted_answer1
        .as_deref()
        .is_some_and(|a| candidate_matches(&gold, a));

    let mut hit5_details = BTreeMap::new();
    let mut hits_at_5 = false;
    for (&position, candidate) in &extracted {
        let matched = candidate_matches(&gold, candidate);
        hit5_details.insert(position, matched);
        if matched {
            hits_at_5 = true;
            break;
        }
    }

    ItemScore {
        hits_at_1,
        hits_at_5,
        hits_at_10,
        extracted_answer1,
        extracted,
        hit5_details,
    }
}
