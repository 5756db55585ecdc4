//! Answer-text normalization.
//!
//! Both the gold answers and the model output pass through [`normalize_text`]
//! before any comparison, so the rules only need to be consistent, not
//! linguistically exact. The synonym table is applied as plain substring
//! replacement, in order, to stay score-compatible with earlier runs.

/// Whole-word abbreviations expanded before synonym mapping.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("uk", "united kingdom"),
    ("usa", "united states america"),
    ("us", "united states"),
    ("pm", "prime minister"),
    ("pres", "president"),
    ("min", "minister"),
    ("dept", "department"),
    ("gov", "government"),
    ("assoc", "association"),
    ("org", "organization"),
    ("corp", "corporation"),
    ("ltd", "limited"),
    ("inc", "incorporated"),
];

/// Substring replacements, applied in this order.
const SYNONYMS: &[(&str, &str)] = &[
    ("cabinet", "council"),
    ("advisors", "advisers"),
    ("adviser", "advisor"),
    ("britain", "united kingdom"),
    ("england", "united kingdom"),
    ("great britain", "united kingdom"),
    ("america", "united states"),
    ("usa", "united states"),
    ("insurgency", "rebellion"),
    ("violence", "attack"),
    ("unconventional violence", "terrorist attack"),
    ("prime minister", "pm"),
    ("president", "pres"),
];

fn expand_abbreviation(word: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == word)
        .map_or(word, |(_, full)| full)
}

/// Canonical form of an answer or output for matching.
///
/// Lower-cases, turns every non-word character into a space (which also
/// splits `2015-06-20` and `12:30` into their numeric parts), expands
/// abbreviations, maps synonyms and collapses adjacent repeated words.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();

    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut expanded = stripped
        .split_whitespace()
        .map(expand_abbreviation)
        .collect::<Vec<_>>()
        .join(" ");

    for (from, to) in SYNONYMS {
        if expanded.contains(from) {
            expanded = expanded.replace(from, to);
        }
    }

    let mut words: Vec<&str> = Vec::new();
    for word in expanded.split_whitespace() {
        if words.last() != Some(&word) {
            words.push(word);
        }
    }
    words.join(" ")
}
