//! Budgeted shrink loops.
//!
//! Every loop removes content from the tail only and re-measures after each
//! removal, so the result is always a prefix of the input. A budget that
//! cannot be met is not an error: the loop returns what is left (possibly
//! nothing) with `fits == false`.

use serde::{Deserialize, Serialize};

/// What a shrink loop did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkReport {
    /// Number of cost evaluations performed.
    pub steps: usize,
    /// List items or characters removed.
    pub removed: usize,
    pub initial_cost: usize,
    pub final_cost: usize,
    /// Whether the final cost is within budget.
    pub fits: bool,
}

impl ShrinkReport {
    pub fn trimmed(&self) -> bool {
        self.removed > 0
    }
}

/// List-tail strategy: drop the last item until `cost(render(items)) <= budget`
/// or the list is empty.
///
/// Performs at most `items.len() + 1` evaluations. Returns the final rendering.
pub fn shrink_list<T>(
    items: &mut Vec<T>,
    render: impl Fn(&[T]) -> String,
    cost: impl Fn(&str) -> usize,
    budget: usize,
) -> (String, ShrinkReport) {
    let mut rendered = render(items);
    let mut current = cost(&rendered);
    let initial_cost = current;
    let mut steps = 1;
    let mut removed = 0;

    while current > budget && !items.is_empty() {
        items.pop();
        removed += 1;
        rendered = render(items);
        current = cost(&rendered);
        steps += 1;
    }

    let report = ShrinkReport {
        steps,
        removed,
        initial_cost,
        final_cost: current,
        fits: current <= budget,
    };
    (rendered, report)
}

/// Ratio strategy: keep the first `ratio` share of characters until
/// `cost(text) <= budget` or the text is empty.
///
/// Each round removes at least one character, so the loop terminates even
/// when `floor(len * ratio) == len`.
pub fn shrink_ratio(
    text: &str,
    ratio: f64,
    cost: impl Fn(&str) -> usize,
    budget: usize,
) -> (String, ShrinkReport) {
    let ratio = ratio.clamp(0.0, 1.0);
    let mut current = text.to_string();
    let mut current_cost = cost(&current);
    let initial_cost = current_cost;
    let mut chars = current.chars().count();
    let original_chars = chars;
    let mut steps = 1;

    while current_cost > budget && chars > 0 {
        let keep = ((chars as f64 * ratio).floor() as usize).min(chars - 1);
        let cut = current
            .char_indices()
            .nth(keep)
            .map(|(i, _)| i)
            .unwrap_or(current.len());
        current.truncate(cut);
        chars = keep;
        current_cost = cost(&current);
        steps += 1;
    }

    let report = ShrinkReport {
        steps,
        removed: original_chars - chars,
        initial_cost,
        final_cost: current_cost,
        fits: current_cost <= budget,
    };
    (current, report)
}

/// Token clamp: the longest character prefix of `text` whose cost fits.
///
/// Assumes `cost` never decreases as the prefix grows. Uses a binary search,
/// so large inputs need only a logarithmic number of evaluations.
pub fn clamp_to_budget(
    text: &str,
    cost: impl Fn(&str) -> usize,
    budget: usize,
) -> (String, ShrinkReport) {
    let initial_cost = cost(text);
    if initial_cost <= budget {
        return (
            text.to_string(),
            ShrinkReport {
                steps: 1,
                removed: 0,
                initial_cost,
                final_cost: initial_cost,
                fits: true,
            },
        );
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = boundaries.len() - 1;

    // Invariant: prefix of `lo` chars fits, prefix of `hi` chars does not.
    let mut lo = 0;
    let mut hi = total_chars;
    let mut steps = 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        steps += 1;
        if cost(&text[..boundaries[mid]]) <= budget {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let kept = &text[..boundaries[lo]];
    let final_cost = cost(kept);
    (
        kept.to_string(),
        ShrinkReport {
            steps,
            removed: total_chars - lo,
            initial_cost,
            final_cost,
            fits: final_cost <= budget,
        },
    )
}
