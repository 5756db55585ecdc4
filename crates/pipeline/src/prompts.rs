//! Prompt templates.
//!
//! Templates use `{name}` placeholders filled by the render functions below;
//! nothing else in the crate formats prompt text.

/// Returned instead of an answer when no evidence could be assembled.
pub const FAIL_RESPONSE: &str = "Sorry, I'm not able to provide an answer to that question.";

pub const CROSS_SET_SYSTEM: &str = "You are an AI assistant that helps people find information.";

const RERANK: &str = "You are given a question and knowledge-graph evidence, one fact per line.\n\
Select the facts that help answer the question, ordered from most to least relevant, and drop the rest.\n\
Copy each selected fact exactly, one per line, with no commentary.\n\n\
Question: {question}\n\n\
Evidence:\n{graph}\n\n\
Selected facts:";

const CONVERT: &str = "Rewrite the following knowledge-graph facts as plain natural-language sentences.\n\
Keep every entity name exactly as written and do not add anything that is not stated.\n\n\
Facts:\n{graph}\n\n\
Sentences:";

const STEP: &str = "Question: {question}\n\n\
Path evidence:\n{paths}\n\n\
Neighbour evidence:\n{neis}\n\n\
Using only the evidence above, reason step by step toward the answer.\n\
Write each step on its own line and end with the most likely answer.";

const CONTEXT: &str = "### Path evidence\n{paths}\n\n### Neighbour evidence\n{neis}\n\n### Reasoning\n{step}";

const QUERY: &str = "Answer the question using the context below.\n\
Give the shortest answer the context supports; if it is insufficient, give your best guess.\n\n\
Context:\n{context}\n\n\
Question: {question}\n\
Answer:";

const EXTRACT: &str = "List the named entities mentioned in the question below: people, places, organizations, events, dates.\n\
Output one entity per line with no numbering or extra text.\n\n\
Question: {question}\n\
Entities:";

pub fn rerank(graph: &str, question: &str) -> String {
    RERANK.replace("{question}", question).replace("{graph}", graph)
}

pub fn convert(graph: &str) -> String {
    CONVERT.replace("{graph}", graph)
}

pub fn step(question: &str, paths: &str, neis: &str) -> String {
    STEP.replace("{question}", question)
        .replace("{paths}", paths)
        .replace("{neis}", neis)
}

pub fn context(paths: &str, neis: &str, step: &str) -> String {
    CONTEXT
        .replace("{paths}", paths)
        .replace("{neis}", neis)
        .replace("{step}", step)
}

pub fn query(question: &str, context: &str) -> String {
    QUERY.replace("{context}", context).replace("{question}", question)
}

pub fn extract_entities(question: &str) -> String {
    EXTRACT.replace("{question}", question)
}

/// User message asking for ten ranked candidate answers over a comma-separated fact list.
pub fn candidate_answers(question: &str, context: &str) -> String {
    let slots: Vec<String> = (1..=10).map(|i| format!("answer{i}:\"...\"")).collect();
    format!(
        "the question is: {question}, the provided information is (list separated by ,): {context}. \
Now, generate exactly 10 candidate answers you believe are most likely. Do not say you don't know. \
Output strictly in the format: {}.",
        slots.join(", ")
    )
}

/// Number context entries from 1 as `"{i}: {entry}"` lines.
pub fn numbered(entries: &[String]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}: {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        for rendered in [
            rerank("a->r->b", "q?"),
            convert("a->r->b"),
            step("q?", "p", "n"),
            context("p", "n", "s"),
            query("q?", "ctx"),
            extract_entities("q?"),
        ] {
            assert!(!rendered.contains('{'), "unfilled placeholder in: {rendered}");
        }
    }

    #[test]
    fn rerank_embeds_question_and_evidence() {
        let p = rerank("Paris->capitalOf->France", "Where is Paris?");
        assert!(p.contains("Question: Where is Paris?"));
        assert!(p.contains("Evidence:\nParis->capitalOf->France"));
    }

    #[test]
    fn candidate_answers_lists_ten_slots() {
        let p = candidate_answers("q", "a r b, ");
        assert!(p.contains("answer1:\"...\""));
        assert!(p.contains("answer10:\"...\"."));
        assert!(!p.contains("answer11"));
    }

    #[test]
    fn numbering_starts_at_one() {
        let lines = numbered(&["first".to_string(), "second".to_string()]);
        assert_eq!(lines, "1: first\n2: second");
    }
}
