//! Token estimation utilities.
//!
//! Uses a byte-based heuristic keyed by model family. OpenAI BPE vocabularies
//! average about 4 bytes per token on English text; smaller open vocabularies
//! (Llama, Mistral, Qwen and friends) are estimated at 3, which overcounts
//! rather than undercounts.

/// Bytes per token for models we have no profile for.
const CONSERVATIVE_BYTES_PER_TOKEN: usize = 3;

/// Bytes per token for OpenAI-style BPE vocabularies.
const OPENAI_BYTES_PER_TOKEN: usize = 4;

/// Estimate the byte-per-token ratio for a model identifier.
///
/// Provider prefixes such as `openai/gpt-4o` are ignored.
pub fn bytes_per_token(model: &str) -> usize {
    let name = model.rsplit('/').next().unwrap_or(model).to_ascii_lowercase();
    let openai = name.starts_with("gpt-")
        || name.starts_with("o1")
        || name.starts_with("o3")
        || name.starts_with("o4")
        || name.starts_with("text-embedding")
        || name.starts_with("davinci");
    if openai {
        OPENAI_BYTES_PER_TOKEN
    } else {
        CONSERVATIVE_BYTES_PER_TOKEN
    }
}

/// Estimate the generation-token cost of `text` for `model`. Rounds up.
pub fn count_tokens(text: &str, model: &str) -> usize {
    TokenCounter::for_model(model).count(text)
}

/// A token estimator bound to one model, resolved once per engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCounter {
    model: String,
    bytes_per_token: usize,
}

impl TokenCounter {
    pub fn for_model(model: impl Into<String>) -> Self {
        let model = model.into();
        let bytes_per_token = bytes_per_token(&model);
        Self {
            model,
            bytes_per_token,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.len().div_ceil(self.bytes_per_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(count_tokens("", "gpt-3.5-turbo-0125"), 0);
    }

    #[test]
    fn four_chars_is_one_openai_token() {
        assert_eq!(count_tokens("test", "gpt-3.5-turbo-0125"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(count_tokens("hello", "gpt-4o"), 2);
    }

    #[test]
    fn unknown_models_count_conservatively() {
        let text = "a".repeat(120);
        assert_eq!(count_tokens(&text, "gpt-4o-mini"), 30);
        assert_eq!(count_tokens(&text, "llama3:8b"), 40);
    }

    #[test]
    fn provider_prefix_is_ignored() {
        assert_eq!(bytes_per_token("openai/gpt-4o"), 4);
        assert_eq!(bytes_per_token("meta-llama/llama-3-70b"), 3);
    }

    #[test]
    fn counter_matches_free_function() {
        let counter = TokenCounter::for_model("gpt-3.5-turbo-0125");
        assert_eq!(counter.model(), "gpt-3.5-turbo-0125");
        assert_eq!(counter.count("hello world"), count_tokens("hello world", "gpt-3.5-turbo-0125"));
    }
}
