//! Post-element continuation decision for array generation.
//!
//! Rather than forcing valid array syntax through a grammar, the decider
//! reads structural intent out of the model's own confidence ranking over
//! punctuation: rank the next-token logits descending and scan the top
//! candidates. A comma-bearing token signals another element, a
//! close-bracket-bearing token signals the end of the array.

use crate::inference::Tokenizer;

/// Number of top-ranked tokens inspected per decision.
pub(crate) const TOP_K: usize = 30;

/// Outcome of a continuation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Continuation {
    Continue,
    Stop,
}

/// Scan the `top_k` highest-logit tokens in rank order; the first match
/// governs. Neither punctuation mark within the window means stop.
///
/// A token that fails to decode is skipped with a warning: a partial
/// decode failure must not abort an otherwise-successful array.
pub(crate) fn decide<T: Tokenizer>(tokenizer: &T, logits: &[f32], top_k: usize) -> Continuation {
    let mut ranked: Vec<usize> = (0..logits.len()).collect();
    ranked.sort_by(|&a, &b| {
        logits[b]
            .partial_cmp(&logits[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for &token_id in ranked.iter().take(top_k) {
        let text = match tokenizer.decode(&[token_id as u32], false) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(token_id, %error, "skipping undecodable token in continuation scan");
                continue;
            }
        };
        if text.contains(',') {
            return Continuation::Continue;
        }
        if text.contains(']') {
            return Continuation::Stop;
        }
    }

    Continuation::Stop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;

    struct PunctuationTokenizer {
        vocab: Vec<&'static str>,
        failing_id: Option<u32>,
    }

    impl Tokenizer for PunctuationTokenizer {
        fn encode(&self, _text: &str, _add_special_tokens: bool) -> Result<Vec<u32>, InferenceError> {
            unimplemented!("the decider only decodes")
        }

        fn decode(&self, ids: &[u32], _skip_special_tokens: bool) -> Result<String, InferenceError> {
            if self.failing_id.is_some_and(|bad| ids.contains(&bad)) {
                return Err(InferenceError::Tokenizer("undecodable id".to_string()));
            }
            Ok(ids.iter().map(|&id| self.vocab[id as usize]).collect())
        }

        fn vocab_size(&self) -> usize {
            self.vocab.len()
        }

        fn pad_token_id(&self) -> Option<u32> {
            None
        }
    }

    fn tokenizer() -> PunctuationTokenizer {
        PunctuationTokenizer {
            // id: 0 = filler, 1 = comma, 2 = bracket, 3 = filler
            vocab: vec!["the", ", ", "]", "and"],
            failing_id: None,
        }
    }

    #[test]
    fn test_comma_ranked_above_bracket_continues() {
        let logits = vec![0.0, 5.0, 4.0, 1.0];
        assert_eq!(decide(&tokenizer(), &logits, TOP_K), Continuation::Continue);
    }

    #[test]
    fn test_bracket_ranked_above_comma_stops() {
        let logits = vec![0.0, 4.0, 5.0, 1.0];
        assert_eq!(decide(&tokenizer(), &logits, TOP_K), Continuation::Stop);
    }

    #[test]
    fn test_neither_in_window_stops() {
        // Window of 2 sees only the filler tokens.
        let logits = vec![5.0, 0.0, 0.1, 4.0];
        assert_eq!(decide(&tokenizer(), &logits, 2), Continuation::Stop);
    }

    #[test]
    fn test_decode_failure_is_skipped_not_fatal() {
        let tokenizer = PunctuationTokenizer {
            failing_id: Some(2),
            ..tokenizer()
        };
        // The bracket outranks the comma but cannot be decoded; the scan
        // must move on and find the comma.
        let logits = vec![0.0, 4.0, 5.0, 1.0];
        assert_eq!(decide(&tokenizer, &logits, TOP_K), Continuation::Continue);
    }
}
