//! Stopping policies for incremental decoding.
//!
//! Each policy is a [`StoppingCriteria`] instance handed to
//! [`Model::generate`](crate::inference::Model::generate); the decoding loop
//! consults it after every newly produced token.

use crate::error::InferenceError;
use crate::inference::{StoppingCriteria, Tokenizer};

/// Halts string decoding once the most recently produced token's text
/// contains a closing quote.
pub struct StringStoppingCriteria<'a, T: Tokenizer> {
    tokenizer: &'a T,
    prompt_length: usize,
}

impl<'a, T: Tokenizer> StringStoppingCriteria<'a, T> {
    pub fn new(tokenizer: &'a T, prompt_length: usize) -> Self {
        Self {
            tokenizer,
            prompt_length,
        }
    }
}

impl<T: Tokenizer> StoppingCriteria for StringStoppingCriteria<'_, T> {
    fn should_stop(&self, input_ids: &[u32]) -> Result<bool, InferenceError> {
        if input_ids.len() <= self.prompt_length {
            return Ok(false);
        }
        let Some(&last) = input_ids.last() else {
            return Ok(false);
        };
        let text = self.tokenizer.decode(&[last], true)?;
        Ok(text.contains('"'))
    }
}

/// Halts number decoding once the decoded suffix can no longer be extended
/// into a better numeric literal.
pub struct NumberStoppingCriteria<'a, T: Tokenizer> {
    tokenizer: &'a T,
    prompt_length: usize,
    precision: usize,
}

impl<'a, T: Tokenizer> NumberStoppingCriteria<'a, T> {
    pub fn new(tokenizer: &'a T, prompt_length: usize, precision: usize) -> Self {
        Self {
            tokenizer,
            prompt_length,
            precision,
        }
    }
}

impl<T: Tokenizer> StoppingCriteria for NumberStoppingCriteria<'_, T> {
    fn should_stop(&self, input_ids: &[u32]) -> Result<bool, InferenceError> {
        if input_ids.len() <= self.prompt_length {
            return Ok(false);
        }
        let decoded = self
            .tokenizer
            .decode(&input_ids[self.prompt_length..], true)?;
        Ok(number_suffix_exhausted(&decoded, self.precision))
    }
}

/// Decision over the full decoded suffix. Stops on: a second decimal point,
/// a fractional part longer than `precision`, or a digit followed by a
/// trailing space or newline.
fn number_suffix_exhausted(decoded: &str, precision: usize) -> bool {
    if decoded.matches('.').count() > 1 {
        return true;
    }

    let trimmed = decoded.trim();
    if let Some(dot) = trimmed.find('.') {
        if trimmed[dot + 1..].chars().count() > precision {
            return true;
        }
    }

    decoded.chars().count() > 1
        && decoded.contains(|c: char| c.is_ascii_digit())
        && decoded.ends_with([' ', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_policy_fraction_within_precision_continues() {
        assert!(!number_suffix_exhausted("12.34", 3));
    }

    #[test]
    fn test_number_policy_fraction_exceeding_precision_stops() {
        assert!(number_suffix_exhausted("12.3456", 3));
    }

    #[test]
    fn test_number_policy_second_decimal_point_stops() {
        assert!(number_suffix_exhausted("1.2.3", 3));
    }

    #[test]
    fn test_number_policy_trailing_space_after_digit_stops() {
        assert!(number_suffix_exhausted("12 ", 3));
        assert!(number_suffix_exhausted("12\n", 3));
    }

    #[test]
    fn test_number_policy_single_character_continues() {
        assert!(!number_suffix_exhausted("1", 3));
        assert!(!number_suffix_exhausted(" ", 3));
    }

    struct SingleTokenTokenizer {
        vocab: Vec<&'static str>,
    }

    impl Tokenizer for SingleTokenTokenizer {
        fn encode(&self, _text: &str, _add_special_tokens: bool) -> Result<Vec<u32>, InferenceError> {
            unimplemented!("stopping policies only decode")
        }

        fn decode(&self, ids: &[u32], _skip_special_tokens: bool) -> Result<String, InferenceError> {
            Ok(ids.iter().map(|&id| self.vocab[id as usize]).collect())
        }

        fn vocab_size(&self) -> usize {
            self.vocab.len()
        }

        fn pad_token_id(&self) -> Option<u32> {
            None
        }
    }

    #[test]
    fn test_string_policy_stops_on_quote_bearing_token() {
        let tokenizer = SingleTokenTokenizer {
            vocab: vec!["Alice", "Alice\""],
        };

        let criteria = StringStoppingCriteria::new(&tokenizer, 0);
        assert!(!criteria.should_stop(&[0]).unwrap());
        assert!(criteria.should_stop(&[1]).unwrap());
    }

    #[test]
    fn test_string_policy_ignores_prompt_tokens() {
        let tokenizer = SingleTokenTokenizer {
            vocab: vec!["\""],
        };

        // The final prompt token contains a quote, but nothing has been
        // produced yet.
        let criteria = StringStoppingCriteria::new(&tokenizer, 1);
        assert!(!criteria.should_stop(&[0]).unwrap());
    }

    #[test]
    fn test_number_policy_decodes_only_the_suffix() {
        let tokenizer = SingleTokenTokenizer {
            vocab: vec!["9.9.9", "12"],
        };

        // Prompt token 0 would trip the two-decimal-point rule if included.
        let criteria = NumberStoppingCriteria::new(&tokenizer, 1, 3);
        assert!(!criteria.should_stop(&[0, 1]).unwrap());
    }
}
