//! Vocabulary mask restricting numeric decoding to digit tokens.

use crate::error::InferenceError;
use crate::inference::{LogitsProcessor, Tokenizer};

/// Precomputed per-token legality for numeric literals.
///
/// Built once per tokenizer by decoding every vocabulary id in isolation;
/// immutable after construction and reusable across any number of
/// generation calls against the same tokenizer. Applied as a
/// [`LogitsProcessor`] at every decoding step, it makes forbidden
/// characters unreachable regardless of sampling temperature.
#[derive(Debug, Clone)]
pub struct NumberTokenMask {
    allowed: Vec<bool>,
}

impl NumberTokenMask {
    /// Scan the whole vocabulary once.
    ///
    /// A token is allowed when its trimmed decoded text is empty, or
    /// consists only of digits with at most one decimal point.
    pub fn build<T: Tokenizer>(tokenizer: &T) -> Result<Self, InferenceError> {
        let mut allowed = vec![false; tokenizer.vocab_size()];
        for (token_id, slot) in allowed.iter_mut().enumerate() {
            let text = tokenizer.decode(&[token_id as u32], true)?;
            *slot = is_numeric_fragment(text.trim());
        }
        Ok(Self { allowed })
    }

    /// Whether `token_id` may appear inside a numeric literal.
    pub fn allows(&self, token_id: u32) -> bool {
        self.allowed.get(token_id as usize).copied().unwrap_or(false)
    }
}

fn is_numeric_fragment(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_digit() || c == '.') && text.matches('.').count() <= 1
}

impl LogitsProcessor for NumberTokenMask {
    fn process(&self, _input_ids: &[u32], logits: &mut [f32]) {
        for (token_id, logit) in logits.iter_mut().enumerate() {
            if !self.allowed.get(token_id).copied().unwrap_or(false) {
                *logit = f32::NEG_INFINITY;
            }
        }
    }
}
