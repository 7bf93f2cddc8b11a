//! Contracts for the tokenizer and model collaborators.
//!
//! The engine drives inference exclusively through these traits; the
//! algorithms behind them (BPE merges, transformer forward passes, sampling
//! loops) are out of scope. Implementations are expected to be deterministic
//! given the same inputs and configuration, but the engine does not depend
//! on it.

use crate::error::InferenceError;

/// Text/token conversion collaborator.
///
/// Must support decoding a single token id in isolation: the vocabulary
/// mask builder and the array continuation decider both rely on it.
pub trait Tokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>, InferenceError>;

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, InferenceError>;

    fn vocab_size(&self) -> usize;

    fn pad_token_id(&self) -> Option<u32>;
}

/// Per-position logit rows produced by a non-generating forward pass.
#[derive(Debug, Clone)]
pub struct Logits {
    data: Vec<f32>,
    vocab_size: usize,
}

impl Logits {
    /// Wrap a row-major `positions × vocab_size` buffer.
    pub fn new(data: Vec<f32>, vocab_size: usize) -> Self {
        debug_assert!(vocab_size > 0 && data.len() % vocab_size == 0);
        Self { data, vocab_size }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Logit row for the final input position: the distribution over the
    /// next token.
    pub fn last_row(&self) -> &[f32] {
        &self.data[self.data.len() - self.vocab_size..]
    }
}

/// Decoding-loop configuration for [`Model::generate`].
pub struct GenerateParams<'a> {
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub do_sample: bool,
    pub pad_token_id: Option<u32>,
    /// Applied to the next-token logits before every sampling step.
    pub logits_processor: Option<&'a dyn LogitsProcessor>,
    /// Consulted after every newly produced token.
    pub stopping_criteria: Option<&'a dyn StoppingCriteria>,
}

/// Inference collaborator.
pub trait Model {
    /// One forward pass; no decoding. Returns logits for every input
    /// position.
    fn forward(&self, input_ids: &[u32], attention_mask: &[u32]) -> Result<Logits, InferenceError>;

    /// Multi-step decoding loop. Returns the full sequence: prompt plus
    /// continuation; the engine slices at the prompt length. Implementations
    /// must apply `params.logits_processor` at every step and consult
    /// `params.stopping_criteria` after every produced token.
    fn generate(
        &self,
        input_ids: &[u32],
        params: GenerateParams<'_>,
    ) -> Result<Vec<u32>, InferenceError>;
}

/// Per-step hook that rewrites the next-token logit distribution in place.
pub trait LogitsProcessor {
    fn process(&self, input_ids: &[u32], logits: &mut [f32]);
}

/// Per-step predicate that halts a decoding loop.
pub trait StoppingCriteria {
    /// `input_ids` is the full sequence so far, prompt included.
    fn should_stop(&self, input_ids: &[u32]) -> Result<bool, InferenceError>;
}
