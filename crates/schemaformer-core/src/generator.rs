//! The generation engine: schema walker, primitive generators, array driver.
//!
//! The walker recurses over the schema depth-first, in declaration order.
//! At each primitive leaf it marks the target slot in the partial document,
//! asks the matching generator for a value (each generator re-serializes
//! the document into a fresh prompt), and overwrites the marker with the
//! parsed result. Containers are created empty and filled incrementally, so
//! the prompt always shows exactly the document up to the slot being
//! generated.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::config::GenerateOptions;
use crate::continuation::{self, Continuation, TOP_K};
use crate::document::{DocPath, PartialDocument};
use crate::error::{GenerateError, InferenceError};
use crate::inference::{GenerateParams, Model, Tokenizer};
use crate::mask::NumberTokenMask;
use crate::schema::Schema;
use crate::stopping::{NumberStoppingCriteria, StringStoppingCriteria};
use crate::value::GenerationValue;

/// Retries after the initial attempt of a number generation.
const MAX_NUMBER_RETRIES: usize = 3;

/// Temperature multiplier applied on each number retry.
const TEMPERATURE_ESCALATION: f32 = 1.3;

/// Strict decimal-literal shape for decoded number output. Anything else
/// (empty text, stray punctuation, a second decimal point) triggers a retry.
static DECIMAL_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*\.?[0-9]+$").expect("valid literal pattern"));

/// Fills a document conforming to a [`Schema`] by generating one leaf value
/// per model call.
///
/// A `Generator` owns its model and tokenizer collaborators plus the
/// vocabulary mask built from the tokenizer at construction. The mask is
/// the only state shared across [`generate`](Self::generate) calls; the
/// partial document is created fresh per call and `&mut self` rules out
/// overlapping use of one instance.
pub struct Generator<M, T> {
    model: M,
    tokenizer: T,
    schema: Schema,
    schema_text: String,
    task_prompt: String,
    options: GenerateOptions,
    number_mask: NumberTokenMask,
    doc: PartialDocument,
}

impl<M: Model, T: Tokenizer> Generator<M, T> {
    /// Build a generator, scanning the tokenizer vocabulary once for the
    /// numeric token mask.
    pub fn new(
        model: M,
        tokenizer: T,
        schema: Schema,
        task_prompt: impl Into<String>,
        options: GenerateOptions,
    ) -> Result<Self, GenerateError> {
        let number_mask = NumberTokenMask::build(&tokenizer)?;
        let schema_text = schema.to_value().to_string();
        Ok(Self {
            model,
            tokenizer,
            schema,
            schema_text,
            task_prompt: task_prompt.into(),
            options,
            number_mask,
            doc: PartialDocument::new(),
        })
    }

    /// Fill the whole schema, one leaf at a time, and return the completed
    /// tree.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::MalformedSchema`]: the root schema is not an
    ///   object.
    /// - [`GenerateError::NumberGenerationFailed`]: a number field stayed
    ///   unparseable through the retry budget.
    /// - [`GenerateError::MarkerNotFound`]: internal marker bookkeeping
    ///   broke (an engine bug).
    /// - [`GenerateError::Inference`]: a collaborator failure, unmodified.
    pub fn generate(&mut self) -> Result<GenerationValue, GenerateError> {
        let schema = self.schema.clone();
        let Schema::Object { properties } = &schema else {
            return Err(GenerateError::MalformedSchema {
                path: "#".to_string(),
                message: "root schema must be an object with `properties`".to_string(),
            });
        };

        self.doc = PartialDocument::new();
        let root = DocPath::root();
        let mut fields = IndexMap::with_capacity(properties.len());
        for (name, child) in properties {
            if self.options.debug {
                tracing::debug!(field = %name, "generating object field");
            }
            let value = self.generate_value(child, &root, Some(name))?;
            fields.insert(name.clone(), value);
        }
        Ok(GenerationValue::Object(fields))
    }

    // -----------------------------------------------------------------------
    // Schema walker
    // -----------------------------------------------------------------------

    /// Generate one value for `schema` into `container[key]` (a field when
    /// `key` is set, a new trailing array element otherwise).
    fn generate_value(
        &mut self,
        schema: &Schema,
        container: &DocPath,
        key: Option<&str>,
    ) -> Result<GenerationValue, GenerateError> {
        match schema {
            Schema::Number => {
                self.mark_slot(container, key);
                let number = self.generate_number()?;
                self.write_slot(container, key, Value::from(number));
                Ok(GenerationValue::Number(number))
            }
            Schema::Boolean => {
                self.mark_slot(container, key);
                let flag = self.generate_boolean()?;
                self.write_slot(container, key, Value::Bool(flag));
                Ok(GenerationValue::Boolean(flag))
            }
            Schema::String => {
                self.mark_slot(container, key);
                let text = self.generate_string()?;
                self.write_slot(container, key, Value::String(text.clone()));
                Ok(GenerationValue::String(text))
            }
            Schema::Array { items } => {
                let array_path = self.doc.insert_array(container, key);
                let elements = self.generate_array(items, &array_path)?;
                Ok(GenerationValue::Array(elements))
            }
            Schema::Object { properties } => {
                let object_path = self.doc.insert_object(container, key);
                let mut fields = IndexMap::with_capacity(properties.len());
                for (name, child) in properties {
                    if self.options.debug {
                        tracing::debug!(field = %name, "generating object field");
                    }
                    let value = self.generate_value(child, &object_path, Some(name))?;
                    fields.insert(name.clone(), value);
                }
                Ok(GenerationValue::Object(fields))
            }
        }
    }

    fn mark_slot(&mut self, container: &DocPath, key: Option<&str>) {
        match key {
            Some(key) => self.doc.set_field_marker(container, key),
            None => self.doc.push_marker(container),
        }
    }

    fn write_slot(&mut self, container: &DocPath, key: Option<&str>, value: Value) {
        match key {
            Some(key) => self.doc.write_field(container, key, value),
            None => self.doc.write_last_element(container, value),
        }
    }

    // -----------------------------------------------------------------------
    // Array driver
    // -----------------------------------------------------------------------

    /// Generate elements until the continuation decider signals stop or the
    /// configured cap is reached.
    fn generate_array(
        &mut self,
        items: &Schema,
        array_path: &DocPath,
    ) -> Result<Vec<GenerationValue>, GenerateError> {
        let mut elements = Vec::new();
        for _ in 0..self.options.max_array_length {
            let element = self.generate_value(items, array_path, None)?;
            elements.push(element);

            // Hypothetical "one more element" state: the marker is appended
            // only long enough to materialize the prompt the model would see
            // if asked to continue, then removed again.
            self.doc.push_marker(array_path);
            let prompt = self.build_prompt()?;
            self.doc.pop_marker(array_path);
            self.trace_prompt("generate_array", &prompt);

            let input_ids = self.tokenizer.encode(&prompt, true)?;
            let attention_mask = vec![1u32; input_ids.len()];
            let logits = self.model.forward(&input_ids, &attention_mask)?;

            match continuation::decide(&self.tokenizer, logits.last_row(), TOP_K) {
                Continuation::Continue => {}
                Continuation::Stop => break,
            }
        }
        Ok(elements)
    }

    // -----------------------------------------------------------------------
    // Primitive generators
    // -----------------------------------------------------------------------

    /// Masked, stop-bounded decoding of a numeric literal, with bounded
    /// retries at escalating temperature.
    fn generate_number(&self) -> Result<f64, GenerateError> {
        let prompt = self.build_prompt()?;
        self.trace_prompt("generate_number", &prompt);
        let input_ids = self.tokenizer.encode(&prompt, true)?;

        let mut temperature = self.options.temperature;
        let mut last_output = String::new();
        for attempt in 0..=MAX_NUMBER_RETRIES {
            if attempt > 0 {
                temperature *= TEMPERATURE_ESCALATION;
                tracing::debug!(attempt, temperature, "retrying number generation");
            }

            let stopping = NumberStoppingCriteria::new(
                &self.tokenizer,
                input_ids.len(),
                self.options.number_precision,
            );
            let sequence = self.model.generate(
                &input_ids,
                GenerateParams {
                    max_new_tokens: self.options.max_number_tokens,
                    temperature,
                    do_sample: true,
                    pad_token_id: self.tokenizer.pad_token_id(),
                    logits_processor: Some(&self.number_mask),
                    stopping_criteria: Some(&stopping),
                },
            )?;

            let suffix = decode_suffix(&self.tokenizer, &sequence, input_ids.len())?;
            let trimmed = suffix.trim();
            let candidate = trimmed.strip_suffix('.').unwrap_or(trimmed);
            self.trace_result("generate_number", candidate);

            if let Some(number) = parse_decimal(candidate) {
                return Ok(number);
            }
            last_output = candidate.to_string();
        }

        Err(GenerateError::NumberGenerationFailed {
            attempts: MAX_NUMBER_RETRIES + 1,
            last_output,
        })
    }

    /// One forward pass; the answer is whichever of the literal tokens
    /// `true`/`false` the model ranks higher at the next position.
    fn generate_boolean(&self) -> Result<bool, GenerateError> {
        let prompt = self.build_prompt()?;
        self.trace_prompt("generate_boolean", &prompt);

        let input_ids = self.tokenizer.encode(&prompt, true)?;
        let attention_mask = vec![1u32; input_ids.len()];
        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let row = logits.last_row();

        let true_id = first_token_id(&self.tokenizer, "true")?;
        let false_id = first_token_id(&self.tokenizer, "false")?;
        let true_logit = row.get(true_id as usize).copied().unwrap_or(f32::NEG_INFINITY);
        let false_logit = row.get(false_id as usize).copied().unwrap_or(f32::NEG_INFINITY);

        let flag = true_logit > false_logit;
        self.trace_result("generate_boolean", if flag { "true" } else { "false" });
        Ok(flag)
    }

    /// Quote-primed, stop-bounded decoding of string content.
    fn generate_string(&self) -> Result<String, GenerateError> {
        let prompt = format!("{}\"", self.build_prompt()?);
        self.trace_prompt("generate_string", &prompt);

        let input_ids = self.tokenizer.encode(&prompt, false)?;
        let stopping = StringStoppingCriteria::new(&self.tokenizer, input_ids.len());
        let sequence = self.model.generate(
            &input_ids,
            GenerateParams {
                max_new_tokens: self.options.max_string_token_length,
                temperature: self.options.temperature,
                do_sample: true,
                pad_token_id: self.tokenizer.pad_token_id(),
                logits_processor: None,
                stopping_criteria: Some(&stopping),
            },
        )?;

        let suffix = decode_suffix(&self.tokenizer, &sequence, input_ids.len())?;
        self.trace_result("generate_string", &suffix);

        let content = match suffix.split_once('"') {
            Some((before, _)) => before,
            None => suffix.as_str(),
        };
        Ok(content.trim().to_string())
    }

    // -----------------------------------------------------------------------
    // Prompt & tracing
    // -----------------------------------------------------------------------

    fn build_prompt(&self) -> Result<String, GenerateError> {
        crate::prompt::build(&self.task_prompt, &self.schema_text, &self.doc)
    }

    fn trace_prompt(&self, stage: &str, prompt: &str) {
        if self.options.debug {
            tracing::debug!(stage, prompt = %prompt, "built generation prompt");
        }
    }

    fn trace_result(&self, stage: &str, result: &str) {
        if self.options.debug {
            tracing::debug!(stage, result = %result, "decoded generation result");
        }
    }
}

/// Decode only the newly produced tokens beyond the prompt length.
fn decode_suffix<T: Tokenizer>(
    tokenizer: &T,
    sequence: &[u32],
    prompt_length: usize,
) -> Result<String, InferenceError> {
    let new_tokens = sequence.get(prompt_length..).unwrap_or(&[]);
    tokenizer.decode(new_tokens, true)
}

/// First token id of a literal word; the logit lookup key for booleans.
fn first_token_id<T: Tokenizer>(tokenizer: &T, word: &str) -> Result<u32, InferenceError> {
    tokenizer
        .encode(word, false)?
        .first()
        .copied()
        .ok_or_else(|| InferenceError::Tokenizer(format!("no tokens produced for literal {word:?}")))
}

fn parse_decimal(text: &str) -> Option<f64> {
    if !DECIMAL_LITERAL.is_match(text) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_accepts_strict_literals() {
        assert_eq!(parse_decimal("30"), Some(30.0));
        assert_eq!(parse_decimal("12.34"), Some(12.34));
        assert_eq!(parse_decimal(".5"), Some(0.5));
    }

    #[test]
    fn test_parse_decimal_rejects_junk() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("1.2.3"), None);
        assert_eq!(parse_decimal("12a"), None);
        assert_eq!(parse_decimal("-4"), None);
    }
}
