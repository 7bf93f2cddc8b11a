//! Fill a JSON-Schema-shaped document field by field with a language model.
//!
//! Instead of asking a model to emit an entire well-formed document in one
//! shot, the engine walks the schema and generates exactly one value per
//! primitive leaf. Every step re-serializes the in-progress document into
//! the prompt, truncated at a reserved generation marker, so the model only
//! ever completes "the document so far". Per-type constraints keep the
//! output parseable:
//!
//! - **numbers** decode under a precomputed vocabulary mask
//!   ([`NumberTokenMask`]) that leaves only digit and decimal-point tokens
//!   reachable, with bounded retries at escalating temperature;
//! - **booleans** are a single forward pass comparing the logits of the
//!   literal tokens `true` and `false`;
//! - **strings** are primed with an opening quote and stopped at the first
//!   quote-bearing token;
//! - **arrays** extend element by element, inferring continue/stop intent
//!   from the model's top-ranked punctuation tokens instead of a grammar.
//!
//! The supported schema subset is `object`, `array`, `string`, `number`,
//! and `boolean` ([`Schema`]). Model and tokenizer are collaborators behind
//! the [`inference::Model`] and [`inference::Tokenizer`] traits; the engine
//! is stateless between [`Generator::generate`] calls apart from the
//! reusable vocabulary mask.

pub mod config;
pub mod error;
pub mod inference;
pub mod mask;
pub mod schema;
pub mod stopping;
pub mod value;

mod continuation;
mod document;
mod generator;
mod prompt;

pub use config::GenerateOptions;
pub use document::GENERATION_MARKER;
pub use error::{GenerateError, InferenceError};
pub use generator::Generator;
pub use mask::NumberTokenMask;
pub use schema::Schema;
pub use stopping::{NumberStoppingCriteria, StringStoppingCriteria};
pub use value::GenerationValue;
