//! Configuration for schema-guided generation.

use serde::{Deserialize, Serialize};

/// Options for a [`Generator`](crate::Generator).
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-array-length`,
/// `number-precision`); unspecified fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerateOptions {
    /// Hard cap on elements generated per array. Default: 10.
    pub max_array_length: usize,
    /// Token budget per number generation call. Default: 6.
    pub max_number_tokens: usize,
    /// Token budget per string generation call. Default: 10.
    pub max_string_token_length: usize,
    /// Sampling temperature. Multiplied by 1.3 on each number retry to
    /// widen the distribution out of a degenerate decoding loop.
    /// Default: 1.0.
    pub temperature: f32,
    /// Maximum fractional digits before the number stopping policy halts
    /// decoding. Default: 3.
    pub number_precision: usize,
    /// Emit prompt/result traces at debug level. Default: false.
    pub debug: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_array_length: 10,
            max_number_tokens: 6,
            max_string_token_length: 10,
            temperature: 1.0,
            number_precision: 3,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_options_serde_round_trip() {
        let opts = GenerateOptions {
            max_array_length: 4,
            max_number_tokens: 8,
            max_string_token_length: 24,
            temperature: 0.7,
            number_precision: 2,
            debug: true,
        };

        let json = serde_json::to_string(&opts).unwrap();

        // Verify kebab-case field names are in the JSON
        assert!(json.contains("\"max-array-length\""));
        assert!(json.contains("\"max-string-token-length\""));
        assert!(json.contains("\"number-precision\""));

        let deserialized: GenerateOptions = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.max_array_length, 4);
        assert_eq!(deserialized.max_number_tokens, 8);
        assert_eq!(deserialized.max_string_token_length, 24);
        assert_eq!(deserialized.temperature, 0.7);
        assert_eq!(deserialized.number_precision, 2);
        assert!(deserialized.debug);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let opts: GenerateOptions = serde_json::from_str(r#"{ "temperature": 0.5 }"#).unwrap();
        assert_eq!(opts.temperature, 0.5);
        assert_eq!(opts.max_array_length, 10);
        assert_eq!(opts.max_number_tokens, 6);
        assert_eq!(opts.max_string_token_length, 10);
        assert_eq!(opts.number_precision, 3);
        assert!(!opts.debug);
    }
}
