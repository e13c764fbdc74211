//! Schema-typed decoding of model output.
//!
//! A model asked for JSON does not always return JSON. [`decode`] never
//! fails: text that does not deserialize into the target type, or that
//! deserializes into a value with every field unset, comes back as
//! [`Decoded::Degraded`] carrying the raw text. Callers then pick between the
//! typed value and the type's own [`StructuredOutput::fallback`].

use serde::de::DeserializeOwned;

/// A type the model can be asked to produce as JSON.
pub trait StructuredOutput: DeserializeOwned + Send + Sized {
    /// Name used in the schema instruction sent to the model.
    const TYPE_NAME: &'static str;

    /// Best-effort value built from undecodable raw text.
    fn fallback(raw: &str) -> Self;

    /// True when no field carries information.
    fn is_unset(&self) -> bool;
}

/// Outcome of decoding one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Structured(T),
    Degraded { raw: String },
}

impl<T: StructuredOutput> Decoded<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn structured(&self) -> Option<&T> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Degraded { .. } => None,
        }
    }

    /// The decoded value, or the type's fallback built from the raw text.
    pub fn into_value(self) -> T {
        match self {
            Self::Structured(value) => value,
            Self::Degraded { raw } => T::fallback(&raw),
        }
    }
}

/// Decode `raw` into `T`. Never panics and never returns an error.
pub fn decode<T: StructuredOutput>(raw: &str) -> Decoded<T> {
    let payload = strip_code_fence(raw);

    match serde_json::from_str::<T>(payload) {
        Ok(value) if value.is_unset() => {
            tracing::warn!(
                target_type = T::TYPE_NAME,
                "Decoded output has no fields set, using raw text"
            );
            Decoded::Degraded {
                raw: raw.to_string(),
            }
        }
        Ok(value) => Decoded::Structured(value),
        Err(e) => {
            tracing::warn!(
                target_type = T::TYPE_NAME,
                error = %e,
                "Failed to decode structured output, using raw text"
            );
            Decoded::Degraded {
                raw: raw.to_string(),
            }
        }
    }
}

/// Reference to an agent's declared output type.
///
/// Carries the type name for the schema instruction and a check that reports
/// whether a reply decodes into that type.
#[derive(Clone, Copy)]
pub struct OutputSchema {
    name: &'static str,
    check: fn(&str) -> bool,
}

impl OutputSchema {
    pub fn of<T: StructuredOutput>() -> Self {
        Self {
            name: T::TYPE_NAME,
            check: |raw| decode::<T>(raw).is_structured(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `raw` decodes into the declared type.
    pub fn accepts(&self, raw: &str) -> bool {
        (self.check)(raw)
    }

    /// The system line asking the model for this type.
    pub fn instruction(&self) -> String {
        format!(
            "Return your response as valid JSON matching this schema: {}",
            self.name
        )
    }
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OutputSchema").field(&self.name).finish()
    }
}

/// Drop a surrounding markdown code fence, with or without a language tag.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Probe {
        label: String,
        count: u32,
    }

    impl StructuredOutput for Probe {
        const TYPE_NAME: &'static str = "Probe";

        fn fallback(raw: &str) -> Self {
            Self {
                label: raw.to_string(),
                count: 0,
            }
        }

        fn is_unset(&self) -> bool {
            self.label.is_empty() && self.count == 0
        }
    }

    #[test]
    fn test_decode_valid() {
        let decoded = decode::<Probe>(r#"{"label": "a", "count": 2}"#);
        assert_eq!(
            decoded,
            Decoded::Structured(Probe {
                label: "a".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_decode_code_fence() {
        let raw = "```json\n{\"label\": \"fenced\"}\n```";
        assert_eq!(decode::<Probe>(raw).into_value().label, "fenced");

        let bare = "```\n{\"count\": 3}\n```";
        assert_eq!(decode::<Probe>(bare).into_value().count, 3);
    }

    #[test]
    fn test_decode_invalid_is_degraded() {
        let decoded = decode::<Probe>("Sure! Here is your email.");
        assert!(!decoded.is_structured());
        assert_eq!(decoded.into_value().label, "Sure! Here is your email.");
    }

    #[test]
    fn test_decode_all_unset_is_degraded() {
        let decoded = decode::<Probe>("{}");
        assert_eq!(
            decoded,
            Decoded::Degraded {
                raw: "{}".to_string()
            }
        );
    }

    #[test]
    fn test_decode_never_panics_on_garbage() {
        for raw in ["", "```", "``````", "{", "[1,2]", "null", "\u{0}"] {
            let _ = decode::<Probe>(raw).into_value();
        }
    }

    #[test]
    fn test_output_schema() {
        let schema = OutputSchema::of::<Probe>();
        assert_eq!(schema.name(), "Probe");
        assert!(schema.accepts(r#"{"count": 1}"#));
        assert!(!schema.accepts("plain text"));
        assert_eq!(
            schema.instruction(),
            "Return your response as valid JSON matching this schema: Probe"
        );
    }
}
