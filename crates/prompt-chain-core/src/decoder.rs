//! Structured Decoder: best-effort JSON decoding of untrusted model output.
//!
//! Total over all inputs. Anything that is not strict JSON of the expected shape yields the
//! caller's fallback, untouched.

use serde::de::DeserializeOwned;

/// Outcome of a decode, remembering whether the fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Fallback(T),
}

impl<T> Decoded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decoded::Parsed(v) | Decoded::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback(_))
    }
}

/// Strictly parse `raw` as `T`; return `fallback` unchanged on any failure.
pub fn decode_json<T: DeserializeOwned>(raw: &str, fallback: T) -> T {
    decode_with(raw, fallback, Some).into_inner()
}

/// Parse `raw` as `R`, then let `validate` turn it into `T`. A parse failure or a `None`
/// from `validate` (shape mismatch) yields `fallback`.
pub fn decode_with<R, T, F>(raw: &str, fallback: T, validate: F) -> Decoded<T>
where
    R: DeserializeOwned,
    F: FnOnce(R) -> Option<T>,
{
    match serde_json::from_str::<R>(raw) {
        Ok(parsed) => match validate(parsed) {
            Some(v) => Decoded::Parsed(v),
            None => {
                tracing::debug!("decoded JSON has unexpected shape; using fallback");
                Decoded::Fallback(fallback)
            }
        },
        Err(e) => {
            tracing::debug!("model output is not JSON ({}); using fallback", e);
            Decoded::Fallback(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Pair {
        a: u32,
        b: String,
    }

    fn fallback() -> Pair {
        Pair {
            a: 0,
            b: "fallback".to_string(),
        }
    }

    #[test]
    fn valid_json_is_returned_as_parsed() {
        let got = decode_json(r#"{"a": 7, "b": "x"}"#, fallback());
        assert_eq!(
            got,
            Pair {
                a: 7,
                b: "x".to_string()
            }
        );
    }

    #[test]
    fn anything_else_returns_fallback_exactly() {
        for raw in [
            "",
            "Sure! Here is the JSON you asked for:",
            "```json\n{\"a\": 1, \"b\": \"x\"}\n```",
            r#"{"a": "seven", "b": "x"}"#,
            r#"[1, 2, 3]"#,
            r#"{"a": 1"#,
        ] {
            assert_eq!(decode_json(raw, fallback()), fallback(), "input {:?}", raw);
        }
    }

    #[test]
    fn validation_rejection_is_a_fallback() {
        let out = decode_with(r#"{"k": "v"}"#, 0usize, |m: BTreeMap<String, String>| {
            (m.len() > 1).then_some(m.len())
        });
        assert_eq!(out, Decoded::Fallback(0));
        assert!(out.is_fallback());

        let out = decode_with(r#"{"k": "v", "j": "w"}"#, 0usize, |m: BTreeMap<String, String>| {
            (m.len() > 1).then_some(m.len())
        });
        assert_eq!(out, Decoded::Parsed(2));
        assert_eq!(out.into_inner(), 2);
    }
}
