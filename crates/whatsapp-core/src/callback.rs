//! `CallbackData`: a compact, round-trippable string encoding for carrying
//! application state inside a button's `id` or a message's
//! `biz_opaque_callback_data`.
//!
//! Grounded directly in the design note of the source spec (no upstream
//! Python implementation survived retrieval): a record is serialized as
//! `"<type_tag><SEP>field1<SEP>field2…"`, and several records may be packed
//! into a single string joined by a second separator. Both separators are
//! forbidden inside any field value; violating that is a programmer error
//! caught at encode time rather than silently corrupting the wire format.

use thiserror::Error;

/// Default field separator.
pub const DEFAULT_SEP: char = ':';
/// Default separator between multiple packed records.
pub const DEFAULT_JOIN: char = '~';
/// Sentinel written in place of an absent (`None`) field, to preserve positional layout.
const NONE_SENTINEL: char = ' ';

/// Errors raised while encoding or decoding [`CallbackData`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackDataError {
    /// A field value contained the configured separator or join character.
    #[error("field {field_index} contains the reserved separator {sep:?}")]
    ReservedCharInField {
        /// Index of the offending field.
        field_index: usize,
        /// The separator character found in the field.
        sep: char,
    },
    /// The encoded string's type tag did not match the expected one.
    #[error("callback data type tag mismatch: expected {expected:?}, got {actual:?}")]
    TypeTagMismatch {
        /// Expected type tag.
        expected: String,
        /// Actual type tag found on the wire.
        actual: String,
    },
    /// The encoded string did not have the expected number of fields.
    #[error("expected {expected} fields, found {actual}")]
    FieldCountMismatch {
        /// Expected field count.
        expected: usize,
        /// Actual field count found on the wire.
        actual: usize,
    },
    /// The encoded total length exceeds the caller-supplied maximum.
    #[error("encoded callback data is {actual} bytes, exceeding the limit of {max}")]
    TooLong {
        /// Maximum permitted length in bytes.
        max: usize,
        /// Actual encoded length in bytes.
        actual: usize,
    },
}

/// A single structured callback-data record: a type tag plus an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackData {
    type_tag: String,
    fields: Vec<Option<String>>,
    sep: char,
}

impl CallbackData {
    /// Start building a record with the given type tag and default separator.
    #[must_use]
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fields: Vec::new(),
            sep: DEFAULT_SEP,
        }
    }

    /// Override the field separator (default `:`).
    #[must_use]
    pub const fn with_separator(mut self, sep: char) -> Self {
        self.sep = sep;
        self
    }

    /// Append a present field value.
    #[must_use]
    pub fn field(mut self, value: impl Into<String>) -> Self {
        self.fields.push(Some(value.into()));
        self
    }

    /// Append an absent (`None`) field, preserving its position.
    #[must_use]
    pub fn field_opt(mut self, value: Option<impl Into<String>>) -> Self {
        self.fields.push(value.map(Into::into));
        self
    }

    /// The record's type tag.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The record's fields, in order, with `None` for sentinel-encoded absences.
    #[must_use]
    pub fn fields(&self) -> &[Option<String>] {
        &self.fields
    }

    /// Serialize this record to its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackDataError::ReservedCharInField`] if any field
    /// contains the configured separator.
    pub fn encode(&self) -> Result<String, CallbackDataError> {
        if let Some(idx) = self.type_tag.find(self.sep) {
            let _ = idx;
            return Err(CallbackDataError::ReservedCharInField {
                field_index: 0,
                sep: self.sep,
            });
        }
        let mut out = self.type_tag.clone();
        for (i, field) in self.fields.iter().enumerate() {
            out.push(self.sep);
            match field {
                Some(value) => {
                    if value.contains(self.sep) {
                        return Err(CallbackDataError::ReservedCharInField {
                            field_index: i + 1,
                            sep: self.sep,
                        });
                    }
                    out.push_str(value);
                }
                None => out.push(NONE_SENTINEL),
            }
        }
        Ok(out)
    }

    /// Parse a wire string into a record, verifying its type tag and field count.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackDataError::TypeTagMismatch`] or
    /// [`CallbackDataError::FieldCountMismatch`] on a structural mismatch.
    pub fn decode(
        raw: &str,
        expected_tag: &str,
        expected_fields: usize,
        sep: char,
    ) -> Result<Self, CallbackDataError> {
        let mut parts = raw.split(sep);
        let tag = parts.next().unwrap_or_default();
        if tag != expected_tag {
            return Err(CallbackDataError::TypeTagMismatch {
                expected: expected_tag.to_string(),
                actual: tag.to_string(),
            });
        }
        let fields: Vec<Option<String>> = parts
            .map(|p| {
                if p == NONE_SENTINEL.to_string() {
                    None
                } else {
                    Some(p.to_string())
                }
            })
            .collect();
        if fields.len() != expected_fields {
            return Err(CallbackDataError::FieldCountMismatch {
                expected: expected_fields,
                actual: fields.len(),
            });
        }
        Ok(Self {
            type_tag: tag.to_string(),
            fields,
            sep,
        })
    }

    /// Pack several records into a single wire string, joined by `join`.
    ///
    /// # Errors
    ///
    /// Propagates any individual record's encode error, or
    /// [`CallbackDataError::TooLong`] if the caller supplies a `max_len`
    /// that the combined string exceeds.
    pub fn pack(records: &[Self], join: char, max_len: Option<usize>) -> Result<String, CallbackDataError> {
        let mut parts = Vec::with_capacity(records.len());
        for record in records {
            parts.push(record.encode()?);
        }
        let out = parts.join(&join.to_string());
        if let Some(max) = max_len {
            if out.len() > max {
                return Err(CallbackDataError::TooLong {
                    max,
                    actual: out.len(),
                });
            }
        }
        Ok(out)
    }

    /// Split a packed wire string back into its individual record strings.
    #[must_use]
    pub fn unpack(raw: &str, join: char) -> Vec<&str> {
        raw.split(join).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let record = CallbackData::new("user")
            .field("7")
            .field("alice")
            .field_opt(Some("admin"));
        let encoded = record.encode().unwrap();
        assert_eq!(encoded, "user:7:alice:admin");

        let decoded = CallbackData::decode(&encoded, "user", 3, DEFAULT_SEP).unwrap();
        assert_eq!(decoded.fields()[0].as_deref(), Some("7"));
        assert_eq!(decoded.fields()[1].as_deref(), Some("alice"));
        assert_eq!(decoded.fields()[2].as_deref(), Some("admin"));
    }

    #[test]
    fn none_field_round_trips_as_sentinel() {
        let record = CallbackData::new("user").field("7").field_opt(None::<String>);
        let encoded = record.encode().unwrap();
        assert_eq!(encoded, "user:7: ");

        let decoded = CallbackData::decode(&encoded, "user", 2, DEFAULT_SEP).unwrap();
        assert_eq!(decoded.fields()[1], None);
    }

    #[test]
    fn rejects_separator_inside_field() {
        let record = CallbackData::new("user").field("has:colon");
        assert_eq!(
            record.encode(),
            Err(CallbackDataError::ReservedCharInField {
                field_index: 1,
                sep: DEFAULT_SEP
            })
        );
    }

    #[test]
    fn type_tag_mismatch_is_detected() {
        let record = CallbackData::new("user").field("7");
        let encoded = record.encode().unwrap();
        assert_eq!(
            CallbackData::decode(&encoded, "order", 1, DEFAULT_SEP),
            Err(CallbackDataError::TypeTagMismatch {
                expected: "order".to_string(),
                actual: "user".to_string()
            })
        );
    }

    #[test]
    fn pack_and_unpack_multiple_records() {
        let a = CallbackData::new("a").field("1");
        let b = CallbackData::new("b").field("2");
        let packed = CallbackData::pack(&[a, b], DEFAULT_JOIN, None).unwrap();
        assert_eq!(packed, "a:1~b:2");

        let parts = CallbackData::unpack(&packed, DEFAULT_JOIN);
        assert_eq!(parts, vec!["a:1", "b:2"]);
    }

    #[test]
    fn pack_enforces_max_length() {
        let a = CallbackData::new("a").field("1".repeat(10));
        let result = CallbackData::pack(&[a], DEFAULT_JOIN, Some(5));
        assert!(matches!(result, Err(CallbackDataError::TooLong { .. })));
    }
}
