//! Boundary validation for outbound message content.
//!
//! Centralizes the numeric limits the Cloud API enforces so the outbound
//! builder can reject an oversized payload before spending an HTTP round
//! trip on it.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Named size limits for outbound content.
pub mod limits {
    /// Interactive header text, max characters.
    pub const MAX_HEADER_LEN: usize = 60;
    /// Interactive/template body text, max characters.
    pub const MAX_BODY_LEN: usize = 4096;
    /// Interactive footer text, max characters.
    pub const MAX_FOOTER_LEN: usize = 60;
    /// Reply-button title, max characters.
    pub const MAX_BUTTON_TITLE_LEN: usize = 20;
    /// Button/row `callback_data`, max bytes.
    pub const MAX_CALLBACK_DATA_LEN: usize = 256;
    /// List-row title, max characters.
    pub const MAX_ROW_TITLE_LEN: usize = 24;
    /// List-row `callback_data`, max bytes.
    pub const MAX_ROW_CALLBACK_DATA_LEN: usize = 200;
    /// Maximum reply buttons per interactive message.
    pub const MAX_BUTTONS: usize = 3;
    /// Maximum sections per list message.
    pub const MAX_SECTIONS: usize = 10;
    /// Maximum rows across all sections of a list message.
    pub const MAX_TOTAL_ROWS: usize = 10;
}

/// Validation failures for outbound content.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A text field exceeded its maximum length.
    #[error("{field} exceeds the maximum length of {max} (got {actual})")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
        /// Actual length supplied.
        actual: usize,
    },
    /// A collection exceeded its maximum item count.
    #[error("{field} has too many items: max {max}, got {actual}")]
    TooMany {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted item count.
        max: usize,
        /// Actual item count supplied.
        actual: usize,
    },
    /// A collection that requires at least one item was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Validate a text field's length against `max`, tagging the error with `field`.
///
/// # Errors
///
/// Returns [`ValidationError::TooLong`] if `value` exceeds `max` characters.
pub fn validate_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Validate a reply-button list: 1..=3 buttons, each title within limit, each
/// `callback_data` within limit.
///
/// # Errors
///
/// Returns the first boundary violation encountered.
pub fn validate_buttons(titles_and_data: &[(&str, &str)]) -> Result<(), ValidationError> {
    if titles_and_data.is_empty() {
        return Err(ValidationError::Empty { field: "buttons" });
    }
    if titles_and_data.len() > limits::MAX_BUTTONS {
        return Err(ValidationError::TooMany {
            field: "buttons",
            max: limits::MAX_BUTTONS,
            actual: titles_and_data.len(),
        });
    }
    for (title, data) in titles_and_data {
        validate_len("button title", title, limits::MAX_BUTTON_TITLE_LEN)?;
        if data.len() > limits::MAX_CALLBACK_DATA_LEN {
            return Err(ValidationError::TooLong {
                field: "button callback_data",
                max: limits::MAX_CALLBACK_DATA_LEN,
                actual: data.len(),
            });
        }
    }
    Ok(())
}

/// Validate a section list: 1..=10 sections, at most 10 rows total, each row
/// title/callback within limit.
///
/// # Errors
///
/// Returns the first boundary violation encountered.
pub fn validate_sections(sections: &[Vec<(&str, &str, Option<&str>)>]) -> Result<(), ValidationError> {
    if sections.is_empty() {
        return Err(ValidationError::Empty { field: "sections" });
    }
    if sections.len() > limits::MAX_SECTIONS {
        return Err(ValidationError::TooMany {
            field: "sections",
            max: limits::MAX_SECTIONS,
            actual: sections.len(),
        });
    }
    let total_rows: usize = sections.iter().map(Vec::len).sum();
    if total_rows > limits::MAX_TOTAL_ROWS {
        return Err(ValidationError::TooMany {
            field: "rows",
            max: limits::MAX_TOTAL_ROWS,
            actual: total_rows,
        });
    }
    for section in sections {
        for (title, data, _description) in section {
            validate_len("row title", title, limits::MAX_ROW_TITLE_LEN)?;
            if data.len() > limits::MAX_ROW_CALLBACK_DATA_LEN {
                return Err(ValidationError::TooLong {
                    field: "row callback_data",
                    max: limits::MAX_ROW_CALLBACK_DATA_LEN,
                    actual: data.len(),
                });
            }
        }
    }
    Ok(())
}

/// Strip control characters and apply NFKC normalization to free-text input,
/// the way the host's message-content validator treats inbound channel text.
#[must_use]
pub fn normalize_text(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    stripped.nfkc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_at_limit_is_ok() {
        assert!(validate_len("header", &"a".repeat(60), limits::MAX_HEADER_LEN).is_ok());
    }

    #[test]
    fn header_one_over_limit_is_rejected() {
        let err = validate_len("header", &"a".repeat(61), limits::MAX_HEADER_LEN).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "header",
                max: 60,
                actual: 61
            }
        );
    }

    #[test]
    fn buttons_reject_more_than_three() {
        let buttons = vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")];
        assert!(matches!(
            validate_buttons(&buttons),
            Err(ValidationError::TooMany { field: "buttons", .. })
        ));
    }

    #[test]
    fn sections_reject_zero_sections() {
        assert!(matches!(
            validate_sections(&[]),
            Err(ValidationError::Empty { field: "sections" })
        ));
    }

    #[test]
    fn sections_reject_more_than_ten_rows_total() {
        let row = ("Row", "cb", None);
        let sections = vec![vec![row; 11]];
        assert!(matches!(
            validate_sections(&sections),
            Err(ValidationError::TooMany { field: "rows", .. })
        ));
    }

    #[test]
    fn normalize_text_strips_nulls_and_applies_nfkc() {
        assert_eq!(normalize_text("Hello\x00World"), "HelloWorld");
    }
}
