//! Newtype identifiers used throughout the client.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

newtype_id!(PhoneId, "The Cloud API phone-number ID (the sending side).");
newtype_id!(
    WaId,
    "A WhatsApp user ID (international phone digits, the recipient side)."
);
newtype_id!(WabaId, "A WhatsApp Business Account ID.");
newtype_id!(AppId, "A Meta app ID, used for webhook subscription management.");
newtype_id!(MessageId, "A message ID (`wamid.*`).");
newtype_id!(TemplateId, "A message template ID.");
newtype_id!(FlowId, "A WhatsApp Flow ID.");
newtype_id!(CallId, "A WhatsApp Business Calling call ID.");
newtype_id!(MediaId, "An uploaded media handle, valid for 30 days.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_as_ref_agree() {
        let id = WaId::new("972544401243");
        assert_eq!(id.to_string(), "972544401243");
        assert_eq!(id.as_ref(), "972544401243");
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = PhoneId::new("277321005464405");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"277321005464405\"");
    }
}
