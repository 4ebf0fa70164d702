//! Interactive message types: reply buttons, section lists, and the
//! callback payloads they produce when tapped.
//!
//! Boundary limits (§8 of the design) are enforced by [`crate::validation`],
//! not here — these types are pure data.

use crate::ids::{FlowId, MessageId, WaId};
use serde::{Deserialize, Serialize};

/// A single quick-reply button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Opaque callback data returned when the button is tapped.
    pub callback_data: String,
    /// Button label, shown to the user.
    pub title: String,
}

impl Button {
    /// Construct a new button.
    pub fn new(callback_data: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            callback_data: callback_data.into(),
            title: title.into(),
        }
    }
}

/// A single row within a [`Section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    /// Opaque callback data returned when the row is selected.
    pub callback_data: String,
    /// Row title.
    pub title: String,
    /// Optional row description, shown in smaller text beneath the title.
    pub description: Option<String>,
}

/// A titled group of [`SectionRow`]s within a [`SectionList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section title. May be omitted when there is exactly one section.
    pub title: Option<String>,
    /// Rows in this section.
    pub rows: Vec<SectionRow>,
}

/// A list-picker interactive body: a button that opens a sheet of sections/rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionList {
    /// Label on the button that opens the list.
    pub button_title: String,
    /// Sections to display (at most 10, at most 10 rows total).
    pub sections: Vec<Section>,
}

/// A button that opens a Flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowButton {
    /// Button label.
    pub title: String,
    /// The flow to open.
    pub flow_id: FlowId,
    /// Initial screen to render.
    pub flow_screen: Option<String>,
    /// Data passed to the flow's `INIT` action.
    pub flow_action_payload: Option<serde_json::Value>,
    /// Whether the flow is still in draft mode (uses the draft token).
    #[serde(default)]
    pub draft: bool,
}

/// The body of an `interactive` message, keyed by `interactive.type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InteractiveBody {
    /// Up to three reply buttons.
    Buttons(Vec<Button>),
    /// A section list.
    List(SectionList),
    /// A flow-launching button.
    Flow(FlowButton),
    /// A button requesting the user's location.
    LocationRequest,
    /// A button offering a voice call back to the business.
    CallPermissionRequest,
}

/// The tap outcome of a reply button: a `CallbackButton` update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackButton {
    /// ID of the message carrying the tapped button.
    pub message_id: MessageId,
    /// User who tapped the button.
    pub from: WaId,
    /// The button's opaque callback data.
    pub data: String,
    /// The button's display title, echoed back by the provider.
    pub title: String,
}

/// The tap outcome of a list row: a `CallbackSelection` update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackSelection {
    /// ID of the message carrying the list.
    pub message_id: MessageId,
    /// User who made the selection.
    pub from: WaId,
    /// The row's opaque callback data.
    pub data: String,
    /// The row's display title, echoed back by the provider.
    pub title: String,
    /// The row's description, echoed back by the provider, if present.
    pub description: Option<String>,
}

/// The completion outcome of a Flow exchange (`nfm_reply`): a `FlowCompletion` update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCompletion {
    /// ID of the message that embedded the flow.
    pub message_id: MessageId,
    /// User who completed the flow.
    pub from: WaId,
    /// Flow response token.
    pub token: Option<String>,
    /// Final response data submitted by the flow.
    pub response: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_list_shape_roundtrips() {
        let list = SectionList {
            button_title: "Pick one".into(),
            sections: vec![Section {
                title: Some("Fruits".into()),
                rows: vec![SectionRow {
                    callback_data: "fruit:apple".into(),
                    title: "Apple".into(),
                    description: None,
                }],
            }],
        };
        let json = serde_json::to_value(&list).unwrap();
        let back: SectionList = serde_json::from_value(json).unwrap();
        assert_eq!(list, back);
    }
}
