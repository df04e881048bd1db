/**
 * Realtime Wire Messages
 *
 * This module defines the envelope exchanged over the realtime socket in
 * both directions:
 *
 * ```json
 * { "type": "text_change", "data": { ... } }
 * ```
 *
 * Known types are `text_change`, `cursor_position` and `user_presence`.
 * Outbound events are built with `ServerEvent`; inbound frames are only
 * inspected for their tag (`InboundFrame`) and relayed verbatim.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::change::{ChangeKind, Patch};
use crate::shared::document::{Author, Change};
use crate::shared::error::SharedError;

/// Event sent from the server to every connected session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A change was applied to a document
    TextChange(TextChangeEvent),
    /// Cursor update relayed from a client
    ///
    /// The server relays cursor frames verbatim and never builds this
    /// variant; it exists so relayed frames decode as a `ServerEvent`.
    CursorPosition(serde_json::Value),
    /// A session joined or left
    UserPresence(UserPresence),
}

impl ServerEvent {
    /// Presence event for a session that just registered
    pub fn joined(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self::UserPresence(UserPresence {
            user_id,
            user_name: user_name.into(),
            status: PresenceStatus::Joined,
        })
    }

    /// Presence event for a session that unregistered
    pub fn left(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self::UserPresence(UserPresence {
            user_id,
            user_name: user_name.into(),
            status: PresenceStatus::Left,
        })
    }

    /// Encode the event as a JSON frame
    pub fn to_json(&self) -> Result<Vec<u8>, SharedError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Payload of a `text_change` event
///
/// Field names follow the browser client's camel-cased keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextChangeEvent {
    #[serde(rename = "changeID")]
    pub change_id: Uuid,
    #[serde(rename = "documentId")]
    pub document_id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "changeType")]
    pub change_type: ChangeKind,
    pub content: String,
    pub position: usize,
    pub length: usize,
}

impl TextChangeEvent {
    pub fn author(&self) -> Author {
        Author::new(self.user_id, self.user_name.clone())
    }

    pub fn patch(&self) -> Patch {
        Patch {
            kind: self.change_type,
            content: self.content.clone(),
            position: self.position,
            length: self.length,
        }
    }
}

impl From<&Change> for TextChangeEvent {
    fn from(change: &Change) -> Self {
        Self {
            change_id: change.id,
            document_id: change.document_id,
            user_id: change.user_id,
            user_name: change.user_name.clone(),
            change_type: change.change_type,
            content: change.content.clone(),
            position: change.position,
            length: change.length,
        }
    }
}

/// Payload of a `user_presence` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: Uuid,
    pub user_name: String,
    pub status: PresenceStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Joined,
    Left,
}

/// Tag of a frame received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTag {
    TextChange,
    CursorPosition,
    Other(String),
}

/// Envelope of a client frame; `data` is not interpreted
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundFrame {
    /// Decode a client frame
    ///
    /// # Errors
    ///
    /// `SharedError::SerializationError` if the frame is not a JSON object
    /// with a string `type` field.
    pub fn parse(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn tag(&self) -> CommandTag {
        match self.kind.as_str() {
            "text_change" => CommandTag::TextChange,
            "cursor_position" => CommandTag::CursorPosition,
            other => CommandTag::Other(other.to_string()),
        }
    }
}
