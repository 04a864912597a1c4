//! services/bot/src/web/protocol.rs
//!
//! Defines the webhook protocol between the messaging relay and the bot: the
//! updates a relay posts and the replies it should render in the chat.

use pdf_reader_core::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Updates Sent FROM the Relay TO the Bot
//=========================================================================================
// NOTE: Document uploads are posted as multipart/form-data to a separate endpoint,
// not as part of this enum.
//=========================================================================================

/// An event in a user's chat.
#[derive(Deserialize, Serialize, Debug, Clone, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A bot command such as `/start`. The leading slash and arguments are optional.
    Command { chat_id: i64, command: String },

    /// A plain text message.
    Text { chat_id: i64, text: String },

    /// An inline button was pressed; `data` is the button's callback token.
    Callback { chat_id: i64, data: String },
}

impl Update {
    pub fn user(&self) -> UserId {
        match self {
            Update::Command { chat_id, .. } | Update::Text { chat_id, .. } | Update::Callback { chat_id, .. } => {
                UserId(*chat_id)
            }
        }
    }
}

/// Normalizes `/start@my_bot arg` to `start`.
pub fn command_name(raw: &str) -> String {
    let word = raw.trim().split_whitespace().next().unwrap_or_default();
    let word = word.strip_prefix('/').unwrap_or(word);
    let word = word.split('@').next().unwrap_or_default();
    word.to_lowercase()
}

//=========================================================================================
// Replies Sent FROM the Bot TO the Relay
//=========================================================================================

/// One inline button. `callback_data` comes back verbatim in a `callback` update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

/// Inline keyboard, row by row.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// All buttons, in reading order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// What the relay should do in the chat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Send a new message.
    Send {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },

    /// Replace the message whose button produced the update.
    Edit {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },

    /// A transient notice (callback answer) that leaves the chat unchanged.
    Notice { text: String },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Send { text, .. } | Reply::Edit { text, .. } | Reply::Notice { text } => text,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Reply::Send { keyboard, .. } | Reply::Edit { keyboard, .. } => keyboard.as_ref(),
            Reply::Notice { .. } => None,
        }
    }
}

/// The response body of every update endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, ToSchema)]
pub struct BotResponse {
    pub replies: Vec<Reply>,
}
