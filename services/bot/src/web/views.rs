//! services/bot/src/web/views.rs
//!
//! Renders the bot's screens: message text plus the inline keyboard under it.

use crate::web::protocol::{Button, Keyboard, Reply};
use pdf_reader_core::paginator::{has_next, has_previous};
use pdf_reader_core::{Action, ActionCodec, Cursor, Direction, Document};
use tracing::warn;

pub const START_TEXT: &str = "Here you can read PDF files page by page, right in the chat.";
pub const LIBRARY_TEXT: &str = "Library:";
pub const EMPTY_LIBRARY_TEXT: &str = "Your library is empty. Load a file to start reading.";
pub const LOAD_PROMPT_TEXT: &str = "Send a PDF file to load.";
pub const EMPTY_PAGE_TEXT: &str = "(this page has no text)";

/// Messages longer than this are rejected by the common bot platforms.
const MAX_MESSAGE_CHARS: usize = 4096;

/// A rendered message, not yet bound to send-or-edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Screen {
    pub fn send(self) -> Reply {
        Reply::Send {
            text: self.text,
            keyboard: self.keyboard,
        }
    }

    pub fn edit(self) -> Reply {
        Reply::Edit {
            text: self.text,
            keyboard: self.keyboard,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Views {
    codec: ActionCodec,
    label_limit: usize,
}

impl Views {
    pub fn new(codec: ActionCodec, label_limit: usize) -> Self {
        Self {
            codec,
            label_limit: label_limit.max(1),
        }
    }

    pub fn start(&self, has_library: bool) -> Screen {
        let mut row = self.buttons([("Load file".to_string(), Action::LoadFile)]);
        if has_library {
            row.extend(self.buttons([("Library".to_string(), Action::Library)]));
        }
        screen(START_TEXT, vec![row])
    }

    pub fn library(&self, filenames: &[String]) -> Screen {
        self.library_with_heading(LIBRARY_TEXT, filenames)
    }

    /// The library under a custom heading, e.g. after a duplicate upload.
    pub fn library_with_heading(&self, heading: &str, filenames: &[String]) -> Screen {
        let text = if filenames.is_empty() {
            EMPTY_LIBRARY_TEXT
        } else {
            heading
        };
        let mut rows = vec![self.buttons([("Back to start".to_string(), Action::Start)])];
        rows.extend(filenames.iter().map(|name| {
            self.buttons([(
                truncate_label(name, self.label_limit),
                Action::Open {
                    filename: name.clone(),
                },
            )])
        }));
        screen(text, rows)
    }

    pub fn load_prompt(&self) -> Screen {
        screen(
            LOAD_PROMPT_TEXT,
            vec![self.buttons([("Back to start".to_string(), Action::Start)])],
        )
    }

    /// A page with its navigation controls. Controls that would leave the document are omitted.
    pub fn page(&self, document: &Document, index: usize) -> Screen {
        let count = document.page_count();
        let filename = &document.filename;
        let cursor = Cursor::new(filename.clone(), index);

        let mut nav = Vec::with_capacity(3);
        if has_previous(index) {
            nav.push((
                "◀".to_string(),
                Action::Navigate {
                    direction: Direction::Previous,
                    cursor: cursor.clone(),
                },
            ));
        }
        nav.push((
            format!("{}/{}", index + 1, count),
            Action::GotoPage { cursor: cursor.clone() },
        ));
        if has_next(index, count) {
            nav.push((
                "▶".to_string(),
                Action::Navigate {
                    direction: Direction::Next,
                    cursor: cursor.clone(),
                },
            ));
        }

        let manage = [
            ("Back to library".to_string(), Action::Library),
            ("Delete file".to_string(), Action::Delete { cursor }),
        ];

        let text = page_text(document, index);
        screen(&text, vec![self.buttons(nav), self.buttons(manage)])
    }

    pub fn page_prompt(&self, cursor: &Cursor, page_count: usize) -> Screen {
        let text = format!(
            "Selecting a page of \"{}\".\nSend a number from 1 to {}.",
            cursor.filename, page_count
        );
        screen(
            &text,
            vec![self.buttons([(
                "Cancel".to_string(),
                Action::CancelGoto { cursor: cursor.clone() },
            )])],
        )
    }

    pub fn confirm_delete(&self, cursor: &Cursor) -> Screen {
        let text = format!("You are about to delete \"{}\". Is that correct?", cursor.filename);
        screen(
            &text,
            vec![self.buttons([
                (
                    "Yes".to_string(),
                    Action::ConfirmDelete {
                        filename: cursor.filename.clone(),
                    },
                ),
                ("Cancel".to_string(), Action::CancelDelete { cursor: cursor.clone() }),
            ])],
        )
    }

    /// Encodes a row of buttons, leaving out any whose token the transport would reject.
    fn buttons(&self, entries: impl IntoIterator<Item = (String, Action)>) -> Vec<Button> {
        entries
            .into_iter()
            .filter_map(|(text, action)| match self.codec.encode(&action) {
                Ok(callback_data) => Some(Button { text, callback_data }),
                Err(e) => {
                    warn!(error = %e, "Leaving out a button whose token is too long.");
                    None
                }
            })
            .collect()
    }
}

fn screen(text: &str, rows: Vec<Vec<Button>>) -> Screen {
    let rows: Vec<Vec<Button>> = rows.into_iter().filter(|row| !row.is_empty()).collect();
    Screen {
        text: text.to_string(),
        keyboard: (!rows.is_empty()).then_some(Keyboard { rows }),
    }
}

/// Shortens a button label to `limit` characters, marking the cut with `…`.
pub fn truncate_label(label: &str, limit: usize) -> String {
    if label.chars().count() <= limit {
        return label.to_string();
    }
    let mut short: String = label.chars().take(limit.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn page_text(document: &Document, index: usize) -> String {
    let page = document.page(index).unwrap_or_default();
    if page.trim().is_empty() {
        return EMPTY_PAGE_TEXT.to_string();
    }
    let chars = page.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        warn!(
            filename = %document.filename,
            page = index + 1,
            chars,
            limit = MAX_MESSAGE_CHARS,
            "Page is longer than one message, sending it cut short."
        );
    }
    truncate_label(page, MAX_MESSAGE_CHARS)
}
