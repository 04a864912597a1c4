//! crates/pdf_reader_core/src/actions.rs
//!
//! The button actions of the reader and their callback token format.
//!
//! A token is a short tag, optionally followed by `:`-separated fields. The
//! filename is always the last field so that it may itself contain `:`.
//! The cursor travels inside the token; nothing about a button is kept server-side.

use crate::domain::Cursor;
use crate::paginator::Direction;
use std::fmt;
use std::str::FromStr;

/// Callback data limit of the common bot platforms, in bytes.
pub const DEFAULT_CALLBACK_DATA_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("empty callback token")]
    Empty,
    #[error("unknown callback token: {0:?}")]
    UnknownTag(String),
    #[error("callback token {tag:?} is missing its {field}")]
    MissingField { tag: String, field: &'static str },
    #[error("invalid page index in callback token: {0:?}")]
    InvalidIndex(String),
    #[error("callback token is {len} bytes, the limit is {limit}")]
    PayloadTooLong { len: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Back to the start menu; also cancels a pending file upload.
    Start,
    LoadFile,
    Library,
    Open { filename: String },
    Navigate { direction: Direction, cursor: Cursor },
    GotoPage { cursor: Cursor },
    CancelGoto { cursor: Cursor },
    Delete { cursor: Cursor },
    ConfirmDelete { filename: String },
    CancelDelete { cursor: Cursor },
}

const START: &str = "start";
const LOAD: &str = "load";
const LIBRARY: &str = "library";
const OPEN: &str = "open";
const PREV: &str = "prev";
const NEXT: &str = "next";
const GOTO: &str = "goto";
const CANCEL_GOTO: &str = "cgoto";
const DELETE: &str = "del";
const CONFIRM_DELETE: &str = "rm";
const CANCEL_DELETE: &str = "cdel";

/// Tags whose tokens carry a cursor.
const CURSOR_TAGS: [&str; 6] = [PREV, NEXT, GOTO, CANCEL_GOTO, DELETE, CANCEL_DELETE];

impl Action {
    pub fn encode(&self) -> String {
        let with_cursor = |tag: &str, cursor: &Cursor| format!("{tag}:{}:{}", cursor.index, cursor.filename);
        match self {
            Action::Start => START.to_string(),
            Action::LoadFile => LOAD.to_string(),
            Action::Library => LIBRARY.to_string(),
            Action::Open { filename } => format!("{OPEN}:{filename}"),
            Action::Navigate {
                direction: Direction::Previous,
                cursor,
            } => with_cursor(PREV, cursor),
            Action::Navigate {
                direction: Direction::Next,
                cursor,
            } => with_cursor(NEXT, cursor),
            Action::GotoPage { cursor } => with_cursor(GOTO, cursor),
            Action::CancelGoto { cursor } => with_cursor(CANCEL_GOTO, cursor),
            Action::Delete { cursor } => with_cursor(DELETE, cursor),
            Action::ConfirmDelete { filename } => format!("{CONFIRM_DELETE}:{filename}"),
            Action::CancelDelete { cursor } => with_cursor(CANCEL_DELETE, cursor),
        }
    }

    /// The filename this action refers to, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Action::Start | Action::LoadFile | Action::Library => None,
            Action::Open { filename } | Action::ConfirmDelete { filename } => Some(filename),
            Action::Navigate { cursor, .. }
            | Action::GotoPage { cursor }
            | Action::CancelGoto { cursor }
            | Action::Delete { cursor }
            | Action::CancelDelete { cursor } => Some(&cursor.filename),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() {
            return Err(ActionParseError::Empty);
        }
        let (tag, rest) = match token.split_once(':') {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (token, None),
        };

        let filename = |rest: Option<&str>| -> Result<String, ActionParseError> {
            match rest {
                Some(name) if !name.is_empty() => Ok(name.to_string()),
                _ => Err(ActionParseError::MissingField {
                    tag: tag.to_string(),
                    field: "filename",
                }),
            }
        };
        let cursor = |rest: Option<&str>| -> Result<Cursor, ActionParseError> {
            let (index, name) = rest.and_then(|r| r.split_once(':')).ok_or_else(|| {
                ActionParseError::MissingField {
                    tag: tag.to_string(),
                    field: "page index",
                }
            })?;
            let index = index
                .parse::<usize>()
                .map_err(|_| ActionParseError::InvalidIndex(index.to_string()))?;
            Ok(Cursor::new(filename(Some(name))?, index))
        };

        let action = match (tag, rest) {
            (START, None) => Action::Start,
            (LOAD, None) => Action::LoadFile,
            (LIBRARY, None) => Action::Library,
            (OPEN, rest) => Action::Open {
                filename: filename(rest)?,
            },
            (CONFIRM_DELETE, rest) => Action::ConfirmDelete {
                filename: filename(rest)?,
            },
            (PREV, rest) => Action::Navigate {
                direction: Direction::Previous,
                cursor: cursor(rest)?,
            },
            (NEXT, rest) => Action::Navigate {
                direction: Direction::Next,
                cursor: cursor(rest)?,
            },
            (GOTO, rest) => Action::GotoPage { cursor: cursor(rest)? },
            (CANCEL_GOTO, rest) => Action::CancelGoto { cursor: cursor(rest)? },
            (DELETE, rest) => Action::Delete { cursor: cursor(rest)? },
            (CANCEL_DELETE, rest) => Action::CancelDelete { cursor: cursor(rest)? },
            _ => return Err(ActionParseError::UnknownTag(token.to_string())),
        };
        Ok(action)
    }
}

/// Encodes and decodes tokens while enforcing the transport's callback data limit.
#[derive(Debug, Clone, Copy)]
pub struct ActionCodec {
    limit: usize,
}

impl Default for ActionCodec {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK_DATA_LIMIT)
    }
}

impl ActionCodec {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn encode(&self, action: &Action) -> Result<String, ActionParseError> {
        let token = action.encode();
        self.check_len(token.len())?;
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> Result<Action, ActionParseError> {
        self.check_len(token.len())?;
        token.parse()
    }

    /// Whether every button of a document with `page_count` pages can carry `filename`.
    pub fn fits(&self, filename: &str, page_count: usize) -> bool {
        longest_token_len(filename, page_count) <= self.limit
    }

    fn check_len(&self, len: usize) -> Result<(), ActionParseError> {
        if len > self.limit {
            return Err(ActionParseError::PayloadTooLong { len, limit: self.limit });
        }
        Ok(())
    }
}

/// Length in bytes of the longest token any button of the document can produce.
pub fn longest_token_len(filename: &str, page_count: usize) -> usize {
    let last_index = page_count.saturating_sub(1).to_string();
    let longest_tag = CURSOR_TAGS.iter().map(|t| t.len()).max().unwrap_or_default();
    let with_cursor = longest_tag + 1 + last_index.len() + 1 + filename.len();
    let without_cursor = OPEN.len().max(CONFIRM_DELETE.len()) + 1 + filename.len();
    with_cursor.max(without_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_decode_to_the_action_that_encoded_them() {
        let actions = [
            Action::Start,
            Action::LoadFile,
            Action::Library,
            Action::Open {
                filename: "book.pdf".into(),
            },
            Action::Navigate {
                direction: Direction::Next,
                cursor: Cursor::new("book.pdf", 4),
            },
            Action::Navigate {
                direction: Direction::Previous,
                cursor: Cursor::new("book.pdf", 1),
            },
            Action::GotoPage {
                cursor: Cursor::new("a:b.pdf", 0),
            },
            Action::ConfirmDelete {
                filename: "a:b:c.pdf".into(),
            },
            Action::CancelDelete {
                cursor: Cursor::new("x.pdf", 12),
            },
        ];
        for action in actions {
            assert_eq!(action.encode().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn filename_may_contain_separators() {
        let action: Action = "next:3:notes: part 2.pdf".parse().unwrap();
        assert_eq!(
            action,
            Action::Navigate {
                direction: Direction::Next,
                cursor: Cursor::new("notes: part 2.pdf", 3),
            }
        );
        assert_eq!(action.filename(), Some("notes: part 2.pdf"));
    }

    #[test]
    fn malformed_tokens_are_typed_errors() {
        assert_eq!("".parse::<Action>(), Err(ActionParseError::Empty));
        assert!(matches!("downloads".parse::<Action>(), Err(ActionParseError::UnknownTag(_))));
        assert!(matches!("start:extra".parse::<Action>(), Err(ActionParseError::UnknownTag(_))));
        assert!(matches!("open".parse::<Action>(), Err(ActionParseError::MissingField { .. })));
        assert!(matches!("open:".parse::<Action>(), Err(ActionParseError::MissingField { .. })));
        assert!(matches!("next:book.pdf".parse::<Action>(), Err(ActionParseError::MissingField { .. })));
        assert_eq!(
            "prev:x:book.pdf".parse::<Action>(),
            Err(ActionParseError::InvalidIndex("x".into()))
        );
        assert!(matches!("del:2:".parse::<Action>(), Err(ActionParseError::MissingField { .. })));
    }

    #[test]
    fn codec_enforces_the_limit() {
        let codec = ActionCodec::new(16);
        let short = Action::Open { filename: "a.pdf".into() };
        assert_eq!(codec.encode(&short), Ok("open:a.pdf".to_string()));

        let long = Action::Open {
            filename: "a-very-long-name.pdf".into(),
        };
        assert_eq!(
            codec.encode(&long),
            Err(ActionParseError::PayloadTooLong { len: 25, limit: 16 })
        );
        assert!(codec.decode("open:a-very-long-name.pdf").is_err());
    }

    #[test]
    fn longest_token_accounts_for_the_page_index() {
        // "cgoto:" + "99" + ":" + "book.pdf"
        assert_eq!(longest_token_len("book.pdf", 100), 17);
        assert_eq!(longest_token_len("book.pdf", 1), 16);

        let codec = ActionCodec::new(16);
        assert!(codec.fits("book.pdf", 10));
        assert!(!codec.fits("book.pdf", 11));
    }
}
