pub mod actions;
pub mod dialog;
pub mod domain;
pub mod library;
pub mod paginator;
pub mod ports;

pub use actions::{Action, ActionCodec, ActionParseError};
pub use dialog::{DialogRegistry, DialogState, DialogTrigger};
pub use domain::{Cursor, Document, LibrarySnapshot, Pages, UserId};
pub use library::{LibraryError, LibraryResult, LibraryStore};
pub use paginator::{Direction, NavigationError};
pub use ports::{LibraryRepository, PortError, PortResult, TextExtractionService};
