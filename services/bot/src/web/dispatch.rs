//! services/bot/src/web/dispatch.rs
//!
//! Turns chat updates into replies. This is where the library store, the dialog
//! state machine, the paginator and the extraction port meet.

use crate::config::Config;
use crate::web::protocol::{command_name, Reply, Update};
use crate::web::views::{Screen, Views};
use bytes::Bytes;
use pdf_reader_core::paginator::{navigate, paginate, parse_page_number};
use pdf_reader_core::{
    Action, ActionCodec, Cursor, DialogRegistry, DialogState, DialogTrigger, Direction, Document, LibraryError,
    LibraryStore, NavigationError, TextExtractionService, UserId,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const HELP_TEXT: &str = "Send /start, press \"Load file\" and upload a PDF. \
The text is split into pages you can turn with the arrows. \
Press the page counter to jump to a page. /library lists your files.";
pub const IDLE_HINT_TEXT: &str = "Use /start to open the menu.";
pub const UNKNOWN_COMMAND_TEXT: &str = "Unknown command. Use /start to open the menu.";
pub const LOAD_FIRST_TEXT: &str = "To load a file, press \"Load file\" first.";
pub const NOT_A_DOCUMENT_TEXT: &str = "Incorrect file type. Send a PDF file.";
pub const ALREADY_LOADED_TEXT: &str = "File already loaded. Library:";
pub const FILENAME_TOO_LONG_TEXT: &str = "The file name is too long. Rename the file and send it again.";
pub const SAVE_FAILED_TEXT: &str = "Something went wrong while saving your library. Please try again later.";
pub const UNKNOWN_BUTTON_TEXT: &str = "This button is no longer supported.";
pub const FIRST_PAGE_TEXT: &str = "This is the first page.";
pub const LAST_PAGE_TEXT: &str = "This is the last page.";

/// A file uploaded while the bot waits for one.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl DocumentUpload {
    /// Accepts `application/pdf` or a `.pdf` name; relays often send `application/octet-stream`.
    pub fn is_pdf(&self) -> bool {
        let by_mime = self
            .mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("application/pdf"));
        let by_name = self.file_name.to_ascii_lowercase().ends_with(".pdf");
        by_mime || by_name
    }
}

pub struct Dispatcher {
    library: Arc<LibraryStore>,
    dialogs: DialogRegistry,
    extractor: Arc<dyn TextExtractionService>,
    codec: ActionCodec,
    views: Views,
    page_size: usize,
}

impl Dispatcher {
    pub fn new(library: Arc<LibraryStore>, extractor: Arc<dyn TextExtractionService>, config: &Config) -> Self {
        let codec = ActionCodec::new(config.callback_data_limit);
        Self {
            library,
            dialogs: DialogRegistry::new(),
            extractor,
            codec,
            views: Views::new(codec, config.button_label_limit),
            page_size: config.page_size,
        }
    }

    pub fn library(&self) -> &LibraryStore {
        &self.library
    }

    pub async fn dialog_state(&self, user: UserId) -> DialogState {
        self.dialogs.get(user).await
    }

    pub async fn handle_update(&self, update: Update) -> Vec<Reply> {
        let user = update.user();
        match update {
            Update::Command { command, .. } => self.on_command(user, &command_name(&command)).await,
            Update::Text { text, .. } => self.on_text(user, &text).await,
            Update::Callback { data, .. } => self.on_callback(user, &data).await,
        }
    }

    //=====================================================================================
    // Commands
    //=====================================================================================

    async fn on_command(&self, user: UserId, command: &str) -> Vec<Reply> {
        match command {
            "start" | "cancel" => {
                self.dialogs.reset(user).await;
                vec![self.start_screen(user).await.send()]
            }
            "library" | "downloads" => vec![self.library_screen(user).await.send()],
            "help" => vec![text_reply(HELP_TEXT)],
            other => {
                info!(%user, command = other, "Unknown command.");
                vec![text_reply(UNKNOWN_COMMAND_TEXT)]
            }
        }
    }

    //=====================================================================================
    // Text messages
    //=====================================================================================

    async fn on_text(&self, user: UserId, text: &str) -> Vec<Reply> {
        match self.dialogs.get(user).await {
            DialogState::AwaitingPageNumber { cursor } => self.on_page_number(user, cursor, text).await,
            DialogState::AwaitingFile => {
                let prompt = self.views.load_prompt();
                vec![with_text(prompt, NOT_A_DOCUMENT_TEXT).send()]
            }
            DialogState::Idle => vec![text_reply(IDLE_HINT_TEXT)],
        }
    }

    async fn on_page_number(&self, user: UserId, cursor: Cursor, text: &str) -> Vec<Reply> {
        let document = match self.library.get_pages(user, &cursor.filename).await {
            Ok(document) => document,
            Err(_) => {
                self.dialogs.reset(user).await;
                return self.stale(user, &cursor.filename, false).await;
            }
        };

        match parse_page_number(text, document.page_count()) {
            Ok(index) => {
                self.dialogs.fire(user, DialogTrigger::PageAccepted).await;
                vec![self.views.page(&document, index).send()]
            }
            Err(e) => {
                self.dialogs.fire(user, DialogTrigger::PageRejected).await;
                info!(%user, error = %e, "Rejected page number.");
                let prompt = self.views.page_prompt(&cursor, document.page_count());
                let text = format!(
                    "Incorrect page number. Send a number from 1 to {}.",
                    document.page_count()
                );
                vec![with_text(prompt, &text).send()]
            }
        }
    }

    //=====================================================================================
    // Button callbacks
    //=====================================================================================

    async fn on_callback(&self, user: UserId, data: &str) -> Vec<Reply> {
        let action = match self.codec.decode(data) {
            Ok(action) => action,
            Err(e) => {
                warn!(%user, error = %e, "Undecodable callback token.");
                return vec![notice(UNKNOWN_BUTTON_TEXT)];
            }
        };

        match action {
            Action::Start => {
                self.dialogs.fire(user, DialogTrigger::Cancel).await;
                vec![self.start_screen(user).await.edit()]
            }
            Action::LoadFile => {
                self.dialogs.fire(user, DialogTrigger::RequestFile).await;
                vec![self.views.load_prompt().edit()]
            }
            Action::Library => vec![self.library_screen(user).await.edit()],
            Action::Open { filename } => self.show_page(user, Cursor::first_page(filename)).await,
            Action::Navigate { direction, cursor } => self.on_navigate(user, direction, cursor).await,
            Action::GotoPage { cursor } => {
                let Some(document) = self.document_or_none(user, &cursor.filename).await else {
                    return self.stale(user, &cursor.filename, true).await;
                };
                self.dialogs
                    .fire(user, DialogTrigger::RequestPage(cursor.clone()))
                    .await;
                vec![self.views.page_prompt(&cursor, document.page_count()).edit()]
            }
            Action::CancelGoto { cursor } => {
                self.dialogs.fire(user, DialogTrigger::Cancel).await;
                self.show_page(user, cursor).await
            }
            Action::Delete { cursor } => {
                if !self.library.contains(user, &cursor.filename).await {
                    return self.stale(user, &cursor.filename, true).await;
                }
                vec![self.views.confirm_delete(&cursor).edit()]
            }
            Action::ConfirmDelete { filename } => self.on_confirm_delete(user, &filename).await,
            Action::CancelDelete { cursor } => self.show_page(user, cursor).await,
        }
    }

    async fn on_navigate(&self, user: UserId, direction: Direction, cursor: Cursor) -> Vec<Reply> {
        let Some(document) = self.document_or_none(user, &cursor.filename).await else {
            return self.stale(user, &cursor.filename, true).await;
        };
        match navigate(document.page_count(), cursor.index, direction) {
            Ok(index) => vec![self.views.page(&document, index).edit()],
            Err(NavigationError::OutOfRange { .. }) => {
                let text = match direction {
                    Direction::Previous => FIRST_PAGE_TEXT,
                    Direction::Next => LAST_PAGE_TEXT,
                };
                vec![notice(text)]
            }
            Err(e) => {
                warn!(%user, error = %e, "Unexpected navigation failure.");
                vec![notice(UNKNOWN_BUTTON_TEXT)]
            }
        }
    }

    async fn on_confirm_delete(&self, user: UserId, filename: &str) -> Vec<Reply> {
        match self.library.delete_document(user, filename).await {
            Ok(()) => {
                info!(%user, filename, "Document deleted.");
                self.forget_pending_page(user, filename).await;
                vec![self.library_screen(user).await.edit()]
            }
            Err(LibraryError::NotFound { .. }) => self.stale(user, filename, true).await,
            Err(e) => {
                error!(%user, filename, error = %e, "Failed to delete document.");
                self.forget_pending_page(user, filename).await;
                vec![notice(SAVE_FAILED_TEXT), self.library_screen(user).await.edit()]
            }
        }
    }

    //=====================================================================================
    // Document uploads
    //=====================================================================================

    pub async fn handle_document(&self, user: UserId, upload: DocumentUpload) -> Vec<Reply> {
        if self.dialogs.get(user).await != DialogState::AwaitingFile {
            let start = self.start_screen(user).await;
            return vec![with_text(start, LOAD_FIRST_TEXT).send()];
        }
        if !upload.is_pdf() {
            let prompt = self.views.load_prompt();
            return vec![with_text(prompt, NOT_A_DOCUMENT_TEXT).send()];
        }

        let filename = upload.file_name.as_str();
        if !self.codec.fits(filename, 1) {
            info!(%user, filename, "Refusing a file name too long for buttons.");
            return vec![self.filename_too_long()];
        }

        self.dialogs.fire(user, DialogTrigger::FileReceived).await;
        if self.library.contains(user, filename).await {
            return vec![self.already_loaded(user).await];
        }

        info!(%user, filename, bytes = upload.data.len(), "Loading document.");
        let text = match self.extractor.extract_text(&upload.data).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%user, filename, error = %e, "Text extraction failed.");
                let start = self.start_screen(user).await;
                let message = format!(
                    "Could not read text from \"{}\". The file may be damaged or unsupported.",
                    filename
                );
                return vec![with_text(start, &message).send()];
            }
        };

        // Page numbers lengthen the cursor tokens, so the name is checked again against the real count.
        let pages = paginate(&text, self.page_size);
        if !self.codec.fits(filename, pages.len()) {
            info!(%user, filename, pages = pages.len(), "Refusing a file name too long for its page buttons.");
            self.dialogs.fire(user, DialogTrigger::RequestFile).await;
            return vec![self.filename_too_long()];
        }

        match self.library.add_document(user, filename, pages).await {
            Ok(document) => {
                info!(%user, filename, pages = document.page_count(), "Document ingested.");
                vec![text_reply(filename), self.views.page(&document, 0).send()]
            }
            Err(LibraryError::DuplicateFilename { .. }) => vec![self.already_loaded(user).await],
            Err(e) => {
                error!(%user, filename, error = %e, "Failed to store document.");
                vec![text_reply(SAVE_FAILED_TEXT)]
            }
        }
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    async fn start_screen(&self, user: UserId) -> Screen {
        self.views.start(self.library.has_library(user).await)
    }

    async fn library_screen(&self, user: UserId) -> Screen {
        self.views.library(&self.library.list_documents(user).await)
    }

    fn filename_too_long(&self) -> Reply {
        with_text(self.views.load_prompt(), FILENAME_TOO_LONG_TEXT).send()
    }

    async fn already_loaded(&self, user: UserId) -> Reply {
        let files = self.library.list_documents(user).await;
        self.views.library_with_heading(ALREADY_LOADED_TEXT, &files).send()
    }

    async fn document_or_none(&self, user: UserId, filename: &str) -> Option<Document> {
        self.library.get_pages(user, filename).await.ok()
    }

    /// Edits the message to show the page under `cursor`; a stale index falls back to the nearest page.
    async fn show_page(&self, user: UserId, cursor: Cursor) -> Vec<Reply> {
        let Some(document) = self.document_or_none(user, &cursor.filename).await else {
            return self.stale(user, &cursor.filename, true).await;
        };
        let index = cursor.index.min(document.page_count().saturating_sub(1));
        vec![self.views.page(&document, index).edit()]
    }

    /// The document behind a button or prompt is gone: say so and show the library.
    async fn stale(&self, user: UserId, filename: &str, from_button: bool) -> Vec<Reply> {
        info!(%user, filename, "Reference to a document that no longer exists.");
        let message = format!("\"{}\" is no longer available.", filename);
        let library = self.library_screen(user).await;
        if from_button {
            vec![notice(&message), library.edit()]
        } else {
            vec![with_text(library, &message).send()]
        }
    }

    async fn forget_pending_page(&self, user: UserId, filename: &str) {
        if let DialogState::AwaitingPageNumber { cursor } = self.dialogs.get(user).await {
            if cursor.filename == filename {
                self.dialogs.reset(user).await;
            }
        }
    }
}

fn text_reply(text: &str) -> Reply {
    Reply::Send {
        text: text.to_string(),
        keyboard: None,
    }
}

fn notice(text: &str) -> Reply {
    Reply::Notice { text: text.to_string() }
}

fn with_text(screen: Screen, text: &str) -> Screen {
    Screen {
        text: text.to_string(),
        ..screen
    }
}
