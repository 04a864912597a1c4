#![allow(dead_code)]

use async_trait::async_trait;
use bot_lib::adapters::JsonFileRepository;
use bot_lib::config::Config;
use bot_lib::web::dispatch::{Dispatcher, DocumentUpload};
use bot_lib::web::protocol::{Reply, Update};
use bytes::Bytes;
use pdf_reader_core::{LibraryStore, PortError, PortResult, TextExtractionService};
use std::sync::Arc;
use tempfile::TempDir;

pub const USER: i64 = 42;

/// Treats the upload as UTF-8 text; uploads starting with `corrupt` fail to parse.
pub struct FakeExtractor;

#[async_trait]
impl TextExtractionService for FakeExtractor {
    async fn extract_text(&self, pdf_data: &[u8]) -> PortResult<String> {
        if pdf_data.starts_with(b"corrupt") {
            return Err(PortError::Extraction("bad xref table".to_string()));
        }
        String::from_utf8(pdf_data.to_vec()).map_err(|e| PortError::Extraction(e.to_string()))
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub config: Config,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_in(&dir, &config).await;
        Self { dir, config, dispatcher }
    }

    /// A fresh dispatcher over the same data directory, as after a restart.
    pub async fn restart(self) -> Self {
        let dispatcher = dispatcher_in(&self.dir, &self.config).await;
        Self { dispatcher, ..self }
    }

    pub async fn command(&self, command: &str) -> Vec<Reply> {
        self.dispatcher
            .handle_update(Update::Command {
                chat_id: USER,
                command: command.to_string(),
            })
            .await
    }

    pub async fn text(&self, text: &str) -> Vec<Reply> {
        self.dispatcher
            .handle_update(Update::Text {
                chat_id: USER,
                text: text.to_string(),
            })
            .await
    }

    pub async fn press(&self, data: &str) -> Vec<Reply> {
        self.dispatcher
            .handle_update(Update::Callback {
                chat_id: USER,
                data: data.to_string(),
            })
            .await
    }

    pub async fn upload(&self, file_name: &str, content: &str) -> Vec<Reply> {
        self.dispatcher
            .handle_document(
                USER.into(),
                DocumentUpload {
                    file_name: file_name.to_string(),
                    mime_type: Some("application/pdf".to_string()),
                    data: Bytes::from(content.to_string()),
                },
            )
            .await
    }

    /// Presses "Load file" and uploads.
    pub async fn load(&self, file_name: &str, content: &str) -> Vec<Reply> {
        self.press("load").await;
        self.upload(file_name, content).await
    }
}

async fn dispatcher_in(dir: &TempDir, config: &Config) -> Dispatcher {
    let repository = Arc::new(JsonFileRepository::new(dir.path()));
    let library = Arc::new(LibraryStore::open(repository).await.unwrap());
    Dispatcher::new(library, Arc::new(FakeExtractor), config)
}

pub fn words(n: usize) -> String {
    (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// Callback tokens of every button in a reply.
pub fn tokens(reply: &Reply) -> Vec<String> {
    reply
        .keyboard()
        .map(|k| k.buttons().map(|b| b.callback_data.clone()).collect())
        .unwrap_or_default()
}

pub fn labels(reply: &Reply) -> Vec<String> {
    reply
        .keyboard()
        .map(|k| k.buttons().map(|b| b.text.clone()).collect())
        .unwrap_or_default()
}
