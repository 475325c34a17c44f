//! Mock backend for testing without network access.

use std::sync::Mutex;

use crate::client::{BackendError, GenerativeBackend};
use crate::query::InlineImage;

/// A prompt the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub image_mime_type: Option<String>,
}

enum Reply {
    Text(String),
    Failure(String),
    Never,
}

/// Returns a canned reply (or failure) and records every prompt it sees.
pub struct MockBackend {
    reply: Reply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    /// Reply with this text to every request.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with this message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Failure(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Accept every request and never answer.
    pub fn never_replying() -> Self {
        Self {
            reply: Reply::Never,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

impl GenerativeBackend for MockBackend {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                image_mime_type: image.map(|i| i.mime_type.clone()),
            });
        }
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Failure(message) => Err(BackendError::Other(message.clone())),
            Reply::Never => std::future::pending().await,
        }
    }
}
