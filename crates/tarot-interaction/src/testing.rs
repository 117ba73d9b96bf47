//! In-memory backend used by unit tests.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::sync::Mutex;
use tarot_core::error::BackendError;
use tarot_core::ports::{GenerationRequest, GenerativeBackend, TextStream};

/// Answers with fixed text and records every request it receives.
pub struct RecordingBackend {
    reply: Result<Vec<String>, BackendError>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingBackend {
    pub fn replying(fragments: &[&str]) -> Self {
        Self {
            reply: Ok(fragments.iter().map(|f| f.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    fn record(&self, request: GenerationRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl GenerativeBackend for RecordingBackend {
    async fn complete(&self, request: GenerationRequest) -> Result<String, BackendError> {
        self.record(request);
        self.reply.clone().map(|fragments| fragments.concat())
    }

    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, BackendError> {
        self.record(request);
        let fragments = self.reply.clone()?;
        Ok(stream::iter(fragments.into_iter().map(Ok)).boxed())
    }
}
