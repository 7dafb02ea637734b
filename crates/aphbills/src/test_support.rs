use std::cell::RefCell;
use std::collections::HashMap;

use reqwest::StatusCode;

use crate::fetcher::{FetchError, Fetcher};

/// In-memory [`Fetcher`] that serves canned bodies and records every request.
/// Unknown URLs fail the way an exhausted download would.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::DownloadFailed {
                url: url.to_string(),
                attempts: 1,
                status: StatusCode::NOT_FOUND,
            })
    }
}
