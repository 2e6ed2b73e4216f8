//! An in-memory [`HttpClient`] for tests.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Mutex;

use super::client::HttpClient;

/// What a [`FakeClient`] saw of one request.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub url: String,
    pub headers: HeaderMap,
}

/// Answers every request with one canned status and body, and records the
/// requests it was given.
pub(crate) struct FakeClient {
    status: u16,
    body: Vec<u8>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl FakeClient {
    pub fn respond(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::respond(200, body)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.seen.lock().unwrap().push(SeenRequest {
            url: req.url().to_string(),
            headers: req.headers().clone(),
        });
        let response = http::Response::builder()
            .status(self.status)
            .body(self.body.clone())
            .unwrap();
        Ok(reqwest::Response::from(response))
    }
}
