mod basic;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod header;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use header::WithHeader;

use anyhow::Result;

/// Issues a GET through `client` and returns the body, failing on non-2xx.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fake::FakeClient;

    #[tokio::test]
    async fn test_fetch_bytes_returns_body() {
        let client = FakeClient::ok("[]");

        let bytes = fetch_bytes(&client, "https://example.org/data.json").await.unwrap();

        assert_eq!(bytes, b"[]");
        assert_eq!(client.requests()[0].url, "https://example.org/data.json");
    }

    #[tokio::test]
    async fn test_fetch_bytes_fails_on_server_error() {
        let client = FakeClient::respond(503, "unavailable");

        let err = fetch_bytes(&client, "https://example.org/data.json").await.unwrap_err();

        let status = err.downcast_ref::<reqwest::Error>().and_then(reqwest::Error::status);
        assert_eq!(status, Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        assert!(fetch_bytes(&FakeClient::ok(""), "not a url").await.is_err());
    }
}
