use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Media type requested for manifests.
pub const MANIFEST_ACCEPT: &str = "application/json";

/// A manifest fetch as issued by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestRequest {
    /// Absolute `https` URL.
    pub url: String,
    /// Value of the `Accept` header.
    pub accept: &'static str,
    /// Reading must stop with an error once the body grows past this many bytes.
    pub max_body_bytes: usize,
}

/// Raw manifest response; the resolver validates status, content type and size.
#[derive(Clone, Debug, Default)]
pub struct ManifestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Body bytes, never longer than the request's `max_body_bytes`.
    pub body: Vec<u8>,
}

/// Transport used to retrieve manifests.
///
/// Implementations must not attach cookies or other ambient credentials and must not disclose a
/// referring URL. Timeouts are enforced by the caller.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Perform the request and read the body, honoring `max_body_bytes`.
    async fn fetch(&self, request: &ManifestRequest) -> FlipbookResult<ManifestResponse>;
}

/// `reqwest`-backed fetcher.
///
/// The client has no cookie store, sends no `Referer`, refuses plain `http` (including on
/// redirects) and follows at most a few redirects.
#[derive(Clone, Debug)]
pub struct HttpManifestFetcher {
    client: reqwest::Client,
}

impl HttpManifestFetcher {
    /// Build a fetcher with a hardened client.
    pub fn new() -> FlipbookResult<Self> {
        let client = reqwest::Client::builder()
            .https_only(true)
            .referer(false)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FlipbookError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, request: &ManifestRequest) -> FlipbookResult<ManifestResponse> {
        let mut response = self
            .client
            .get(&request.url)
            .header(ACCEPT, request.accept)
            .send()
            .await
            .map_err(|e| transport_error(&request.url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if let Some(len) = response.content_length()
            && len > request.max_body_bytes as u64
        {
            return Err(too_large(&request.url, request.max_body_bytes));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(&request.url, e))?
        {
            if body.len().saturating_add(chunk.len()) > request.max_body_bytes {
                return Err(too_large(&request.url, request.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(ManifestResponse {
            status,
            content_type,
            body,
        })
    }
}

pub(crate) fn too_large(url: &str, max: usize) -> FlipbookError {
    FlipbookError::network(format!(
        "manifest '{url}' exceeds the {max} byte response limit"
    ))
}

fn transport_error(url: &str, e: reqwest::Error) -> FlipbookError {
    if e.is_timeout() {
        FlipbookError::timeout(format!("manifest '{url}' timed out: {e}"))
    } else {
        FlipbookError::network(format!("manifest '{url}' request failed: {e}"))
    }
}
