use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::Context as _;

use crate::assets::decode::{DecodedFrame, decode_image};
use crate::assets::path::normalize_rel_path;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::sequence::url::{scheme_of, validate_frame_url};

/// Outcome of one frame load, delivered back to the controller that issued it.
#[derive(Debug)]
pub struct LoadCompletion {
    /// URL the load was issued for.
    pub url: String,
    /// Generation token of the issuing request.
    pub token: u64,
    /// Decoded frame, or the reason it could not be produced.
    pub result: FlipbookResult<DecodedFrame>,
}

/// One pending frame load.
///
/// Loaders call [`LoadRequest::complete`] exactly once, from any thread, when the image is fully
/// decoded (or has failed).
#[derive(Debug)]
pub struct LoadRequest {
    url: String,
    token: u64,
    reply: Sender<LoadCompletion>,
}

impl LoadRequest {
    pub(crate) fn new(url: String, token: u64, reply: Sender<LoadCompletion>) -> Self {
        Self { url, token, reply }
    }

    /// URL to load.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Generation token of this request.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Deliver the outcome. A controller that no longer exists simply never sees it.
    pub fn complete(self, result: FlipbookResult<DecodedFrame>) {
        let _ = self.reply.send(LoadCompletion {
            url: self.url,
            token: self.token,
            result,
        });
    }
}

/// Frame image loading seam.
///
/// Implementations must not block the caller; work happens elsewhere and reports back through
/// the request.
pub trait FrameLoader {
    /// Start loading `request.url()`.
    fn load(&self, request: LoadRequest);
}

/// Loads same-origin-relative frame paths from a directory, decoding on the `rayon` pool.
#[derive(Clone, Debug)]
pub struct FileFrameLoader {
    root: PathBuf,
}

impl FileFrameLoader {
    /// Serve frames relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory frames are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> FlipbookResult<PathBuf> {
        if scheme_of(url).is_some() {
            return Err(FlipbookError::load(format!(
                "'{url}' is absolute; the file loader serves relative paths only"
            )));
        }
        let rel =
            normalize_rel_path(url).map_err(|e| FlipbookError::load(format!("{url}: {e}")))?;
        Ok(self.root.join(rel))
    }
}

impl FrameLoader for FileFrameLoader {
    fn load(&self, request: LoadRequest) {
        let path = match self.resolve(request.url()) {
            Ok(path) => path,
            Err(e) => {
                request.complete(Err(e));
                return;
            }
        };
        rayon::spawn(move || {
            let result = read_and_decode(&path)
                .map_err(|e| FlipbookError::load(format!("{}: {e:#}", request.url())));
            request.complete(result);
        });
    }
}

fn read_and_decode(path: &Path) -> anyhow::Result<DecodedFrame> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    Ok(decode_image(&bytes)?)
}

/// Default per-frame fetch budget for [`HttpFrameLoader`].
pub const FRAME_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default largest encoded frame [`HttpFrameLoader`] will download.
pub const FRAME_MAX_BYTES: usize = 32 * 1024 * 1024;

/// Fetches frames over HTTP(S) on a `tokio` runtime, decoding on its blocking pool.
///
/// Relative frame URLs are joined onto `base`; without a base they fail to load. Bodies are
/// streamed and abandoned once they pass [`HttpFrameLoader::max_bytes`].
#[derive(Clone, Debug)]
pub struct HttpFrameLoader {
    client: reqwest::Client,
    base: Option<reqwest::Url>,
    runtime: tokio::runtime::Handle,
    max_bytes: usize,
}

impl HttpFrameLoader {
    /// Build a loader that spawns onto `runtime`.
    pub fn new(
        base: Option<reqwest::Url>,
        runtime: tokio::runtime::Handle,
    ) -> FlipbookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FRAME_FETCH_TIMEOUT)
            .referer(false)
            .build()
            .context("build frame http client")?;
        Ok(Self {
            client,
            base,
            runtime,
            max_bytes: FRAME_MAX_BYTES,
        })
    }

    /// Replace the per-frame download limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Largest encoded frame this loader will download.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Base URL relative frames are joined onto.
    pub fn base(&self) -> Option<&reqwest::Url> {
        self.base.as_ref()
    }

    fn resolve(&self, url: &str) -> FlipbookResult<reqwest::Url> {
        validate_frame_url(url).map_err(|e| FlipbookError::load(e.to_string()))?;
        if scheme_of(url).is_some() {
            return reqwest::Url::parse(url)
                .map_err(|e| FlipbookError::load(format!("{url}: {e}")));
        }
        let base = self.base.as_ref().ok_or_else(|| {
            FlipbookError::load(format!("relative frame '{url}' needs a base url"))
        })?;
        base.join(url)
            .map_err(|e| FlipbookError::load(format!("{url}: {e}")))
    }
}

impl FrameLoader for HttpFrameLoader {
    fn load(&self, request: LoadRequest) {
        let url = match self.resolve(request.url()) {
            Ok(url) => url,
            Err(e) => {
                request.complete(Err(e));
                return;
            }
        };
        let client = self.client.clone();
        let max_bytes = self.max_bytes;
        self.runtime.spawn(async move {
            let result = fetch_and_decode(&client, url, max_bytes).await;
            request.complete(result);
        });
    }
}

async fn fetch_and_decode(
    client: &reqwest::Client,
    url: reqwest::Url,
    max_bytes: usize,
) -> FlipbookResult<DecodedFrame> {
    let fail = |e: &dyn std::fmt::Display| FlipbookError::load(format!("{url}: {e}"));
    let mut resp = client.get(url.clone()).send().await.map_err(|e| fail(&e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fail(&format!("http status {status}")));
    }
    let too_large = || fail(&format!("frame exceeds the {max_bytes} byte limit"));
    if let Some(len) = resp.content_length()
        && len > max_bytes as u64
    {
        return Err(too_large());
    }
    let mut bytes = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(|e| fail(&e))? {
        if bytes.len().saturating_add(chunk.len()) > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| fail(&e))?
        .map_err(|e| fail(&e))
}

#[cfg(test)]
#[path = "../../tests/unit/frames/loader.rs"]
mod tests;
