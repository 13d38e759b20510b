use std::sync::Arc;

use futures::FutureExt as _;

use crate::foundation::config::{FrameCap, ResolverOpts};
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::sequence::cache::ManifestCache;
use crate::sequence::fetch::{
    HttpManifestFetcher, MANIFEST_ACCEPT, ManifestFetcher, ManifestRequest, too_large,
};
use crate::sequence::model::{
    INDEX_PLACEHOLDER, MAX_PAD_WIDTH, ResolvedSequence, SequenceSource, source_from_manifest,
};
use crate::sequence::url::{is_secure_url, sort_by_numeric_key, validate_frame_url};

/// Turns [`SequenceSource`] descriptors into validated, ordered frame lists.
///
/// Manual and pattern sources resolve without IO. Manifest sources are fetched through the
/// injected [`ManifestFetcher`] and memoized in the injected [`ManifestCache`]; share one cache
/// between resolvers to share results. Each resolver applies its own frame cap to cached results.
#[derive(Clone)]
pub struct SequenceResolver {
    opts: ResolverOpts,
    fetcher: Arc<dyn ManifestFetcher>,
    cache: ManifestCache,
}

impl std::fmt::Debug for SequenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceResolver")
            .field("opts", &self.opts)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SequenceResolver {
    /// Build a resolver from explicit services.
    pub fn new(opts: ResolverOpts, fetcher: Arc<dyn ManifestFetcher>, cache: ManifestCache) -> Self {
        Self {
            opts,
            fetcher,
            cache,
        }
    }

    /// Build a resolver backed by [`HttpManifestFetcher`] and a fresh default cache.
    pub fn with_http(opts: ResolverOpts) -> FlipbookResult<Self> {
        Ok(Self::new(
            opts,
            Arc::new(HttpManifestFetcher::new()?),
            ManifestCache::default(),
        ))
    }

    /// Resolver configuration.
    pub fn opts(&self) -> &ResolverOpts {
        &self.opts
    }

    /// Manifest cache handle.
    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    /// Resolve `source` into an ordered frame list.
    #[tracing::instrument(skip(self, source), fields(kind = source.kind_name()))]
    pub async fn resolve(&self, source: &SequenceSource) -> FlipbookResult<ResolvedSequence> {
        let cap = self.opts.frame_cap;
        let resolved = match source {
            SequenceSource::Manual { frames } => resolve_manual(frames, cap),
            SequenceSource::Pattern {
                template,
                start,
                end,
                pad,
            } => resolve_pattern(template, *start, *end, *pad, cap),
            SequenceSource::Manifest { url } => self.resolve_manifest(url).await,
        }?;
        tracing::debug!(frames = resolved.frame_count(), "sequence resolved");
        Ok(resolved)
    }

    async fn resolve_manifest(&self, url: &str) -> FlipbookResult<ResolvedSequence> {
        if !is_secure_url(url) {
            return Err(FlipbookError::validation(format!(
                "manifest URL must use https: '{url}'"
            )));
        }

        let (id, shared) = self.cache.get_or_insert_with(url, || {
            let fetcher = Arc::clone(&self.fetcher);
            let opts = self.opts.clone();
            let url = url.to_owned();
            async move { fetch_manifest(fetcher.as_ref(), &opts, &url).await }.boxed()
        });

        let seq = match shared.await {
            Ok(seq) => seq,
            Err(e) => {
                tracing::warn!(url, error = %e, "manifest resolution failed");
                self.cache.remove_entry(url, id);
                return Err(e);
            }
        };
        // The memo may have been filled by a resolver with a larger cap.
        if !self.opts.frame_cap.admits(seq.frame_count()) {
            return Err(FlipbookError::validation(format!(
                "manifest '{url}' has {} frames, above the cap of {}",
                seq.frame_count(),
                self.opts.frame_cap.get()
            )));
        }
        Ok(seq)
    }
}

async fn fetch_manifest(
    fetcher: &dyn ManifestFetcher,
    opts: &ResolverOpts,
    url: &str,
) -> FlipbookResult<ResolvedSequence> {
    let request = ManifestRequest {
        url: url.to_owned(),
        accept: MANIFEST_ACCEPT,
        max_body_bytes: opts.max_manifest_bytes,
    };

    let response = tokio::time::timeout(opts.fetch_timeout, fetcher.fetch(&request))
        .await
        .map_err(|_| {
            FlipbookError::timeout(format!(
                "manifest '{url}' did not arrive within {} ms",
                opts.fetch_timeout.as_millis()
            ))
        })??;

    if !(200..300).contains(&response.status) {
        return Err(FlipbookError::network(format!(
            "manifest '{url}' returned HTTP {}",
            response.status
        )));
    }
    if !is_json_content_type(response.content_type.as_deref()) {
        return Err(FlipbookError::network(format!(
            "manifest '{url}' has non-JSON content type {:?}",
            response.content_type
        )));
    }
    if response.body.len() > opts.max_manifest_bytes {
        return Err(too_large(url, opts.max_manifest_bytes));
    }

    let doc: serde_json::Value = serde_json::from_slice(&response.body)
        .map_err(|e| FlipbookError::validation(format!("manifest '{url}' is not JSON: {e}")))?;
    match source_from_manifest(&doc)? {
        SequenceSource::Manual { frames } => resolve_manual(&frames, opts.frame_cap),
        SequenceSource::Pattern {
            template,
            start,
            end,
            pad,
        } => resolve_pattern(&template, start, end, pad, opts.frame_cap),
        SequenceSource::Manifest { .. } => Err(FlipbookError::validation(
            "manifests may not reference other manifests",
        )),
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return false;
    };
    let essence = ct.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || (essence.len() > "+json".len()
            && essence.to_ascii_lowercase().ends_with("+json")
            && essence.contains('/'))
}

/// Validate, cap and order an explicit frame list.
///
/// Frames failing [`validate_frame_url`] are dropped with a warning; an empty result is an error.
/// The cap applies to the validated list.
pub fn resolve_manual(frames: &[String], cap: FrameCap) -> FlipbookResult<ResolvedSequence> {
    let mut valid = Vec::with_capacity(frames.len().min(cap.get().saturating_add(1)));
    let mut dropped = 0usize;
    for frame in frames {
        match validate_frame_url(frame) {
            Ok(()) => valid.push(frame.clone()),
            Err(e) => {
                dropped += 1;
                tracing::warn!(error = %e, "dropping frame");
            }
        }
    }

    if valid.is_empty() {
        return Err(FlipbookError::validation(format!(
            "no valid frames ({dropped} rejected)"
        )));
    }
    if !cap.admits(valid.len()) {
        return Err(FlipbookError::validation(format!(
            "sequence has {} frames, above the cap of {}",
            valid.len(),
            cap.get()
        )));
    }

    sort_by_numeric_key(&mut valid);
    Ok(ResolvedSequence::new(valid))
}

/// Expand an index template into frame URLs for every integer in `[start, end]`.
///
/// The count is checked against the cap before anything is generated. `pad` may not exceed
/// [`MAX_PAD_WIDTH`].
pub fn resolve_pattern(
    template: &str,
    start: i64,
    end: i64,
    pad: Option<usize>,
    cap: FrameCap,
) -> FlipbookResult<ResolvedSequence> {
    let placeholders = template.matches(INDEX_PLACEHOLDER).count();
    if placeholders != 1 {
        return Err(FlipbookError::validation(format!(
            "pattern template must contain exactly one {INDEX_PLACEHOLDER} placeholder, found {placeholders}"
        )));
    }
    validate_frame_url(&template.replace(INDEX_PLACEHOLDER, "0"))?;

    if let Some(width) = pad
        && width > MAX_PAD_WIDTH
    {
        return Err(FlipbookError::validation(format!(
            "pad must be at most {MAX_PAD_WIDTH} digits, got {width}"
        )));
    }
    if start > end {
        return Err(FlipbookError::validation(format!(
            "pattern start ({start}) must be <= end ({end})"
        )));
    }
    let count = (i128::from(end) - i128::from(start) + 1) as u128;
    if count > cap.get() as u128 {
        return Err(FlipbookError::validation(format!(
            "pattern yields {count} frames, above the cap of {}",
            cap.get()
        )));
    }

    let frames = (start..=end)
        .map(|i| {
            let index = match pad {
                Some(width) => format!("{i:0width$}"),
                None => i.to_string(),
            };
            template.replace(INDEX_PLACEHOLDER, &index)
        })
        .collect();
    Ok(ResolvedSequence::new(frames))
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/resolver.rs"]
mod tests;
