use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Schemes a frame URL may carry. Anything without a scheme is a same-origin relative path.
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Check a frame URL against the protocol whitelist.
///
/// Accepted: absolute `http`/`https` URLs with a host, and same-origin relative paths
/// (`/frames/a.jpg`, `frames/a.jpg`). Rejected: protocol-relative URLs (`//host/a.jpg`, including
/// backslash spellings), which inherit the page's scheme and may point at any host, and every other
/// scheme (`javascript:`, `data:`, `file:`, ...). Whitespace and control characters are ignored
/// while detecting the scheme, the same way browsers strip them.
pub fn validate_frame_url(raw: &str) -> FlipbookResult<()> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_ascii_control() && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(FlipbookError::validation("frame URL is empty"));
    }

    let lead: String = cleaned.chars().take(2).collect();
    if matches!(lead.as_str(), "//" | "\\\\" | "/\\" | "\\/") {
        return Err(FlipbookError::validation(format!(
            "protocol-relative frame URL rejected: '{raw}'"
        )));
    }

    let Some(scheme) = scheme_of(&cleaned) else {
        return Ok(());
    };
    let scheme = scheme.to_ascii_lowercase();
    if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        return Err(FlipbookError::validation(format!(
            "frame URL scheme '{scheme}' is not allowed: '{raw}'"
        )));
    }

    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| FlipbookError::validation(format!("malformed frame URL '{raw}': {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FlipbookError::validation(format!(
            "frame URL has no host: '{raw}'"
        )));
    }
    Ok(())
}

/// Return `true` when `raw` is an absolute URL with the `https` scheme.
pub fn is_secure_url(raw: &str) -> bool {
    reqwest::Url::parse(raw.trim())
        .map(|u| u.scheme() == "https" && u.host_str().is_some())
        .unwrap_or(false)
}

/// RFC 3986 scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` followed by `:`, appearing
/// before any `/`, `?` or `#`.
pub(crate) fn scheme_of(s: &str) -> Option<&str> {
    let end = s.find([':', '/', '?', '#'])?;
    if !s[end..].starts_with(':') || end == 0 {
        return None;
    }
    let candidate = &s[..end];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate)
    } else {
        None
    }
}

/// Sort key of a frame URL: the first run of decimal digits anywhere in the string.
///
/// Returns `None` when the string has no digits. Runs too long for `u64` saturate.
pub fn numeric_key(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits = &s[start..];
    let len = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let key = digits[..len].bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });
    Some(key)
}

/// Stable sort of frame URLs by [`numeric_key`].
///
/// Frames without a numeric key sort before every numbered frame; frames with equal keys, and
/// frames without keys, keep their original relative order.
pub fn sort_by_numeric_key(frames: &mut [String]) {
    frames.sort_by_cached_key(|f| numeric_key(f));
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/url.rs"]
mod tests;
