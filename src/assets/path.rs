use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Normalize a same-origin frame path into a path relative to a frame root.
///
/// The normalized result uses `/` separators, drops a leading `/`, any query or fragment and `.`
/// segments, and rejects parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> FlipbookResult<String> {
    let s = source.replace('\\', "/");
    let s = s.split(['?', '#']).next().unwrap_or_default();
    if s.is_empty() {
        return Err(FlipbookError::validation("frame path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FlipbookError::validation("frame paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FlipbookError::validation(
            "frame path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}
