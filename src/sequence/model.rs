use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Placeholder substituted with the frame number in [`SequenceSource::Pattern`] templates.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Widest accepted `pad`, the digit count of `i64::MIN` including its sign.
pub const MAX_PAD_WIDTH: usize = 20;

/// Declarative description of which frames make up an animation.
///
/// JSON form uses a `"kind"` tag:
///
/// ```json
/// { "kind": "pattern", "template": "/frames/f_{index}.jpg", "start": 1, "end": 120, "pad": 4 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceSource {
    /// Explicit frame URLs, in any order.
    Manual {
        /// Frame URLs.
        frames: Vec<String>,
    },
    /// Frames generated from a template with one `{index}` placeholder.
    Pattern {
        /// URL template.
        template: String,
        /// First index (inclusive).
        start: i64,
        /// Last index (inclusive).
        end: i64,
        /// Left-zero-pad indices to this many digits.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pad: Option<usize>,
    },
    /// Remote JSON manifest describing a manual or pattern source.
    Manifest {
        /// Manifest URL; must use `https`.
        url: String,
    },
}

impl SequenceSource {
    /// Short lowercase name of the variant, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Manual { .. } => "manual",
            Self::Pattern { .. } => "pattern",
            Self::Manifest { .. } => "manifest",
        }
    }

    /// Parse a source descriptor from JSON text.
    pub fn from_json_str(s: &str) -> FlipbookResult<Self> {
        serde_json::from_str(s).map_err(|e| FlipbookError::serde(format!("sequence source: {e}")))
    }
}

/// Ordered, validated frame list.
///
/// `frame_count()` always equals `frames().len()`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedSequence {
    frames: Vec<String>,
    frame_count: usize,
}

impl ResolvedSequence {
    pub(crate) fn new(frames: Vec<String>) -> Self {
        let frame_count = frames.len();
        Self {
            frames,
            frame_count,
        }
    }

    /// Ordered frame URLs.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Return `true` when the sequence has no frames.
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Consume and return the frame URLs.
    pub fn into_frames(self) -> Vec<String> {
        self.frames
    }
}

/// Turn a parsed manifest body into the source it describes.
///
/// Accepted shapes:
///
/// - `{ "frames": [string, ...] }`
/// - `{ "pattern": string, "start"?: int, "end": int, "pad"?: int }`
///
/// `start` defaults to `1`; `start` and `pad` must be positive integers when present, and `pad`
/// may not exceed [`MAX_PAD_WIDTH`].
pub(crate) fn source_from_manifest(doc: &serde_json::Value) -> FlipbookResult<SequenceSource> {
    let Some(obj) = doc.as_object() else {
        return Err(FlipbookError::validation("manifest must be a JSON object"));
    };

    if let Some(frames) = obj.get("frames") {
        let Some(list) = frames.as_array() else {
            return Err(FlipbookError::validation(
                "manifest 'frames' must be an array",
            ));
        };
        let frames = list
            .iter()
            .map(|v| {
                v.as_str().map(str::to_owned).ok_or_else(|| {
                    FlipbookError::validation("manifest 'frames' entries must be strings")
                })
            })
            .collect::<FlipbookResult<Vec<_>>>()?;
        return Ok(SequenceSource::Manual { frames });
    }

    if let Some(pattern) = obj.get("pattern") {
        let Some(template) = pattern.as_str() else {
            return Err(FlipbookError::validation(
                "manifest 'pattern' must be a string",
            ));
        };
        let start = match obj.get("start") {
            None => 1,
            Some(v) => positive_int(v, "start")?,
        };
        let end = match obj.get("end") {
            None => return Err(FlipbookError::validation("manifest 'end' is required")),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| FlipbookError::validation("manifest 'end' must be an integer"))?,
        };
        let pad = match obj.get("pad") {
            None => None,
            Some(v) => Some(pad_width(positive_int(v, "pad")?)?),
        };
        return Ok(SequenceSource::Pattern {
            template: template.to_owned(),
            start,
            end,
            pad,
        });
    }

    Err(FlipbookError::validation(
        "manifest must contain either 'frames' or 'pattern'",
    ))
}

fn positive_int(v: &serde_json::Value, field: &str) -> FlipbookResult<i64> {
    match v.as_i64() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(FlipbookError::validation(format!(
            "manifest '{field}' must be a positive integer"
        ))),
    }
}

/// Check a zero-pad width against [`MAX_PAD_WIDTH`].
fn pad_width(pad: i64) -> FlipbookResult<usize> {
    match usize::try_from(pad) {
        Ok(width) if width <= MAX_PAD_WIDTH => Ok(width),
        _ => Err(FlipbookError::validation(format!(
            "pad must be at most {MAX_PAD_WIDTH} digits, got {pad}"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/model.rs"]
mod tests;
