//! # Script model
//!
//! The planner returns one structured JSON document per run; this module
//! parses it into the immutable [`Script`] the rest of the pipeline consumes.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "title": "T",
//!   "voiceover_text": "V",
//!   "visual_style": "S",
//!   "clips": { "0": { "image_prompt": "P0" }, "1": { "image_prompt": "P1" } }
//! }
//! ```
//!
//! `clips` is keyed by stringified segment index; parsing sorts the keys
//! numerically so segment order never depends on JSON map iteration order.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One generated script. Created once per run, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Script {
    pub title: String,
    pub narration: String,
    pub visual_style: String,
    pub video_logline: Option<String>,
    pub segments: Vec<Segment>,
}

/// One unit of the script: index fixes final ordering, the prompt drives the
/// segment's image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub image_prompt: String,
}

#[derive(Debug, Deserialize)]
struct ScriptDocument {
    title: Option<String>,
    voiceover_text: Option<String>,
    visual_style: Option<String>,
    video_logline: Option<String>,
    clips: Option<HashMap<String, ClipDocument>>,
}

#[derive(Debug, Deserialize)]
struct ClipDocument {
    image_prompt: Option<String>,
}

/// Parses the planner's raw response into a [`Script`].
///
/// # Returns
/// * `Ok(Script)` with segments ordered by numeric clip key.
/// * `Err(Error::Upstream)` if the document is not valid JSON or omits
///   `title`, `voiceover_text`, or a non-empty `clips` map.
#[tracing::instrument(skip(raw))]
pub fn parse_script(raw: &str) -> Result<Script, Error> {
    let doc: ScriptDocument = serde_json::from_str(raw)
        .map_err(|e| Error::Upstream(format!("script response is not valid JSON: {e}")))?;

    let title = doc
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Upstream("script response is missing 'title'".into()))?;
    let narration = doc
        .voiceover_text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Upstream("script response is missing 'voiceover_text'".into()))?;
    let visual_style = doc.visual_style.unwrap_or_default();

    let segments = doc
        .clips
        .unwrap_or_default()
        .into_iter()
        .map(|(key, clip)| {
            let index = key
                .parse::<usize>()
                .map_err(|_| Error::Upstream(format!("clip key '{key}' is not an index")))?;
            let image_prompt = clip
                .image_prompt
                .filter(|p| !p.is_empty())
                .ok_or_else(|| Error::Upstream(format!("clip {index} is missing 'image_prompt'")))?;
            Ok(Segment {
                index,
                image_prompt,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?
        .into_iter()
        .sorted_by_key(|s| s.index)
        .collect_vec();

    if segments.is_empty() {
        return Err(Error::Upstream("script response contains no clips".into()));
    }

    Ok(Script {
        title,
        narration,
        visual_style,
        video_logline: doc.video_logline,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_clips_in_index_order() {
        let raw = r#"{"title":"T","voiceover_text":"V","visual_style":"S","clips":{"0":{"image_prompt":"P0"},"1":{"image_prompt":"P1"}}}"#;
        let script = parse_script(raw).unwrap();

        assert_eq!(script.title, "T");
        assert_eq!(script.narration, "V");
        assert_eq!(script.visual_style, "S");
        assert_eq!(script.segments.len(), 2);
        assert_eq!(script.segments[0].index, 0);
        assert_eq!(script.segments[0].image_prompt, "P0");
        assert_eq!(script.segments[1].index, 1);
        assert_eq!(script.segments[1].image_prompt, "P1");
    }

    #[test]
    fn orders_segments_numerically_not_lexically() {
        let raw = r#"{"title":"T","voiceover_text":"V","clips":{"10":{"image_prompt":"P10"},"2":{"image_prompt":"P2"}}}"#;
        let script = parse_script(raw).unwrap();

        let indices: Vec<usize> = script.segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 10]);
    }

    #[test]
    fn missing_title_is_upstream_error() {
        let raw = r#"{"voiceover_text":"V","clips":{"0":{"image_prompt":"P0"}}}"#;
        let err = parse_script(raw).unwrap_err();
        assert!(matches!(err, Error::Upstream(_)), "got: {err:?}");
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn missing_narration_is_upstream_error() {
        let raw = r#"{"title":"T","clips":{"0":{"image_prompt":"P0"}}}"#;
        let err = parse_script(raw).unwrap_err();
        assert!(err.to_string().contains("voiceover_text"));
    }

    #[test]
    fn empty_clips_is_upstream_error() {
        let raw = r#"{"title":"T","voiceover_text":"V","clips":{}}"#;
        let err = parse_script(raw).unwrap_err();
        assert!(err.to_string().contains("no clips"));
    }

    #[test]
    fn non_numeric_clip_key_is_upstream_error() {
        let raw = r#"{"title":"T","voiceover_text":"V","clips":{"intro":{"image_prompt":"P"}}}"#;
        let err = parse_script(raw).unwrap_err();
        assert!(err.to_string().contains("intro"));
    }

    #[test]
    fn invalid_json_is_upstream_error() {
        let err = parse_script("not json").unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[test]
    fn logline_is_optional_and_carried() {
        let raw = r#"{"title":"T","voiceover_text":"V","video_logline":"L","clips":{"0":{"image_prompt":"P0"}}}"#;
        let script = parse_script(raw).unwrap();
        assert_eq!(script.video_logline.as_deref(), Some("L"));
    }
}
