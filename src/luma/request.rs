//! Request payload types for the Dream Machine API.
//!
//! A `GenerationRequest` is built once, serialized to JSON, and sent once.
//! Optional fields are omitted from the payload entirely when unset, matching
//! what the API expects.

use std::collections::BTreeMap;

use serde::Serialize;

use super::client::LumaError;

/// An input image URL plus a weight controlling how strongly it constrains
/// the output. Used for both composition (`image_ref`) and style
/// (`style_ref`) references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub url: String,
    /// Reference strength in `0.0..=1.0`. Omitted when unset; the API then
    /// applies its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            weight: None,
        }
    }

    pub fn with_weight(url: impl Into<String>, weight: f64) -> Self {
        Self {
            url: url.into(),
            weight: Some(weight),
        }
    }
}

/// A named set of input images used to preserve a subject's identity across
/// a generation. Keyed by identity label in the request payload
/// (e.g. `identity0`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterIdentity {
    pub images: Vec<String>,
}

/// A keyframe image pinning the start or end of a video generation.
/// Serialized as `{"type": "image", "url": ...}` under a frame label
/// (`frame0` for the start, `frame1` for the end).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframe {
    #[serde(rename = "type")]
    kind: &'static str,
    pub url: String,
}

impl Keyframe {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: "image",
            url: url.into(),
        }
    }
}

/// Request body for an image or video generation.
///
/// The same shape serves both: the API endpoint (`/generations` vs
/// `/generations/image`) decides which kind of asset is produced, and fields
/// the endpoint does not understand are simply never set.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// The text prompt to generate from.
    pub prompt: String,
    /// Model identifier (e.g. `photon-flash-1` for images, `ray-2` for video).
    pub model: String,
    /// Aspect ratio string such as `16:9` or `9:16`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Output resolution such as `1080p` or `4k`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Video duration such as `5s` or `9s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Force the video's start and end to match. Incompatible with using
    /// both `frame0` and `frame1` keyframes, since a loop implies they are
    /// the same frame.
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_video: Option<bool>,
    /// Composition references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<Vec<ImageRef>>,
    /// Style references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_ref: Option<Vec<ImageRef>>,
    /// Character references keyed by identity label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_ref: Option<BTreeMap<String, CharacterIdentity>>,
    /// Keyframes keyed by frame label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<BTreeMap<String, Keyframe>>,
}

impl GenerationRequest {
    /// Create a request with only the required fields set.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            aspect_ratio: None,
            resolution: None,
            duration: None,
            loop_video: None,
            image_ref: None,
            style_ref: None,
            character_ref: None,
            keyframes: None,
        }
    }

    /// Add a character reference image under the given identity label.
    /// Multiple images for the same label accumulate.
    pub fn add_character_ref(&mut self, identity: impl Into<String>, image_url: impl Into<String>) {
        self.character_ref
            .get_or_insert_with(BTreeMap::new)
            .entry(identity.into())
            .or_insert_with(|| CharacterIdentity { images: Vec::new() })
            .images
            .push(image_url.into());
    }

    /// Add a keyframe image under the given frame label.
    pub fn add_keyframe(&mut self, label: impl Into<String>, image_url: impl Into<String>) {
        self.keyframes
            .get_or_insert_with(BTreeMap::new)
            .insert(label.into(), Keyframe::image(image_url));
    }
}

/// Validate a prompt before sending to the API.
///
/// # Returns
/// `Ok(())` if the prompt is valid, `Err(LumaError::EmptyPrompt)` if it is
/// empty or whitespace-only.
pub fn validate_prompt(prompt: &str) -> Result<(), LumaError> {
    if prompt.trim().is_empty() {
        return Err(LumaError::EmptyPrompt);
    }

    Ok(())
}
