//! Luma Dream Machine API integration module.
//!
//! This module submits image and video generation requests to the Dream
//! Machine API, polls them until they reach a terminal state, and downloads
//! the resulting assets to disk.

mod client;
mod request;

pub use client::{
    asset_path, AssetKind, GenerationAssets, GenerationHandle, GenerationState, LumaClient,
    LumaError, DEFAULT_IMAGE_MODEL, DEFAULT_POLL_INTERVAL, DEFAULT_VIDEO_MODEL, LUMA_API_BASE_URL,
    LUMA_API_KEY_ENV, LUMA_API_KEY_ENV_FALLBACK,
};
pub use request::{validate_prompt, CharacterIdentity, GenerationRequest, ImageRef, Keyframe};
