//! LumaClient - handles communication with the Dream Machine API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::request::{validate_prompt, GenerationRequest};

/// The primary environment variable name for the API key.
pub const LUMA_API_KEY_ENV: &str = "LUMA_API_KEY";

/// Alternate environment variable name accepted for the API key.
pub const LUMA_API_KEY_ENV_FALLBACK: &str = "LUMAAI_API_KEY";

/// Default base URL for the Dream Machine API.
pub const LUMA_API_BASE_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "photon-flash-1";

/// Default model for video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "ray-2";

/// Default delay between status polls (3 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default timeout for individual HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An opaque identifier for a submitted generation, used as the polling key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationHandle {
    pub id: String,
}

/// The kind of asset a generation produces. Decides the submission endpoint,
/// which asset URL field is read on completion, and the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    /// File extension for the downloaded artifact.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Image => "jpg",
            AssetKind::Video => "mp4",
        }
    }

    fn name(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }
}

/// Asset URLs attached to a completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GenerationAssets {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
}

impl GenerationAssets {
    /// The asset URL for the given kind, if the service returned one.
    pub fn url_for(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::Image => self.image.as_deref(),
            AssetKind::Video => self.video.as_deref(),
        }
    }
}

/// State of a generation as reported by the service.
///
/// `Completed` and `Failed` are terminal; everything else keeps the poll
/// loop going.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    /// Request accepted, waiting for a worker.
    Queued,
    /// Generation in progress.
    Dreaming,
    /// Generation finished, assets ready to download.
    Completed { assets: GenerationAssets },
    /// Generation failed with a reason string.
    Failed { reason: String },
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationState::Completed { .. } | GenerationState::Failed { .. }
        )
    }
}

/// Response from generation submission and status retrieval. Both endpoints
/// return the same generation object.
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    id: String,
    state: String,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    assets: Option<GenerationAssets>,
}

impl GenerationResponse {
    fn into_state(self) -> Result<GenerationState, LumaError> {
        match self.state.as_str() {
            "queued" => Ok(GenerationState::Queued),
            "dreaming" | "processing" => Ok(GenerationState::Dreaming),
            "completed" => Ok(GenerationState::Completed {
                assets: self.assets.unwrap_or_default(),
            }),
            "failed" => Ok(GenerationState::Failed {
                reason: self
                    .failure_reason
                    .unwrap_or_else(|| "Unknown failure reason".to_string()),
            }),
            unknown => Err(LumaError::Api {
                status: 200,
                message: format!("Unknown generation state: {}", unknown),
            }),
        }
    }
}

/// Build the output path for a downloaded asset: `<dir>/<id>.<ext>`.
///
/// Deterministic given the generation identifier and asset kind.
pub fn asset_path(output_dir: &Path, id: &str, kind: AssetKind) -> PathBuf {
    output_dir.join(format!("{}.{}", id, kind.extension()))
}

/// Client for communicating with the Dream Machine API.
pub struct LumaClient {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl LumaClient {
    /// Create a new LumaClient by reading the API key from the environment.
    ///
    /// Checks `LUMA_API_KEY` first, then `LUMAAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::MissingApiKey` if neither variable is set.
    pub fn new() -> Result<Self, LumaError> {
        let api_key = std::env::var(LUMA_API_KEY_ENV)
            .or_else(|_| std::env::var(LUMA_API_KEY_ENV_FALLBACK))
            .map_err(|_| LumaError::MissingApiKey)?;
        Self::with_api_key(api_key)
    }

    /// Create a new LumaClient with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, LumaError> {
        Self::with_base_url(api_key, LUMA_API_BASE_URL.to_string())
    }

    /// Create a new LumaClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LumaError> {
        if api_key.is_empty() {
            return Err(LumaError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url,
            http_client,
        })
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a video generation request.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::EmptyPrompt` if the prompt is empty,
    /// `LumaError::Api` if the service rejects the request, or
    /// `LumaError::Http` if the request fails at the transport level.
    pub async fn create_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationHandle, LumaError> {
        self.submit("generations", request).await
    }

    /// Submit an image generation request.
    ///
    /// Same contract as [`create_generation`](Self::create_generation), but
    /// targets the image endpoint.
    pub async fn create_image_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationHandle, LumaError> {
        self.submit("generations/image", request).await
    }

    async fn submit(
        &self,
        endpoint: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationHandle, LumaError> {
        // Validate prompt before any network call
        validate_prompt(&request.prompt)?;

        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LumaError::Api {
                status: status.as_u16(),
                message: format!("Generation submission failed: {}", error_text),
            });
        }

        let generation: GenerationResponse = response.json().await?;
        log::info!("Generation submitted, id: {}", generation.id);

        Ok(GenerationHandle { id: generation.id })
    }

    /// Retrieve the current state of a generation by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::Http` if the request fails, or `LumaError::Api`
    /// if the service returns an error response or an unknown state value.
    pub async fn get_generation(&self, id: &str) -> Result<GenerationState, LumaError> {
        let url = format!("{}/generations/{}", self.base_url, id);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LumaError::Api {
                status: status.as_u16(),
                message: format!("Status check failed: {}", error_text),
            });
        }

        let generation: GenerationResponse = response.json().await?;
        generation.into_state()
    }

    /// Poll a generation on a fixed interval until it reaches a terminal
    /// state.
    ///
    /// Returns the assets on completion. A `failed` state becomes
    /// `LumaError::GenerationFailed` and never triggers a download.
    ///
    /// # Arguments
    ///
    /// * `id` - The generation identifier from submission
    /// * `interval` - Delay between status checks
    /// * `deadline` - Optional overall wait limit; `None` waits indefinitely
    ///
    /// # Errors
    ///
    /// Returns `LumaError::GenerationFailed` if the generation fails,
    /// `LumaError::Timeout` if the deadline passes before a terminal state,
    /// or `LumaError::Api` / `LumaError::Http` on status check failures.
    pub async fn poll_until_complete(
        &self,
        id: &str,
        interval: Duration,
        deadline: Option<Duration>,
    ) -> Result<GenerationAssets, LumaError> {
        use tokio::time::Instant;

        let start_time = Instant::now();
        loop {
            if let Some(limit) = deadline {
                if start_time.elapsed() > limit {
                    log::error!("Generation {} timed out after {:?}", id, limit);
                    return Err(LumaError::Timeout);
                }
            }

            match self.get_generation(id).await? {
                GenerationState::Queued => {
                    log::debug!("Generation {}: queued", id);
                }
                GenerationState::Dreaming => {
                    log::info!("Generation {}: dreaming...", id);
                }
                GenerationState::Completed { assets } => {
                    log::info!("Generation {} complete", id);
                    return Ok(assets);
                }
                GenerationState::Failed { reason } => {
                    log::error!("Generation {} failed: {}", id, reason);
                    return Err(LumaError::GenerationFailed { reason });
                }
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Download an asset from a URL to disk.
    ///
    /// Streams the body to disk without buffering the full asset in memory.
    /// A non-success response leaves nothing at `dest`: the status is checked
    /// before the destination file is created.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::Download` on a non-success response,
    /// `LumaError::Http` if the transfer fails, or `LumaError::Io` if
    /// writing to disk fails.
    pub async fn download_asset(&self, url: &str, dest: &Path) -> Result<PathBuf, LumaError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(LumaError::Download {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(dest.to_path_buf())
    }

    /// Submit a generation, poll until terminal, and download the asset.
    ///
    /// This is the end-to-end sequence the CLI runs:
    /// 1. Submit the request to the endpoint matching `kind`
    /// 2. Poll the status on `interval` until completion
    /// 3. Download the asset to `<output_dir>/<id>.<ext>`
    ///
    /// # Returns
    ///
    /// The path to the downloaded file on success.
    ///
    /// # Errors
    ///
    /// Any error from submission, polling, or download propagates. A
    /// completed generation with no asset URL for `kind` is an
    /// `LumaError::Api` error.
    pub async fn generate_and_download(
        &self,
        request: &GenerationRequest,
        kind: AssetKind,
        output_dir: &Path,
        interval: Duration,
        deadline: Option<Duration>,
    ) -> Result<PathBuf, LumaError> {
        let handle = match kind {
            AssetKind::Image => self.create_image_generation(request).await?,
            AssetKind::Video => self.create_generation(request).await?,
        };

        let assets = self
            .poll_until_complete(&handle.id, interval, deadline)
            .await?;

        let asset_url = assets.url_for(kind).ok_or_else(|| LumaError::Api {
            status: 200,
            message: format!(
                "Generation {} completed but returned no {} URL",
                handle.id,
                kind.name()
            ),
        })?;

        let dest = asset_path(output_dir, &handle.id, kind);
        log::info!("Downloading asset from {} to {:?}", asset_url, dest);
        self.download_asset(asset_url, &dest).await
    }

    /// List the camera-motion concepts the API accepts in prompts.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::Api` on a non-success response, or
    /// `LumaError::Http` if the request fails.
    pub async fn list_concepts(&self) -> Result<Vec<String>, LumaError> {
        let url = format!("{}/generations/concepts/list", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LumaError::Api {
                status: status.as_u16(),
                message: format!("Concept list request failed: {}", error_text),
            });
        }

        let concepts: Vec<String> = response.json().await?;
        Ok(concepts)
    }
}

/// Errors that can occur during Dream Machine operations.
#[derive(Debug, thiserror::Error)]
pub enum LumaError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Response body or a description of what failed
        message: String,
    },

    #[error("Generation failed: {reason}")]
    GenerationFailed {
        /// Failure reason reported by the service
        reason: String,
    },

    #[error("Download failed with status {status}: {url}")]
    Download {
        /// HTTP status code of the download response
        status: u16,
        /// The asset URL that failed to download
        url: String,
    },

    #[error("Timed out waiting for generation to complete")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
