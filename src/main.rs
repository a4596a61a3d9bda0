use std::path::Path;
use std::time::Duration;

use clap::Parser;

use dreamgen::cli::{Args, Command, GenerateOpts};
use dreamgen::config::{Config, DEFAULT_OUTPUT_DIR};
use dreamgen::luma::{
    AssetKind, GenerationRequest, LumaClient, LumaError, DEFAULT_POLL_INTERVAL, LUMA_API_KEY_ENV,
    LUMA_API_KEY_ENV_FALLBACK,
};

/// Load .env file and check for the API key
///
/// Prefers `env/.env` relative to the working directory, falling back to
/// default `.env` discovery. Does not override existing environment
/// variables. Logs a warning if no API key is set; the key may still arrive
/// from the real environment, so this is not fatal here.
fn load_env() {
    let local = Path::new("env/.env");
    if local.exists() {
        let _ = dotenv::from_path(local);
    } else {
        // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
        let _ = dotenv::dotenv();
    }

    if std::env::var(LUMA_API_KEY_ENV).is_err()
        && std::env::var(LUMA_API_KEY_ENV_FALLBACK).is_err()
    {
        eprintln!(
            "Warning: neither {} nor {} is set.",
            LUMA_API_KEY_ENV, LUMA_API_KEY_ENV_FALLBACK
        );
        eprintln!("         Set one in env/.env, .env, or the environment.\n");
    }
}

/// Build a generation request from the shared subcommand options.
fn build_request(model: String, opts: &GenerateOpts) -> GenerationRequest {
    let mut request = GenerationRequest::new(opts.prompt.clone(), model);
    request.aspect_ratio = opts.aspect_ratio.clone();
    request.resolution = opts.resolution.clone();
    if !opts.image_refs.is_empty() {
        request.image_ref = Some(opts.image_refs.clone());
    }
    if !opts.style_refs.is_empty() {
        request.style_ref = Some(opts.style_refs.clone());
    }
    for (identity, url) in &opts.character_refs {
        request.add_character_ref(identity.as_str(), url.as_str());
    }
    request
}

/// Submit a generation, poll until terminal, and download the asset.
///
/// Settings merge: CLI args > config file > built-in defaults.
async fn run_generate(
    request: &GenerationRequest,
    kind: AssetKind,
    opts: &GenerateOpts,
    config: &Config,
) -> Result<(), LumaError> {
    let client = LumaClient::new()?;

    let output_dir = opts
        .output_dir
        .clone()
        .or_else(|| config.output.dir.clone())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into());

    let interval = opts
        .poll_interval
        .or(config.poll.interval_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    let deadline = opts
        .timeout
        .or(config.poll.timeout_secs)
        .map(Duration::from_secs);

    let path = client
        .generate_and_download(request, kind, &output_dir, interval, deadline)
        .await?;

    println!("File downloaded as {}", path.display());
    Ok(())
}

/// List the camera-motion concepts the API accepts.
async fn run_concepts() -> Result<(), LumaError> {
    let client = LumaClient::new()?;
    let concepts = client.list_concepts().await?;

    println!("Retrieved {} concepts:", concepts.len());
    for concept in concepts {
        println!("- {}", concept);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_env();
    env_logger::init();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Image { opts, model } => {
            let request = build_request(model, &opts);
            run_generate(&request, AssetKind::Image, &opts, &config).await
        }
        Command::Video {
            opts,
            model,
            duration,
            loop_video,
            keyframes,
        } => {
            let mut request = build_request(model, &opts);
            request.duration = duration;
            if loop_video {
                request.loop_video = Some(true);
            }
            for (label, url) in keyframes {
                request.add_keyframe(label, url);
            }
            run_generate(&request, AssetKind::Video, &opts, &config).await
        }
        Command::Concepts => run_concepts().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
