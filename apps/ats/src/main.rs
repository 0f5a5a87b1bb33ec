use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ats::config::{Config, UploadRequest};
use ats::events::EventName;
use ats::state::AppState;
use ats::{MultipartPayload, UploadOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS client v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(config.clone())?;
    info!("ATS API client initialized ({})", state.api.base_url());

    // Held for the lifetime of main; dropping it unsubscribes.
    let _updates = state.bus.subscribe(EventName::CandidatesUpdated, |n| {
        info!(
            "{} at {}: {}",
            n.event,
            n.emitted_at.to_rfc3339(),
            n.payload
                .as_ref()
                .and_then(|p| p.get("id"))
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    });

    let page = state.candidates.refresh().await;
    match &page.error {
        Some(error) => warn!("Could not load candidates: {error}"),
        None => info!(
            "Page {} of candidates: {} shown, {} total",
            page.page,
            page.items.len(),
            page.total
        ),
    }

    if let Some(request) = &config.upload {
        upload_resume(&state, request).await?;
    }

    state.candidates.dispose();
    Ok(())
}

async fn upload_resume(state: &AppState, request: &UploadRequest) -> Result<()> {
    let mut payload = MultipartPayload::new();
    if let Some(name) = &request.name {
        payload = payload.text("name", name);
    }
    if let Some(email) = &request.email {
        payload = payload.text("email", email);
    }
    let payload = payload
        .attach_path("resume", &request.resume)
        .await
        .with_context(|| format!("Could not read resume at {}", request.resume.display()))?;

    let record = state
        .candidates
        .upload(payload, UploadOptions::default())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Resume upload failed")?;

    info!(
        "Uploaded candidate {} (resume parsed: {})",
        record.id().map(|id| id.as_str()).unwrap_or("?"),
        record.has_parsed_resume()
    );
    Ok(())
}
