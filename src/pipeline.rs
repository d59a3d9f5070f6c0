use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::config::RunConfig;
use crate::error::Result;
use crate::fields::extract_fields;
use crate::filler::{fill_fields, submit_form, FillReport};
use crate::page::Page;
use crate::recorder::VideoRecorder;
use crate::resolver::{MockData, ValueResolver};

/// The stages of one run, strictly forward. A fatal error leaves the run at
/// the last stage it reached; the error's variant names what failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Navigated,
    Extracted,
    Resolved,
    Filled,
    Finalized,
}

/// What one run accomplished.
#[derive(Debug)]
pub struct RunSummary {
    pub stage: Stage,
    pub report: FillReport,
    pub video: Option<PathBuf>,
    pub screenshot: Option<PathBuf>,
    pub submitted: bool,
}

/// Execute the whole pipeline: navigate, extract, resolve, fill, finalize.
/// The browser session and the recorder are torn down on every exit path.
pub async fn run(config: &RunConfig, resolver: &dyn ValueResolver) -> Result<RunSummary> {
    let data = MockData::from_path(&config.data_file)?;
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| {
            crate::error::Error::StartupError(format!(
                "cannot create output directory {}: {e}",
                config.output_dir.display()
            ))
        })?;

    let session = format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S"));
    info!(session = %session, url = %config.target_url, "starting form-fill run");

    let browser = Browser::launch(config.browser.clone()).await?;
    let outcome = drive(&browser, config, resolver, &data, &session).await;
    if let Err(e) = browser.close().await {
        warn!("browser shutdown failed: {e}");
    }
    outcome
}

async fn drive(
    browser: &Browser,
    config: &RunConfig,
    resolver: &dyn ValueResolver,
    data: &MockData,
    session: &str,
) -> Result<RunSummary> {
    let page = browser.blank_page().await?;

    // Recording starts on the blank page so navigation itself is captured.
    let video_path = config.output_dir.join(format!("{session}.mjpeg"));
    let recorder = match VideoRecorder::start(&page, video_path).await {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            warn!("video capture unavailable: {e}");
            None
        }
    };

    let result = fill_run(&page, config, resolver, data, session).await;

    // The recorder stops whether the stages succeeded or not.
    let video = match recorder {
        Some(recorder) => match recorder.stop().await {
            Ok(artifact) => {
                info!(frames = artifact.frames, path = %artifact.path.display(), "video saved");
                Some(artifact.path)
            }
            Err(e) => {
                warn!("failed to persist video: {e}");
                None
            }
        },
        None => None,
    };

    let mut summary = result?;
    summary.video = video;
    Ok(summary)
}

async fn fill_run(
    page: &Page,
    config: &RunConfig,
    resolver: &dyn ValueResolver,
    data: &MockData,
    session: &str,
) -> Result<RunSummary> {
    page.goto(&config.target_url).await?;
    if let Err(e) = page.wait_for_selector("input, select, textarea").await {
        warn!("no form controls appeared: {e}");
    }
    let title = page.title().await.unwrap_or_default();
    info!(url = %config.target_url, title = %title, "navigated");

    let fields = extract_fields(page).await?;
    info!(count = fields.len(), "fields extracted");
    if fields.is_empty() {
        warn!("no fillable fields found on the page");
    }

    let resolved = resolver.resolve(&fields, data).await?;
    info!(values = resolved.len(), "values resolved");

    let report = fill_fields(page, &fields, &resolved).await;
    info!(
        attempted = report.attempted,
        filled = report.filled,
        skipped = report.skipped,
        "fill pass complete"
    );

    let mut summary = RunSummary {
        stage: Stage::Filled,
        report,
        video: None,
        screenshot: None,
        submitted: false,
    };

    if config.submit {
        match submit_form(page).await {
            Ok(()) => {
                info!("form submitted");
                summary.submitted = true;
            }
            Err(e) => {
                warn!("submit failed: {e}");
                summary.report.warnings.push(format!("submit failed: {e}"));
            }
        }
    }

    let screenshot = config.output_dir.join(format!("{session}.png"));
    match page.screenshot_to_file(&screenshot).await {
        Ok(()) => summary.screenshot = Some(screenshot),
        Err(e) => {
            warn!("final screenshot failed: {e}");
            summary
                .report
                .warnings
                .push(format!("final screenshot failed: {e}"));
        }
    }

    summary.stage = Stage::Finalized;
    Ok(summary)
}
