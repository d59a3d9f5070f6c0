use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat,
    StartScreencastParams, StopScreencastParams,
};
use chromiumoxide::page::Page as CrPage;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::page::Page;

/// The persisted recording of one run.
pub struct RecordingArtifact {
    pub path: PathBuf,
    pub frames: usize,
}

/// Captures the page as a CDP screencast and persists it as one
/// Motion-JPEG file (concatenated JPEG frames) per run.
pub struct VideoRecorder {
    page: CrPage,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    listener: tokio::task::JoinHandle<()>,
    path: PathBuf,
}

impl VideoRecorder {
    /// Subscribe to screencast frames and start the capture. The listener
    /// must be attached before the screencast is enabled so no frame is lost.
    pub async fn start(page: &Page, path: PathBuf) -> Result<Self> {
        let cr_page = page.inner().clone();

        let mut events = cr_page
            .event_listener::<EventScreencastFrame>()
            .await
            .map_err(|e| Error::RecordingError(format!("cannot listen for frames: {e}")))?;

        let frames: Arc<Mutex<Vec<Vec<u8>>>> = Arc::default();
        let sink = Arc::clone(&frames);
        let ack_page = cr_page.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                // Every frame must be acknowledged or Chrome stops sending.
                let ack = ScreencastFrameAckParams::new(event.session_id);
                if let Err(e) = ack_page.execute(ack).await {
                    debug!("screencast ack failed: {e}");
                }
                let data: &str = event.data.as_ref();
                match base64::engine::general_purpose::STANDARD.decode(data.as_bytes()) {
                    Ok(bytes) => sink.lock().await.push(bytes),
                    Err(e) => debug!("dropping undecodable frame: {e}"),
                }
            }
        });

        let params = StartScreencastParams::builder()
            .format(StartScreencastFormat::Jpeg)
            .quality(70)
            .every_nth_frame(2)
            .build();
        cr_page
            .execute(params)
            .await
            .map_err(|e| Error::RecordingError(format!("cannot start screencast: {e}")))?;

        Ok(Self {
            page: cr_page,
            frames,
            listener,
            path,
        })
    }

    /// Stop the capture and write the artifact.
    pub async fn stop(self) -> Result<RecordingArtifact> {
        if let Err(e) = self.page.execute(StopScreencastParams::default()).await {
            debug!("screencast stop failed: {e}");
        }
        // Let in-flight frames drain before tearing the listener down.
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.listener.abort();

        let frames = self.frames.lock().await;
        if frames.is_empty() {
            return Err(Error::RecordingError("no frames captured".into()));
        }

        let total: usize = frames.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total);
        for frame in frames.iter() {
            out.extend_from_slice(frame);
        }
        tokio::fs::write(&self.path, &out)
            .await
            .map_err(|e| Error::RecordingError(format!("cannot write video: {e}")))?;

        Ok(RecordingArtifact {
            path: self.path,
            frames: frames.len(),
        })
    }
}
