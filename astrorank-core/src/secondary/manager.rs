///! Per-identifier fetch bookkeeping
///!
///! Tracks `Idle → Fetching → {Succeeded, Failed}` for every identifier,
///! spawns one task per accepted request and reports back over an mpsc
///! channel of [`FetchEvent`]s.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::pipeline::{run_fetch, FetchRequest, JPEG_QUALITY};
use super::source::RasterSource;
use crate::config::{AppConfig, SecondaryDownloadConfig};
use crate::coords::parse_with_format;

/// Subdirectory of the image directory used when no secondary directory is
/// configured
pub const DEFAULT_SECONDARY_SUBDIR: &str = "secondary";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Succeeded(PathBuf),
    Failed(String),
}

/// Notifications from fetch workers
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Progress { identifier: String, percent: u8 },
    Succeeded { identifier: String, path: PathBuf },
    Failed { identifier: String, error: String },
}

impl FetchEvent {
    pub fn identifier(&self) -> &str {
        match self {
            FetchEvent::Progress { identifier, .. }
            | FetchEvent::Succeeded { identifier, .. }
            | FetchEvent::Failed { identifier, .. } => identifier,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FetchEvent::Progress { .. })
    }
}

/// Answer to a fetch request
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A worker was spawned
    Started,
    /// A worker for this identifier is still running; nothing spawned
    AlreadyFetching,
    /// An image is already available
    Cached(PathBuf),
    /// The identifier carries no usable coordinates
    NoCoordinates,
    /// Secondary downloads are switched off
    Disabled,
}

pub struct SecondaryManager {
    source: Arc<dyn RasterSource>,
    download: SecondaryDownloadConfig,
    dest_dir: PathBuf,
    local_dir: Option<PathBuf>,
    states: Arc<RwLock<HashMap<String, FetchState>>>,
    events: mpsc::UnboundedSender<FetchEvent>,
}

impl SecondaryManager {
    /// Downloads land in the configured secondary directory, or in
    /// `<image_dir>/secondary` when none is configured.
    pub fn new(
        config: &AppConfig,
        image_dir: &Path,
        source: Arc<dyn RasterSource>,
        events: mpsc::UnboundedSender<FetchEvent>,
    ) -> Self {
        let local_dir = config.secondary_dir();
        let dest_dir = local_dir
            .clone()
            .unwrap_or_else(|| image_dir.join(DEFAULT_SECONDARY_SUBDIR));
        Self {
            source,
            download: config.secondary_download.clone(),
            dest_dir,
            local_dir,
            states: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub async fn state(&self, identifier: &str) -> FetchState {
        self.states
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default()
    }

    /// Image previously produced for `identifier` in this session
    pub async fn cached_path(&self, identifier: &str) -> Option<PathBuf> {
        match self.state(identifier).await {
            FetchState::Succeeded(path) => Some(path),
            _ => None,
        }
    }

    /// Pre-generated image with the same file name in the secondary directory
    fn local_image(&self, identifier: &str) -> Option<PathBuf> {
        let path = self.local_dir.as_ref()?.join(identifier);
        path.is_file().then_some(path)
    }

    /// Ask for the secondary image of `identifier`.
    ///
    /// At most one worker runs per identifier; a request while one is in
    /// flight is answered with [`FetchOutcome::AlreadyFetching`]. A failed
    /// identifier may be requested again.
    pub async fn request(&self, identifier: &str) -> FetchOutcome {
        if let Some(path) = self.cached_path(identifier).await {
            return FetchOutcome::Cached(path);
        }

        if let Some(path) = self.local_image(identifier) {
            tracing::debug!("Using local secondary image {:?}", path);
            self.states
                .write()
                .await
                .insert(identifier.to_string(), FetchState::Succeeded(path.clone()));
            return FetchOutcome::Cached(path);
        }

        if !self.download.enabled {
            return FetchOutcome::Disabled;
        }

        let Some((coords, format)) = parse_with_format(identifier) else {
            return FetchOutcome::NoCoordinates;
        };

        {
            let mut states = self.states.write().await;
            match states.get(identifier) {
                Some(FetchState::Fetching) => return FetchOutcome::AlreadyFetching,
                Some(FetchState::Succeeded(path)) => return FetchOutcome::Cached(path.clone()),
                _ => {}
            }
            states.insert(identifier.to_string(), FetchState::Fetching);
        }

        let request = FetchRequest {
            coords,
            format,
            survey: self.download.name.clone(),
            url: self.download.download_url(&coords),
            dest_dir: self.dest_dir.clone(),
            mapping: self.download.layer_mapping(),
            quality: JPEG_QUALITY,
        };

        tracing::info!(
            "Fetching {} image for {} ({})",
            request.survey,
            identifier,
            coords
        );

        let identifier = identifier.to_string();
        let source = Arc::clone(&self.source);
        let states = Arc::clone(&self.states);
        let events = self.events.clone();

        tokio::spawn(async move {
            let progress_events = events.clone();
            let progress_id = identifier.clone();
            let result = run_fetch(source.as_ref(), &request, move |percent| {
                let _ = progress_events.send(FetchEvent::Progress {
                    identifier: progress_id.clone(),
                    percent,
                });
            })
            .await;

            let (state, event) = match result {
                Ok(path) => (
                    FetchState::Succeeded(path.clone()),
                    FetchEvent::Succeeded {
                        identifier: identifier.clone(),
                        path,
                    },
                ),
                Err(e) => {
                    tracing::warn!("Secondary fetch for {} failed: {}", identifier, e);
                    (
                        FetchState::Failed(e.to_string()),
                        FetchEvent::Failed {
                            identifier: identifier.clone(),
                            error: e.to_string(),
                        },
                    )
                }
            };

            states.write().await.insert(identifier, state);
            // The session may be gone by now
            let _ = events.send(event);
        });

        FetchOutcome::Started
    }
}
