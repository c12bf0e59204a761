//! Scripted collaborators shared by the core tests.

use crate::{
    Connector, CoreError, CoreResult, Endpoint, FileSystem, InboundEvent, Link, RenamePrompt,
};

use std::{
    collections::{HashSet, VecDeque},
    io,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;
use serde_json::json;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the next connect does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Accept,
    Refuse,
    RejectAuth,
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub(crate) endpoint: Endpoint,
    pub(crate) at: Instant,
}

/// Remote side of one accepted mock connection.
pub(crate) struct MockLink {
    pub(crate) events: mpsc::Sender<InboundEvent>,
    alive: Arc<AtomicBool>,
    close_rx: Mutex<oneshot::Receiver<()>>,
}

impl MockLink {
    /// Simulate the transport dropping.
    pub(crate) fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Whether the session layer has closed this link.
    pub(crate) fn is_closed(&self) -> bool {
        !matches!(
            lock(&self.close_rx).try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }
}

struct MockState {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    attempts: Mutex<Vec<Attempt>>,
    links: Mutex<Vec<Arc<MockLink>>>,
}

/// Connector whose outcomes follow a script, then a fallback.
#[derive(Clone)]
pub(crate) struct MockConnector {
    state: Arc<MockState>,
}

impl MockConnector {
    pub(crate) fn new(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            state: Arc::new(MockState {
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                attempts: Mutex::new(Vec::new()),
                links: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn accepting() -> Self {
        Self::new([], Outcome::Accept)
    }

    pub(crate) fn attempts(&self) -> Vec<Attempt> {
        lock(&self.state.attempts).clone()
    }

    pub(crate) fn links(&self) -> Vec<Arc<MockLink>> {
        lock(&self.state.links).clone()
    }

    pub(crate) fn open_links(&self) -> usize {
        self.links().iter().filter(|link| !link.is_closed()).count()
    }
}

impl Connector for MockConnector {
    async fn connect(&self, endpoint: &Endpoint) -> CoreResult<Link> {
        lock(&self.state.attempts).push(Attempt {
            endpoint: endpoint.clone(),
            at: Instant::now(),
        });

        let outcome = lock(&self.state.script)
            .pop_front()
            .unwrap_or(self.state.fallback);

        match outcome {
            Outcome::Accept => {
                let (events_tx, events_rx) = mpsc::channel(16);
                let alive = Arc::new(AtomicBool::new(true));
                let (close_tx, close_rx) = oneshot::channel();

                lock(&self.state.links).push(Arc::new(MockLink {
                    events: events_tx,
                    alive: Arc::clone(&alive),
                    close_rx: Mutex::new(close_rx),
                }));

                Ok(Link::new(events_rx, alive, close_tx))
            }
            Outcome::Refuse => Err(CoreError::ConnectionRefused {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Outcome::RejectAuth => Err(CoreError::AuthFailed {
                endpoint: endpoint.to_string(),
                reason: "bad password".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct FsState {
    files: HashSet<PathBuf>,
    renames: Vec<(PathBuf, PathBuf)>,
}

/// In-memory filesystem recording every rename.
#[derive(Clone, Default)]
pub(crate) struct MockFileSystem {
    state: Arc<Mutex<FsState>>,
}

impl MockFileSystem {
    pub(crate) fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fs = Self::default();
        lock(&fs.state).files = files.into_iter().map(Into::into).collect();
        fs
    }

    pub(crate) fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        lock(&self.state).renames.clone()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        lock(&self.state).files.contains(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        let mut state = lock(&self.state);
        if !state.files.remove(from) {
            return Err(CoreError::from_rename(
                from,
                to,
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }
        state.files.insert(to.to_path_buf());
        state.renames.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }
}

/// Prompt that replays canned answers and records what it was asked.
#[derive(Clone, Default)]
pub(crate) struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<Option<String>>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub(crate) fn answering(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        let prompt = Self::default();
        *lock(&prompt.answers) = answers
            .into_iter()
            .map(|answer| answer.map(str::to_string))
            .collect();
        prompt
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        lock(&self.asked).clone()
    }
}

impl RenamePrompt for ScriptedPrompt {
    async fn ask(&self, _original: &Path, default_name: &str) -> Option<String> {
        lock(&self.asked).push(default_name.to_string());
        lock(&self.answers).pop_front().flatten()
    }
}

pub(crate) fn endpoint(host: &str) -> Endpoint {
    Endpoint::new(host, 4455, Some("secret".to_string()))
}

pub(crate) fn record_state(output_state: &str, output_path: Option<&str>) -> InboundEvent {
    InboundEvent::new(
        crate::RECORD_STATE_CHANGED,
        json!({
            "outputActive": output_state == "OBS_WEBSOCKET_OUTPUT_STARTED",
            "outputState": output_state,
            "outputPath": output_path,
        }),
    )
}

pub(crate) fn stopped(path: &str) -> InboundEvent {
    record_state("OBS_WEBSOCKET_OUTPUT_STOPPED", Some(path))
}

/// Let spawned tasks run without advancing far on a paused clock.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
