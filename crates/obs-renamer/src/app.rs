use crate::{
    AppCommand, AppResult,
    config::Config,
    console::{Console, HELP},
};

use obs_renamer_core::{
    ChannelPrompt, Connector, LocalFileSystem, Monitor, Notification, Notifier, PromptRequest,
    RenameWorkflow,
};

use std::{io::Write, path::PathBuf, sync::Arc};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Notifications buffered between the core and the console.
const NOTIFICATION_CAPACITY: usize = 64;

/// Whether the console loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Main application state.
///
/// Owns the monitor, the persisted settings and the console. Lines typed by
/// the operator and notifications from the core are handled on one task, so
/// an open rename prompt always captures the next line.
pub struct App<C, W> {
    monitor: Arc<Monitor<C>>,
    config: Config,
    config_path: PathBuf,
    console: Console<W>,
    notifications: mpsc::Receiver<Notification>,
    pending_prompt: Option<PromptRequest>,
}

impl<C: Connector, W: Write> App<C, W> {
    /// Build the app and its monitor. Must be called inside a tokio runtime.
    pub(crate) fn new(
        connector: C,
        config: Config,
        config_path: PathBuf,
        console: Console<W>,
    ) -> Self {
        let (notification_tx, notifications) = mpsc::channel(NOTIFICATION_CAPACITY);
        let notifier = Notifier::new(notification_tx);

        let workflow = RenameWorkflow::new(LocalFileSystem, ChannelPrompt::new(notifier.clone()));
        let monitor = Monitor::new(
            connector,
            config.endpoint(),
            config.supervisor_config(),
            workflow,
            notifier,
        );

        Self {
            monitor: Arc::new(monitor),
            config,
            config_path,
            console,
            notifications,
            pending_prompt: None,
        }
    }

    /// Run the console loop until `quit` or until `lines` closes.
    #[instrument(skip_all)]
    pub(crate) async fn run(mut self, mut lines: mpsc::Receiver<String>) -> AppResult<()> {
        info!(endpoint = %self.config.endpoint(), "OBS Renamer starting");

        self.console.line(format!(
            "OBS Renamer. Monitoring {} (type 'start' to begin).",
            self.config.endpoint()
        ))?;
        self.console.line(HELP)?;

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        info!("Console input closed, shutting down");
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        info!("Shutdown requested");
                        break;
                    }
                }

                Some(notification) = self.notifications.recv() => {
                    self.handle_notification(notification)?;
                }
            }
        }

        self.shutdown().await;

        Ok(())
    }

    /// Handle one line typed by the operator.
    pub(crate) async fn handle_line(&mut self, line: &str) -> AppResult<Flow> {
        if let Some(request) = self.pending_prompt.take() {
            debug!(path = ?request.original, "Answering rename prompt");
            request.respond(Some(line.to_string()));
            return Ok(Flow::Continue);
        }

        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }

        let command = match AppCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "Rejected console input");
                self.console.error(&e)?;
                return Ok(Flow::Continue);
            }
        };

        self.execute(command)
    }

    /// Render a notification and track the open prompt.
    pub(crate) fn handle_notification(&mut self, notification: Notification) -> AppResult<()> {
        match notification {
            Notification::RenamePrompt(request) => {
                if let Some(stale) = self.pending_prompt.take() {
                    warn!(path = ?stale.original, "New prompt replaced an unanswered one");
                    stale.cancel();
                }
                self.console.prompt(&request)?;
                self.pending_prompt = Some(request);
                Ok(())
            }
            other => self.console.notification(&other),
        }
    }

    #[instrument(skip_all)]
    fn execute(&mut self, command: AppCommand) -> AppResult<Flow> {
        match command {
            AppCommand::Start => {
                let monitor = Arc::clone(&self.monitor);
                tokio::spawn(async move {
                    if let Err(e) = monitor.start_monitoring().await {
                        warn!(error = %e, "Monitoring did not start");
                    }
                });
            }
            AppCommand::Stop => {
                let monitor = Arc::clone(&self.monitor);
                tokio::spawn(async move { monitor.stop_monitoring().await });
            }
            AppCommand::Status => {
                self.console.status(
                    &self.config.endpoint().to_string(),
                    &self.monitor.connection_status(),
                    &self.monitor.recording_phase(),
                )?;
            }
            AppCommand::Settings {
                host,
                port,
                password,
            } => self.apply_settings(host, port, password)?,
            AppCommand::Help => self.console.line(HELP)?,
            AppCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Validate and persist new connection settings, then hand them to the
    /// monitor. Nothing is applied if saving fails.
    fn apply_settings(
        &mut self,
        host: String,
        port: u16,
        password: Option<String>,
    ) -> AppResult<()> {
        let mut updated = self.config.clone();
        updated.set_connection(host, port, password);

        let saved = updated
            .validate()
            .and_then(|()| updated.save_to(&self.config_path));
        if let Err(e) = saved {
            warn!(error = %e, "Settings rejected");
            return self.console.error(&e);
        }

        self.config = updated;
        let endpoint = self.config.endpoint();
        self.console
            .line(format!("Settings saved; OBS is now {endpoint}"))?;

        let monitor = Arc::clone(&self.monitor);
        tokio::spawn(async move {
            if let Err(e) = monitor.update_settings(endpoint).await {
                warn!(error = %e, "Reconnect with new settings failed");
            }
        });

        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Some(request) = self.pending_prompt.take() {
            request.cancel();
        }
        self.monitor.stop_monitoring().await;
        info!("OBS Renamer shut down");
    }

    /// Configuration currently in effect.
    #[cfg(test)]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a rename prompt is waiting for the next line.
    #[cfg(test)]
    pub(crate) fn has_pending_prompt(&self) -> bool {
        self.pending_prompt.is_some()
    }

    #[cfg(test)]
    pub(crate) fn monitor(&self) -> &Monitor<C> {
        &self.monitor
    }
}
