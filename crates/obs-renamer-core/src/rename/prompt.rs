use crate::{Notification, Notifier};

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use tokio::sync::oneshot;
use tracing::warn;

/// Asks the operator for a replacement base name.
pub trait RenamePrompt: Send + Sync + 'static {
    /// Suspend until the operator answers. `None` means cancelled.
    fn ask(
        &self,
        original: &Path,
        default_name: &str,
    ) -> impl Future<Output = Option<String>> + Send;
}

/// An open rename prompt handed to the control surface.
#[derive(Debug)]
pub struct PromptRequest {
    /// Recording awaiting a name.
    pub original: PathBuf,
    /// Base name to offer.
    pub default_name: String,
    reply: oneshot::Sender<Option<String>>,
}

impl PromptRequest {
    /// Answer the prompt with a base name, or `None` to keep the original.
    pub fn respond(self, answer: Option<String>) {
        // The workflow treats a dropped reply as a cancel anyway.
        let _ = self.reply.send(answer);
    }

    /// Close the prompt without renaming.
    pub fn cancel(self) {
        self.respond(None);
    }
}

/// [`RenamePrompt`] that forwards prompts to the control surface as
/// [`Notification::RenamePrompt`] and waits for the reply.
#[derive(Debug, Clone)]
pub struct ChannelPrompt {
    notifier: Notifier,
}

impl ChannelPrompt {
    /// Create a prompt that publishes through `notifier`.
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

impl RenamePrompt for ChannelPrompt {
    async fn ask(&self, original: &Path, default_name: &str) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        let request = PromptRequest {
            original: original.to_path_buf(),
            default_name: default_name.to_string(),
            reply,
        };

        if !self
            .notifier
            .deliver(Notification::RenamePrompt(request))
            .await
        {
            warn!(path = ?original, "Control surface gone, keeping original name");
            return None;
        }

        answer.await.ok().flatten()
    }
}
