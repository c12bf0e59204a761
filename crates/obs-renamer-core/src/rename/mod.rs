mod filesystem;
mod prompt;
mod request;
mod workflow;

pub use {
    filesystem::{FileSystem, LocalFileSystem},
    prompt::{ChannelPrompt, PromptRequest, RenamePrompt},
    request::RenameRequest,
    workflow::{RenameOutcome, RenameWorkflow},
};
