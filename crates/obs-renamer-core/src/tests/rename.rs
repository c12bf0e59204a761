use crate::{
    ChannelPrompt, CoreError, FileSystem, IoErrorKind, LocalFileSystem, Notification, Notifier,
    RenameOutcome, RenamePrompt, RenameRequest, RenameWorkflow,
    tests::support::{MockFileSystem, ScriptedPrompt},
};

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tokio::sync::mpsc;

/// WHAT: The default name is the base name without extension
/// WHY: The operator edits the name, never the container format
#[test]
fn given_recording_path_when_building_request_then_default_is_stem() {
    // Given / When: A request for a recording
    let request = RenameRequest::new("/rec/2024-05-01 18-00-00.mkv");

    // Then: The default is the stem
    assert_eq!(request.default_name(), "2024-05-01 18-00-00");
    assert_eq!(request.original(), Path::new("/rec/2024-05-01 18-00-00.mkv"));
    assert_eq!(request.new_name(), None);
}

/// WHAT: A new name keeps the directory and extension
/// WHY: Renaming must not move or re-encode the recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_name_when_resolving_target_then_same_directory_and_extension() {
    // Given: A request answered with a new name
    let request =
        RenameRequest::new("/rec/video.mkv").with_new_name(Some("session-42".to_string()));

    // When: Resolving the target
    let target = request.target().unwrap();

    // Then: Same directory, same extension
    assert_eq!(target, Some(PathBuf::from("/rec/session-42.mkv")));
}

/// WHAT: Blank, missing and unchanged answers resolve to no target
/// WHY: Nothing on disk should change when the operator keeps the name
#[test]
#[allow(clippy::unwrap_used)]
fn given_blank_or_unchanged_answer_when_resolving_target_then_none() {
    for answer in [None, Some("   "), Some(""), Some("video"), Some(" video ")] {
        // Given: A request with a no-op answer
        let request =
            RenameRequest::new("/rec/video.mkv").with_new_name(answer.map(str::to_string));

        // When / Then: No target
        assert_eq!(request.target().unwrap(), None, "answer {answer:?}");
    }
}

/// WHAT: Names that would leave the directory are rejected
/// WHY: The rename must stay next to the original recording
#[test]
fn given_path_like_name_when_resolving_target_then_invalid_file_name() {
    for name in ["../escape", "sub/dir", "win\\dir", "..", "."] {
        // Given: A request with a path-like answer
        let request = RenameRequest::new("/rec/video.mkv").with_new_name(Some(name.to_string()));

        // When / Then: Rejected
        assert!(
            matches!(request.target(), Err(CoreError::InvalidFileName { .. })),
            "name {name:?}"
        );
    }
}

/// WHAT: A file without extension is renamed without adding one
/// WHY: The original extension, even none, is preserved
#[test]
#[allow(clippy::unwrap_used)]
fn given_file_without_extension_when_resolving_target_then_no_extension_added() {
    // Given: A recording without extension
    let request = RenameRequest::new("/rec/raw").with_new_name(Some("take-2".to_string()));

    // When / Then: Plain name
    assert_eq!(request.target().unwrap(), Some(PathBuf::from("/rec/take-2")));
}

/// WHAT: The workflow renames the file to the operator's name
/// WHY: This is the core behaviour the operator relies on
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_existing_recording_when_operator_names_it_then_file_renamed() {
    // Given: A recording and an operator who answers "session-42"
    let filesystem = MockFileSystem::with_files(["/rec/video.mkv"]);
    let prompt = ScriptedPrompt::answering([Some("session-42")]);
    let workflow = RenameWorkflow::new(filesystem.clone(), prompt.clone());

    // When: Running the workflow
    let outcome = workflow.run(Path::new("/rec/video.mkv")).await.unwrap();

    // Then: Renamed once, with the stem offered as default
    assert_eq!(
        outcome,
        RenameOutcome::Renamed(PathBuf::from("/rec/session-42.mkv"))
    );
    assert_eq!(prompt.asked(), vec!["video".to_string()]);
    assert_eq!(
        filesystem.renames(),
        vec![(
            PathBuf::from("/rec/video.mkv"),
            PathBuf::from("/rec/session-42.mkv")
        )]
    );
}

/// WHAT: An empty answer leaves the file alone
/// WHY: Dismissing the prompt means keep the original name
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_empty_answer_when_running_workflow_then_unchanged() {
    // Given: An operator who submits nothing
    let filesystem = MockFileSystem::with_files(["/rec/video.mkv"]);
    let workflow = RenameWorkflow::new(filesystem.clone(), ScriptedPrompt::answering([Some("")]));

    // When: Running the workflow
    let outcome = workflow.run(Path::new("/rec/video.mkv")).await.unwrap();

    // Then: Nothing renamed
    assert_eq!(outcome, RenameOutcome::Unchanged);
    assert!(filesystem.renames().is_empty());
}

/// WHAT: A missing recording fails before the operator is asked
/// WHY: Prompting for a file that is gone wastes the operator's time
#[tokio::test]
async fn given_missing_recording_when_running_workflow_then_not_found_without_prompt() {
    // Given: No file on disk
    let filesystem = MockFileSystem::default();
    let prompt = ScriptedPrompt::answering([Some("session-42")]);
    let workflow = RenameWorkflow::new(filesystem, prompt.clone());

    // When: Running the workflow
    let result = workflow.run(Path::new("/rec/video.mkv")).await;

    // Then: FileNotFound and no prompt
    let error = result.err();
    assert!(matches!(error, Some(CoreError::FileNotFound { .. })));
    assert_eq!(
        error.as_ref().and_then(CoreError::io_kind),
        Some(IoErrorKind::NotFound)
    );
    assert!(prompt.asked().is_empty());
}

/// WHAT: An occupied target is never overwritten
/// WHY: Renaming onto an existing recording would destroy it
#[tokio::test]
async fn given_occupied_target_when_running_workflow_then_target_exists() {
    // Given: The chosen name is already taken
    let filesystem = MockFileSystem::with_files(["/rec/video.mkv", "/rec/session-42.mkv"]);
    let workflow = RenameWorkflow::new(
        filesystem.clone(),
        ScriptedPrompt::answering([Some("session-42")]),
    );

    // When: Running the workflow
    let result = workflow.run(Path::new("/rec/video.mkv")).await;

    // Then: TargetExists and nothing moved
    assert!(matches!(result, Err(CoreError::TargetExists { .. })));
    assert!(filesystem.renames().is_empty());
}

/// WHAT: An invalid answer fails without touching the file
/// WHY: Path separators must not move the recording elsewhere
#[tokio::test]
async fn given_invalid_answer_when_running_workflow_then_invalid_file_name() {
    // Given: An operator answering with a path
    let filesystem = MockFileSystem::with_files(["/rec/video.mkv"]);
    let workflow = RenameWorkflow::new(
        filesystem.clone(),
        ScriptedPrompt::answering([Some("../video")]),
    );

    // When: Running the workflow
    let result = workflow.run(Path::new("/rec/video.mkv")).await;

    // Then: Rejected
    assert!(matches!(result, Err(CoreError::InvalidFileName { .. })));
    assert!(filesystem.renames().is_empty());
}

/// WHAT: The local filesystem renames real files
/// WHY: The production path must move the file on disk
#[test]
#[allow(clippy::unwrap_used)]
fn given_real_file_when_renaming_locally_then_moved() {
    // Given: A file in a temp directory
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("video.mkv");
    let to = dir.path().join("session-42.mkv");
    fs::write(&from, b"frames").unwrap();

    // When: Renaming it
    LocalFileSystem.rename(&from, &to).unwrap();

    // Then: Moved with its content
    assert!(!LocalFileSystem.exists(&from));
    assert_eq!(fs::read(&to).unwrap(), b"frames");
}

/// WHAT: Renaming a missing local file maps to FileNotFound
/// WHY: The operator sees a specific reason, not a generic failure
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_local_file_when_renaming_then_file_not_found() {
    // Given: An empty temp directory
    let dir = tempfile::tempdir().unwrap();

    // When: Renaming a file that is not there
    let result = LocalFileSystem.rename(&dir.path().join("gone.mkv"), &dir.path().join("x.mkv"));

    // Then: FileNotFound
    assert!(matches!(result, Err(CoreError::FileNotFound { .. })));
}

/// WHAT: A rename collision names the target, other failures name the source
/// WHY: "already exists" must point at the file that is in the way
#[test]
#[allow(clippy::panic)]
fn given_rename_io_errors_when_mapping_then_collision_reports_target() {
    // Given: A source and a target path
    let from = Path::new("/rec/video.mkv");
    let to = Path::new("/rec/session-42.mkv");

    // When: Mapping a collision and a missing source
    let exists = CoreError::from_rename(from, to, io::Error::from(io::ErrorKind::AlreadyExists));
    let missing = CoreError::from_rename(from, to, io::Error::from(io::ErrorKind::NotFound));

    // Then: The collision carries the target, the missing file the source
    match exists {
        CoreError::TargetExists { path, .. } => assert_eq!(path, to),
        other => panic!("expected TargetExists, got {other:?}"),
    }
    match missing {
        CoreError::FileNotFound { path, .. } => assert_eq!(path, from),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

/// WHAT: The channel prompt forwards the request and returns the reply
/// WHY: The control surface answers prompts through notifications
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_channel_prompt_when_surface_responds_then_answer_returned() {
    // Given: A prompt publishing into a channel
    let (tx, mut rx) = mpsc::channel(4);
    let prompt = ChannelPrompt::new(Notifier::new(tx));
    let surface = tokio::spawn(async move {
        match rx.recv().await {
            Some(Notification::RenamePrompt(request)) => {
                assert_eq!(request.default_name, "video");
                request.respond(Some("session-42".to_string()));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    });

    // When: Asking
    let answer = prompt.ask(Path::new("/rec/video.mkv"), "video").await;

    // Then: The surface's answer comes back
    surface.await.unwrap();
    assert_eq!(answer.as_deref(), Some("session-42"));
}

/// WHAT: A cancelled or unheard prompt yields no answer
/// WHY: The workflow must keep the original name rather than hang
#[tokio::test]
async fn given_cancelled_or_unheard_prompt_when_asking_then_none() {
    // Given: A surface that cancels
    let (tx, mut rx) = mpsc::channel(4);
    let prompt = ChannelPrompt::new(Notifier::new(tx));
    tokio::spawn(async move {
        if let Some(Notification::RenamePrompt(request)) = rx.recv().await {
            request.cancel();
        }
    });

    // When / Then: Cancelled
    assert_eq!(prompt.ask(Path::new("/rec/video.mkv"), "video").await, None);

    // When / Then: Nobody listening
    let unheard = ChannelPrompt::new(Notifier::disabled());
    assert_eq!(unheard.ask(Path::new("/rec/video.mkv"), "video").await, None);
}
