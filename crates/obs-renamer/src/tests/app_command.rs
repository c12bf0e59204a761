use crate::{AppCommand, AppError};

/// WHAT: Keywords parse case-insensitively, with aliases
/// WHY: Operators type quickly and inconsistently
#[test]
#[allow(clippy::unwrap_used)]
fn given_keywords_when_parsing_then_commands_recognised() {
    let cases = [
        ("start", AppCommand::Start),
        ("  STOP ", AppCommand::Stop),
        ("Status", AppCommand::Status),
        ("help", AppCommand::Help),
        ("?", AppCommand::Help),
        ("quit", AppCommand::Quit),
        ("exit", AppCommand::Quit),
    ];

    for (line, expected) in cases {
        assert_eq!(AppCommand::parse(line).unwrap(), expected, "line {line:?}");
    }
}

/// WHAT: Settings take host and port, and an optional password
/// WHY: OBS may run with or without authentication
#[test]
#[allow(clippy::unwrap_used)]
fn given_settings_line_when_parsing_then_host_port_and_password_extracted() {
    // When
    let with_password = AppCommand::parse("settings 192.168.1.40 4455 hunter2").unwrap();
    let without_password = AppCommand::parse("settings obs.local 4456").unwrap();

    // Then
    assert_eq!(
        with_password,
        AppCommand::Settings {
            host: "192.168.1.40".to_string(),
            port: 4455,
            password: Some("hunter2".to_string()),
        }
    );
    assert_eq!(
        without_password,
        AppCommand::Settings {
            host: "obs.local".to_string(),
            port: 4456,
            password: None,
        }
    );
}

/// WHAT: Bad ports and missing arguments are rejected
/// WHY: Unusable settings must never be saved
#[test]
fn given_bad_settings_when_parsing_then_invalid_command() {
    for line in [
        "settings",
        "settings obs",
        "settings obs 0",
        "settings obs 70000",
        "settings obs port",
        "settings obs 4455 pw extra",
    ] {
        assert!(
            matches!(AppCommand::parse(line), Err(AppError::InvalidCommand { .. })),
            "line {line:?}"
        );
    }
}

/// WHAT: Unknown words and stray arguments are rejected
/// WHY: A typo must not be mistaken for a different command
#[test]
fn given_unknown_or_extra_words_when_parsing_then_invalid_command() {
    for line in ["", "   ", "record", "start now", "quit please"] {
        assert!(
            matches!(AppCommand::parse(line), Err(AppError::InvalidCommand { .. })),
            "line {line:?}"
        );
    }
}
