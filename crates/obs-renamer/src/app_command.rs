use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// Commands typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start monitoring OBS.
    Start,
    /// Stop monitoring OBS.
    Stop,
    /// Print connection and recording state.
    Status,
    /// Replace and persist the connection settings.
    Settings {
        /// Hostname or IP address.
        host: String,
        /// obs-websocket port.
        port: u16,
        /// Password; `None` clears it.
        password: Option<String>,
    },
    /// Print the command list.
    Help,
    /// Request application shutdown.
    Quit,
}

impl AppCommand {
    /// Parse one console line. Keywords are case-insensitive.
    #[track_caller]
    pub fn parse(line: &str) -> AppResult<Self> {
        let invalid = |reason: &str| AppError::InvalidCommand {
            input: line.to_string(),
            reason: reason.to_string(),
            location: ErrorLocation::from(Location::caller()),
        };

        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Err(invalid("empty line"));
        };
        let args: Vec<&str> = words.collect();

        let command = match keyword.to_ascii_lowercase().as_str() {
            "start" => AppCommand::Start,
            "stop" => AppCommand::Stop,
            "status" => AppCommand::Status,
            "help" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            "settings" => {
                let (host, port, password) = match args.as_slice() {
                    [host, port] => (host, port, None),
                    [host, port, password] => (host, port, Some(password.to_string())),
                    _ => return Err(invalid("usage: settings <host> <port> [password]")),
                };
                let port = match port.parse::<u16>() {
                    Ok(port) if port != 0 => port,
                    _ => return Err(invalid("port must be a number between 1 and 65535")),
                };
                return Ok(AppCommand::Settings {
                    host: host.to_string(),
                    port,
                    password,
                });
            }
            _ => return Err(invalid("unknown command, type 'help'")),
        };

        if !args.is_empty() {
            return Err(invalid("command takes no arguments"));
        }

        Ok(command)
    }
}
