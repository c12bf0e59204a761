mod app_command;
mod support;
