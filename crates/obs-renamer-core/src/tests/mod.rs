mod rename;
mod support;
