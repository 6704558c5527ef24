use std::path::PathBuf;

/// Returns the base directory for chat gateway data.
///
/// Uses `$A3S_CHAT_HOME` if set, otherwise defaults to `~/.a3s/chat`.
pub fn chat_home() -> PathBuf {
    if let Ok(home) = std::env::var("A3S_CHAT_HOME") {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".a3s")
        .join("chat")
}

/// Returns the path to the user configuration file.
pub fn config_path() -> PathBuf {
    chat_home().join("config.toml")
}

/// Returns the default directory served under `/static`.
pub fn frontend_dir() -> PathBuf {
    chat_home().join("frontend")
}
