use std::path::PathBuf;

/// Root directory for floorb data. `FLOORB_HOME` wins, then `~/.floorb`.
pub fn get_floorb_home() -> PathBuf {
    match std::env::var("FLOORB_HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home),
        _ => PathBuf::from(std::env::var("HOME").unwrap_or_default()).join(".floorb"),
    }
}

/// Default location of the actor documents.
pub fn default_actor_dir() -> PathBuf {
    get_floorb_home().join("actors")
}

/// Default location of the server log file.
pub fn default_log_file() -> PathBuf {
    get_floorb_home().join("logs").join("floorb.log")
}
