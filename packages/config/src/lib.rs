// ABOUTME: Environment variable names and default locations for PatentDesk
// ABOUTME: Shared by the CLI config loader and anything that needs the data directory

pub mod constants;

use std::path::PathBuf;

use constants::{DATABASE_FILE_NAME, DATA_DIR_NAME, SESSION_FILE_NAME};

/// `~/.patentdesk`, falling back to the working directory when no home is known
pub fn data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DATA_DIR_NAME),
        None => {
            tracing::warn!("No home directory found, using ./{} for data", DATA_DIR_NAME);
            PathBuf::from(DATA_DIR_NAME)
        }
    }
}

/// SQLite URL for the default document store, created on first use
pub fn default_database_url() -> String {
    format!(
        "sqlite://{}?mode=rwc",
        data_dir().join(DATABASE_FILE_NAME).display()
    )
}

pub fn default_session_file() -> PathBuf {
    data_dir().join(SESSION_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locations_live_in_data_dir() {
        let dir = data_dir();
        assert!(default_session_file().starts_with(&dir));
        assert!(default_session_file().ends_with(SESSION_FILE_NAME));

        let url = default_database_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("documents.db?mode=rwc"));
    }
}
