//! # Platform-specific utilities
//!
//! Centralizza la ricerca dei tool esterni (`ffmpeg`, `exiftool`) nel `PATH`.
//! I risultati vengono messi in cache per tutta la durata del processo, così
//! ogni trasformazione non deve ripetere la ricerca.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Platform-specific command manager with a lookup cache
pub struct PlatformCommands {
    executable_suffix: &'static str,
    path_separator: char,
    cache: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let (executable_suffix, path_separator) = if cfg!(windows) {
            (".exe", ';')
        } else {
            ("", ':')
        };

        Self {
            executable_suffix,
            path_separator,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get the platform-specific command name
    pub fn get_command(&self, base_name: &str) -> String {
        format!("{}{}", base_name, self.executable_suffix)
    }

    /// Resolve a tool in the system PATH
    pub fn get_tool_path(&self, base_name: &str) -> Option<PathBuf> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        cache
            .entry(base_name.to_string())
            .or_insert_with(|| {
                let found = self.find_in_system_path(base_name);
                debug!("Resolved tool {} -> {:?}", base_name, found);
                found
            })
            .clone()
    }

    /// Check if a command is available on the system
    pub fn is_command_available(&self, base_name: &str) -> bool {
        self.get_tool_path(base_name).is_some()
    }

    fn find_in_system_path(&self, base_name: &str) -> Option<PathBuf> {
        let command = self.get_command(base_name);

        env::var_os("PATH")?
            .to_str()?
            .split(self.path_separator)
            .filter(|dir| !dir.is_empty())
            .map(|dir| Path::new(dir).join(&command))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_command_name() {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform.get_command("ffmpeg");
        assert!(ffmpeg.starts_with("ffmpeg"));
    }

    #[test]
    fn test_unknown_tool_is_unavailable() {
        let platform = PlatformCommands::instance();
        assert!(!platform.is_command_available("definitely-not-a-real-tool-4242"));
        // Second lookup is served by the cache
        assert!(platform.get_tool_path("definitely-not-a-real-tool-4242").is_none());
    }
}
