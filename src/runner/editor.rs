//! Opening a flagged target for inspection.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::interfaces::EditorLauncher;

/// Platform opener used when neither `$VISUAL` nor `$EDITOR` is set.
pub const fn platform_opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "notepad"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Launches `$VISUAL`, `$EDITOR`, or the platform opener, without waiting for it.
#[derive(Debug, Clone, Default)]
pub struct SystemEditor {
    command: Option<OsString>,
}

impl SystemEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `command` (which may carry arguments, e.g. `code -w`) instead of the environment.
    pub fn with_command(command: impl Into<OsString>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    /// The command line that would be used, split on whitespace.
    pub fn resolve_command(&self) -> Vec<String> {
        let configured = self
            .command
            .clone()
            .or_else(|| env::var_os("VISUAL").filter(|v| !v.is_empty()))
            .or_else(|| env::var_os("EDITOR").filter(|v| !v.is_empty()));

        match configured {
            Some(command) => {
                let words: Vec<String> = command.to_string_lossy().split_whitespace().map(str::to_string).collect();
                if words.is_empty() {
                    vec![platform_opener().to_string()]
                } else {
                    words
                }
            }
            None => vec![platform_opener().to_string()],
        }
    }
}

impl EditorLauncher for SystemEditor {
    fn open(&self, path: &Path) -> io::Result<()> {
        let command = self.resolve_command();
        let Some((program, args)) = command.split_first() else {
            return Err(io::Error::other("no editor command"));
        };

        // Dropping the handle does not kill the editor; the runtime reaps it when it exits.
        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(pid = child.id(), editor = %program, path = %path.display(), "editor launched");
        Ok(())
    }
}
