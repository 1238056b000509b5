//! Source formatting
//!
//! Generated code is passed through the target language's canonical
//! formatter before it is written.

use std::io::Write;
use std::process::{Command, Stdio};

/// Formatting failures
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The formatter could not be run at all
    #[error("run {command:?}: {source}")]
    Unavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The formatter ran and refused the source
    #[error("{0}")]
    Rejected(String),
}

/// Canonical formatter for generated source text
pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// External formatter reading source on stdin and writing it on stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gofmt {
    command: String,
}

impl Gofmt {
    /// Formatter running `command`, split on whitespace into program and
    /// arguments
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::new("gofmt")
    }
}

impl SourceFormatter for Gofmt {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let unavailable = |source| FormatError::Unavailable {
            command: self.command.clone(),
            source,
        };

        let mut words = self.command.split_whitespace();
        let program = words.next().ok_or_else(|| {
            unavailable(std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty formatter command"))
        })?;

        let mut child = Command::new(program)
            .args(words)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        // Feed stdin from another thread so a full stdout pipe cannot block us
        let mut stdin = child.stdin.take().ok_or_else(|| {
            unavailable(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "formatter stdin closed"))
        })?;
        let input = source.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output().map_err(unavailable)?;
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::new(std::io::ErrorKind::Other, "formatter input writer panicked")));

        // A formatter exiting early may close stdin first; its status says why
        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(command = %self.command, %message, "formatter rejected source");
            return Err(FormatError::Rejected(message));
        }
        written.map_err(unavailable)?;

        String::from_utf8(output.stdout).map_err(|e| FormatError::Rejected(e.to_string()))
    }
}

/// Formatter leaving source text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl SourceFormatter for Verbatim {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_keeps_text() {
        let text = "package db\n\n\n\nvar x = 1\n";
        assert_eq!(Verbatim.format(text).unwrap(), text);
    }

    #[test]
    fn missing_command_is_unavailable() {
        let formatter = Gofmt::new("sqlgen-no-such-formatter-command");
        let err = formatter.format("package db\n").unwrap_err();
        assert!(matches!(err, FormatError::Unavailable { .. }));
    }

    #[test]
    fn empty_command_is_unavailable() {
        let err = Gofmt::new("  ").format("package db\n").unwrap_err();
        assert!(matches!(err, FormatError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn external_command_output() {
        let formatter = Gofmt::new("cat");
        assert_eq!(formatter.format("package db\n").unwrap(), "package db\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_rejected() {
        let formatter = Gofmt::new("false");
        assert!(matches!(formatter.format("package db\n"), Err(FormatError::Rejected(_))));
    }
}
