//! Console writer implementation

use crate::core::{LogWriter, Result};
use parking_lot::Mutex;
use std::io::{self, Write};

enum Target {
    Stdout,
    Stderr,
    Custom(Mutex<Box<dyn Write + Send>>),
}

/// Writes records to stdout, stderr, or any other `io::Write` target.
pub struct ConsoleWriter {
    target: Target,
    name: String,
}

impl ConsoleWriter {
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
            name: "stdout".to_string(),
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: Target::Stderr,
            name: "stderr".to_string(),
        }
    }

    /// Wrap an arbitrary target such as a pipe or a socket.
    pub fn new(name: impl Into<String>, target: impl Write + Send + 'static) -> Self {
        Self {
            target: Target::Custom(Mutex::new(Box::new(target))),
            name: name.into(),
        }
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl LogWriter for ConsoleWriter {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        match &self.target {
            Target::Stdout => io::stdout().lock().write_all(bytes)?,
            Target::Stderr => io::stderr().lock().write_all(bytes)?,
            Target::Custom(target) => target.lock().write_all(bytes)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match &self.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
            Target::Custom(target) => target.lock().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
