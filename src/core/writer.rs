//! Writer trait for log output destinations

use super::error::Result;

/// A byte sink that receives fully formatted records.
///
/// Writers take `&self` because one record may be written to several outputs at
/// once; each writer locks its own target.
pub trait LogWriter: Send + Sync {
    fn write(&self, bytes: &[u8]) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

impl<W: LogWriter + ?Sized> LogWriter for std::sync::Arc<W> {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
