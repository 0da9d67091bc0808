//! Sink trait for log persistence backends

use super::error::Result;

/// A destination that accepts rendered bytes and persists them.
///
/// Implementations report failures through the returned `Result` and must
/// not panic on I/O errors; the logger isolates one sink's failure from the
/// others during fan-out.
pub trait Sink: Send + Sync {
    /// Persist one rendered line (or any byte span)
    fn persist(&mut self, data: &[u8]) -> Result<()>;

    /// Push buffered bytes down to the OS
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
