/// Receives human-readable status lines while a call runs.
///
/// Reporting is fire-and-forget: implementations must not block, and a
/// sink that drops messages does not affect the call.
pub trait Progress: Send + Sync {
    /// Delivers one status line.
    fn report(&self, message: &str);
}

/// Discards all progress messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _message: &str) {}
}
