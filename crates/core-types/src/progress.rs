/// Receiver of human-readable progress lines.
///
/// Implementations must never block: the pipeline calls `emit` inline between
/// driver calls and a slow consumer must not stall it.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str);
}
