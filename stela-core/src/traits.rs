//! Collaborator seams consumed by the file layer
//!
//! The text output side lives in `stela-hal` ([`stela_hal::TextSink`]);
//! this module holds the seam facing the language runtime.

/// Text entry point of the language runtime
///
/// `include` hands source text here for execution rather than display.
/// What the text means is entirely the runtime's business; the file layer
/// only guarantees it arrives in order, one decoded chunk at a time.
pub trait Evaluator {
    /// Submit a chunk of source text for execution
    fn evaluate(&mut self, source: &str);
}
