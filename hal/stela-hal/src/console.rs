//! Console text output abstraction
//!
//! The file layer reports listings, paths and file contents through this
//! sink; the firmware routes it to the serial console, tests capture it
//! in memory.

/// Text output sink
///
/// Writes are best-effort: a sink that runs out of room (a full output
/// queue, say) drops text rather than blocking the storage path.
pub trait TextSink {
    /// Write a chunk of text
    fn write_str(&mut self, text: &str);

    /// Write a chunk of text followed by a newline
    fn write_line(&mut self, text: &str) {
        self.write_str(text);
        self.write_str("\n");
    }
}
