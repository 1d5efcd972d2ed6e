//! Language runtime attachment point
//!
//! Drains the source channel that `include` and non-file console input
//! feed. The runtime's outer text interpreter consumes this channel;
//! until it is wired in, received source is surfaced on the debug link.

use defmt::*;

use crate::channels::SOURCE_CHANNEL;

/// Interpreter task - consumes source text handed to the runtime
#[embassy_executor::task]
pub async fn interp_task() {
    info!("Interpreter task started");

    loop {
        let source = SOURCE_CHANNEL.receive().await;
        debug!("eval: {=str}", source.as_str());
    }
}
