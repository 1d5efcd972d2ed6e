//! Console UART transmit task
//!
//! Drains the output channel to the serial console.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::OUT_CHANNEL;

/// Console TX task - writes queued text to the UART
#[embassy_executor::task]
pub async fn console_tx_task(mut tx: BufferedUartTx) {
    info!("Console TX task started");

    loop {
        let chunk = OUT_CHANNEL.receive().await;
        if let Err(e) = tx.write_all(chunk.as_bytes()).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
