//! Console UART receive task
//!
//! Assembles raw UART bytes into lines and hands them to the shell.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::{Line, LINE_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Console RX task - receives bytes and dispatches complete lines
#[embassy_executor::task]
pub async fn console_rx_task(mut rx: BufferedUartRx) {
    info!("Console RX task started");

    let mut line = Line::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    match byte {
                        b'\r' | b'\n' => {
                            if line.is_empty() {
                                continue;
                            }
                            // Send to the shell, dropping if full
                            if LINE_CHANNEL.try_send(line.clone()).is_err() {
                                warn!("Line channel full, dropping input");
                            }
                            line.clear();
                        }
                        _ => {
                            if line.push(byte as char).is_err() {
                                warn!("Console line too long, truncating");
                            }
                        }
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
