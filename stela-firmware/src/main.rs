//! Stela - Flash-Resident Forth Workstation Firmware
//!
//! Main firmware binary for RP2040-based boards. Hosts a stack-based
//! language runtime whose source and data persist across power cycles
//! in a reserved partition of the chip's own flash.
//!
//! Named after the Greek "stele" (στήλη), an inscribed stone slab -
//! writing meant to outlive its writer.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stela_core::{BlockStore, Dirfs, FlashGeometry};
use stela_hal_rp2040::flash::{
    Rp2040FlashMedium, BLOCK_REGION_START, FLASH_PAGE_SIZE, FLASH_SIZE,
};

use crate::storage::DIRFS;

mod channels;
mod storage;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stela firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Block store over the reserved flash partition
    let medium = Rp2040FlashMedium::new(p.FLASH);
    let geometry = FlashGeometry::new(
        BLOCK_REGION_START as u32,
        FLASH_SIZE as u32,
        FLASH_PAGE_SIZE as u32,
    )
    .unwrap();
    let store = BlockStore::new(medium, geometry);
    info!("Block store ready: {} blocks", store.block_count());

    // Mount the filesystem, formatting a blank partition on first boot
    let fs = Dirfs::mount_or_format(store).unwrap();
    info!("Filesystem mounted");

    // Console UART
    let uart_config = UartConfig::default(); // 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("Console UART initialized");

    // Storage guard shared by every task
    let dirfs = DIRFS.init(Mutex::new(fs));

    // Spawn tasks
    spawner.spawn(tasks::console_rx_task(rx)).unwrap();
    spawner.spawn(tasks::console_tx_task(tx)).unwrap();
    spawner.spawn(tasks::shell_task(dirfs)).unwrap();
    spawner.spawn(tasks::interp_task()).unwrap();
    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
