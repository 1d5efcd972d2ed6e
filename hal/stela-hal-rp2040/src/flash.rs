//! Flash medium driver for RP2040
//!
//! Exposes the last 512KB of the 2MB XIP flash as the block storage
//! region. Erase and program run from RAM-resident embassy-rp code while
//! the XIP cache is paused, so the calling task blocks for the duration.
//!
//! Implements the `FlashMedium` trait from `stela-hal`.

use embassy_rp::flash::{Blocking, Error as FlashDriverError, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

// Re-export shared types from stela-hal
pub use stela_hal::flash::{FlashMedium, MediumError};

/// Total flash fitted on supported boards (2MB)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Size of the block storage region (1024 blocks of 512 bytes)
pub const BLOCK_REGION_SIZE: usize = 512 * 1024;

/// First byte of the block storage region
pub const BLOCK_REGION_START: usize = FLASH_SIZE - BLOCK_REGION_SIZE;

/// Erase page size for RP2040 flash
pub const FLASH_PAGE_SIZE: usize = ERASE_SIZE;

/// RP2040 flash medium implementation
///
/// Wraps the blocking embassy-rp flash driver. Addresses given to the
/// trait methods are offsets from the start of flash, matching the
/// driver's addressing.
pub struct Rp2040FlashMedium<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> Rp2040FlashMedium<'d> {
    /// Create a new flash medium instance
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    /// Get the raw flash peripheral for low-level access
    pub fn flash(&mut self) -> &mut Flash<'d, FLASH, Blocking, FLASH_SIZE> {
        &mut self.flash
    }
}

fn map_err(e: FlashDriverError) -> MediumError {
    match e {
        FlashDriverError::OutOfBounds | FlashDriverError::Unaligned => MediumError::OutOfBounds,
        _ => MediumError::Device,
    }
}

// Implement the shared FlashMedium trait
impl<'d> FlashMedium for Rp2040FlashMedium<'d> {
    fn erase(&mut self, from: u32, to: u32) -> Result<(), MediumError> {
        self.flash.blocking_erase(from, to).map_err(map_err)
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), MediumError> {
        self.flash.blocking_write(addr, data).map_err(map_err)
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), MediumError> {
        self.flash.blocking_read(addr, buf).map_err(map_err)
    }
}
