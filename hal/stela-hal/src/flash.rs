//! Flash medium abstractions
//!
//! Provides the trait for the raw non-volatile medium that the block store
//! is built on. The medium has no notion of blocks - only byte addresses,
//! page-granular erase, and the NOR programming rule.

/// Value of an erased flash byte (all bits set)
pub const ERASED: u8 = 0xFF;

/// Errors reported by a flash medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediumError {
    /// Address or length falls outside the medium
    OutOfBounds,
    /// Program would have to set a cleared bit; the target was not erased
    NotErased,
    /// The silicon reported an erase or program failure
    Device,
}

/// Raw flash medium
///
/// Programming can only clear bits, never set them. A page must be erased
/// (every byte back to [`ERASED`]) before any part of it is reprogrammed;
/// callers that violate this get [`MediumError::NotErased`].
///
/// Erase and program block the calling thread for a hardware-determined
/// duration, on the order of milliseconds per page. Reads are always safe.
pub trait FlashMedium {
    /// Erase `[from, to)` back to the all-ones state
    ///
    /// Both bounds must be aligned to the medium's erase page size.
    /// Blocks until the erase completes.
    fn erase(&mut self, from: u32, to: u32) -> Result<(), MediumError>;

    /// Program previously erased bytes starting at `addr`
    ///
    /// Blocks until the program completes.
    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), MediumError>;

    /// Read exactly `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), MediumError>;
}
