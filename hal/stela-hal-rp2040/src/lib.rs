//! RP2040-specific HAL for the Stela workstation firmware
//!
//! Provides the RP2040 implementation of the shared `stela-hal` traits:
//!
//! - Flash medium driver over the chip's XIP flash
//!   (implements `stela_hal::FlashMedium`)
//! - Partition constants for the block storage region

#![no_std]

pub mod flash;

// Re-export shared traits from stela-hal for convenience
pub use stela_hal::{FlashMedium, MediumError};
