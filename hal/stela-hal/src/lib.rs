//! Stela Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs (RP2040, etc.). This enables the storage core and
//! the shell to run unchanged on different hardware platforms - and, with
//! the `sim` feature, on the host for deterministic testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (stela-firmware, tests)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stela-core (storage + file layer)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stela-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  stela-hal-   │       │   SimFlash    │
//! │    rp2040     │       │ (sim feature) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::FlashMedium`] - Raw erase/program/read non-volatile medium
//! - [`console::TextSink`] - Human-readable text output

#![no_std]
#![deny(unsafe_code)]

pub mod console;
pub mod flash;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export key traits at crate root for convenience
pub use console::TextSink;
pub use flash::{FlashMedium, MediumError, ERASED};
