//! Board-agnostic storage core for the Stela workstation firmware
//!
//! This crate contains everything between the raw flash medium and the
//! shell, with no dependency on specific hardware:
//!
//! - Flash region geometry and its invariants
//! - Page merge cache (block writes vs. page-granular erase)
//! - Bounds-checked block store
//! - Hierarchical directory/file layer
//! - The language runtime's text-entry seam
//!
//! All of it runs on the host against the simulated medium from
//! `stela-hal`'s `sim` feature.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod fs;
pub mod geometry;
pub mod store;
pub mod traits;

pub use fs::{Dirfs, FsError};
pub use geometry::{FlashGeometry, GeometryError, BLOCK_SIZE};
pub use store::{BlockStore, StorageError};
pub use traits::Evaluator;
