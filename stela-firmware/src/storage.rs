//! Shared, guarded access to the storage stack
//!
//! The page merge cache beneath the block store has no inherent thread
//! safety, and flash erase/program must never interleave. One mutex
//! wraps the whole file layer; every logical operation - the implicit
//! load/merge/erase/program sequence included - runs under a single
//! lock acquisition. The flush path executes from RAM-resident
//! embassy-rp code, never from the region being erased.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;

use stela_core::Dirfs;
use stela_hal_rp2040::flash::Rp2040FlashMedium;

/// The medium the block store runs on
pub type StoreMedium = Rp2040FlashMedium<'static>;

/// The guarded file layer shared by all tasks
pub type SharedDirfs = Mutex<CriticalSectionRawMutex, Dirfs<StoreMedium>>;

/// Storage singleton, initialized once during bring-up
pub static DIRFS: StaticCell<SharedDirfs> = StaticCell::new();
