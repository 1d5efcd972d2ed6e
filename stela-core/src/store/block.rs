//! Bounds-checked block interface
//!
//! The surface the file layer and the runtime's block words talk to.
//! Indexes are validated against the region capacity and buffers against
//! the block size before anything reaches the merge cache.

use stela_hal::{FlashMedium, ERASED};

use super::page::PageBuffer;
use super::StorageError;
use crate::geometry::{FlashGeometry, BLOCK_SIZE};

/// Block-addressable view of the flash region
///
/// A write is visible to subsequent reads in the same session
/// immediately; durability across power loss is guaranteed only once
/// [`flush`](Self::flush) completes, whether called explicitly or
/// triggered implicitly by a write that opens a different page.
pub struct BlockStore<M: FlashMedium> {
    pages: PageBuffer<M>,
}

impl<M: FlashMedium> BlockStore<M> {
    /// Create a store over a validated region geometry
    pub fn new(medium: M, geometry: FlashGeometry) -> Self {
        Self {
            pages: PageBuffer::new(medium, geometry),
        }
    }

    /// Number of addressable blocks
    pub fn block_count(&self) -> u32 {
        self.pages.geometry().block_count()
    }

    /// True when unflushed writes are pending
    pub fn dirty(&self) -> bool {
        self.pages.dirty()
    }

    /// Read one block into `buf`
    pub fn read(&mut self, index: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        self.check(index, buf.len())?;
        self.pages.read_block(index, buf)
    }

    /// Write one block from `data`
    pub fn write(&mut self, index: u32, data: &[u8]) -> Result<(), StorageError> {
        self.check(index, data.len())?;
        self.pages.write_block(index, data)
    }

    /// Logically clear `count` blocks starting at `start`
    ///
    /// Writes the all-ones pattern through the normal merge path - never
    /// a raw page erase, which would destroy live sibling blocks sharing
    /// the page. Clearing an already-clear block is a no-op success.
    pub fn erase_range(&mut self, start: u32, count: u32) -> Result<(), StorageError> {
        let end = start
            .checked_add(count)
            .ok_or(StorageError::OutOfRange)?;
        if end > self.block_count() {
            return Err(StorageError::OutOfRange);
        }
        let blank = [ERASED; BLOCK_SIZE];
        for index in start..end {
            self.pages.write_block(index, &blank)?;
        }
        Ok(())
    }

    /// Commit any pending writes to the medium
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.pages.flush()
    }

    /// Get the raw medium for low-level access
    pub fn medium_mut(&mut self) -> &mut M {
        self.pages.medium_mut()
    }

    /// Consume the store and return the underlying medium
    pub fn into_medium(self) -> M {
        self.pages.into_medium()
    }

    fn check(&self, index: u32, len: usize) -> Result<(), StorageError> {
        if index >= self.block_count() {
            return Err(StorageError::OutOfRange);
        }
        if len != BLOCK_SIZE {
            return Err(StorageError::SizeMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stela_hal::sim::SimFlash;

    const PAGE: usize = 4096;
    const REGION: usize = 4 * PAGE;
    const BLOCKS: u32 = (REGION / BLOCK_SIZE) as u32;
    const BLOCKS_PER_PAGE: u32 = (PAGE / BLOCK_SIZE) as u32;

    type Medium = SimFlash<REGION, PAGE>;

    fn geometry() -> FlashGeometry {
        FlashGeometry::new(0, REGION as u32, PAGE as u32).unwrap()
    }

    fn store() -> BlockStore<Medium> {
        BlockStore::new(Medium::new(), geometry())
    }

    fn pattern(seed: u8) -> [u8; BLOCK_SIZE] {
        core::array::from_fn(|i| seed ^ i as u8)
    }

    #[test]
    fn test_read_your_writes_before_flush() {
        let mut store = store();
        store.write(3, &pattern(0x5A)).unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        store.read(3, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x5A));
        // nothing committed yet
        assert_eq!(store.medium_mut().program_count, 0);
        assert!(store.dirty());
    }

    #[test]
    fn test_round_trip_survives_restart() {
        let mut store = store();
        store.write(7, &pattern(0xC3)).unwrap();
        store.flush().unwrap();

        // discard all RAM state, keep the medium
        let mut store = BlockStore::new(store.into_medium(), geometry());
        let mut buf = [0u8; BLOCK_SIZE];
        store.read(7, &mut buf).unwrap();
        assert_eq!(buf, pattern(0xC3));
    }

    #[test]
    fn test_neighbor_preserved_across_rewrite() {
        let mut store = store();
        // blocks 1 and 2 share page 0
        store.write(1, &pattern(0x11)).unwrap();
        store.flush().unwrap();

        store.write(2, &pattern(0x22)).unwrap();
        store.flush().unwrap();

        let mut store = BlockStore::new(store.into_medium(), geometry());
        let mut buf = [0u8; BLOCK_SIZE];
        store.read(1, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x11));
        store.read(2, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x22));
    }

    #[test]
    fn test_bounds_rejected_without_flash_traffic() {
        let mut store = store();
        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(store.read(BLOCKS, &mut buf), Err(StorageError::OutOfRange));
        assert_eq!(
            store.write(BLOCKS, &pattern(0)),
            Err(StorageError::OutOfRange)
        );
        assert_eq!(
            store.erase_range(BLOCKS - 1, 2),
            Err(StorageError::OutOfRange)
        );
        store.flush().unwrap();
        assert_eq!(store.medium_mut().erase_count, 0);
        assert_eq!(store.medium_mut().program_count, 0);
    }

    #[test]
    fn test_wrong_buffer_length_rejected() {
        let mut store = store();
        let mut short = [0u8; BLOCK_SIZE - 1];
        assert_eq!(store.read(0, &mut short), Err(StorageError::SizeMismatch));
        assert_eq!(store.write(0, &short), Err(StorageError::SizeMismatch));
    }

    #[test]
    fn test_page_switch_flushes_previous_page() {
        let mut store = store();
        store.write(0, &pattern(0xAA)).unwrap();
        // crossing into page 1 must commit page 0 first
        store.write(BLOCKS_PER_PAGE, &pattern(0xBB)).unwrap();

        assert_eq!(store.medium_mut().erase_count, 1);
        assert_eq!(store.medium_mut().program_count, 1);

        // page 0 content is on the medium even though page 1 is still open
        let mut buf = [0u8; BLOCK_SIZE];
        store.medium_mut().read(0, &mut buf).unwrap();
        assert_eq!(buf, pattern(0xAA));
    }

    #[test]
    fn test_erase_range_is_idempotent() {
        let mut store = store();
        store.write(4, &pattern(0x44)).unwrap();
        store.write(5, &pattern(0x55)).unwrap();
        store.flush().unwrap();

        store.erase_range(4, 1).unwrap();
        store.flush().unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        store.read(4, &mut buf).unwrap();
        assert_eq!(buf, [ERASED; BLOCK_SIZE]);
        // the sibling survives the logical clear
        store.read(5, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x55));

        // repeating the clear is a no-op success
        store.erase_range(4, 1).unwrap();
        store.flush().unwrap();
        store.read(4, &mut buf).unwrap();
        assert_eq!(buf, [ERASED; BLOCK_SIZE]);
    }

    #[test]
    fn test_flush_retries_once_on_device_failure() {
        let mut store = store();
        store.write(0, &pattern(0x77)).unwrap();
        store.medium_mut().fail_next_erases(1);
        store.flush().unwrap();
        assert!(!store.dirty());

        let mut store = BlockStore::new(store.into_medium(), geometry());
        let mut buf = [0u8; BLOCK_SIZE];
        store.read(0, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x77));
    }

    #[test]
    fn test_second_failure_is_fatal_but_retryable() {
        let mut store = store();
        store.write(0, &pattern(0x99)).unwrap();
        store.medium_mut().fail_next_erases(2);
        assert_eq!(store.flush(), Err(StorageError::Hardware));
        // dirty flag stays set so an explicit retry remains possible
        assert!(store.dirty());

        store.flush().unwrap();
        assert!(!store.dirty());
        let mut store = BlockStore::new(store.into_medium(), geometry());
        let mut buf = [0u8; BLOCK_SIZE];
        store.read(0, &mut buf).unwrap();
        assert_eq!(buf, pattern(0x99));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip_through_restart(
            index in 0..BLOCKS,
            data in prop::collection::vec(any::<u8>(), BLOCK_SIZE),
        ) {
            let mut store = store();
            store.write(index, &data).unwrap();
            store.flush().unwrap();

            let mut store = BlockStore::new(store.into_medium(), geometry());
            let mut buf = [0u8; BLOCK_SIZE];
            store.read(index, &mut buf).unwrap();
            prop_assert_eq!(&buf[..], &data[..]);
        }

        #[test]
        fn prop_neighbors_unaffected(
            block in 0..BLOCKS,
            offset in 1..BLOCKS_PER_PAGE,
            data in prop::collection::vec(any::<u8>(), BLOCK_SIZE),
        ) {
            // a distinct block in the same page
            let page_first = block / BLOCKS_PER_PAGE * BLOCKS_PER_PAGE;
            let sibling = page_first + (block - page_first + offset) % BLOCKS_PER_PAGE;
            prop_assume!(sibling != block);

            let mut store = store();
            store.write(sibling, &pattern(0x3C)).unwrap();
            store.flush().unwrap();

            store.write(block, &data).unwrap();
            let mut buf = [0u8; BLOCK_SIZE];
            store.read(sibling, &mut buf).unwrap();
            prop_assert_eq!(buf, pattern(0x3C));

            store.flush().unwrap();
            let mut store = BlockStore::new(store.into_medium(), geometry());
            store.read(sibling, &mut buf).unwrap();
            prop_assert_eq!(buf, pattern(0x3C));
        }
    }
}
