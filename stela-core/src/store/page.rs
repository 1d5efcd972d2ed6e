//! Page merge cache
//!
//! Erase works on whole pages; writes work on single blocks. A block
//! write is merged into a RAM image of its full page, seeded from flash
//! so sibling blocks survive the eventual erase+reprogram. At most one
//! page is open at a time; writing into a different page flushes the
//! current one first.

use stela_hal::{FlashMedium, MediumError};

use super::StorageError;
use crate::geometry::{FlashGeometry, BLOCK_SIZE, MAX_PAGE_SIZE};

struct OpenPage {
    index: u32,
    image: [u8; MAX_PAGE_SIZE],
    dirty: bool,
}

pub(super) struct PageBuffer<M: FlashMedium> {
    medium: M,
    geometry: FlashGeometry,
    open: Option<OpenPage>,
}

impl<M: FlashMedium> PageBuffer<M> {
    pub(super) fn new(medium: M, geometry: FlashGeometry) -> Self {
        Self {
            medium,
            geometry,
            open: None,
        }
    }

    pub(super) fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    pub(super) fn dirty(&self) -> bool {
        self.open.as_ref().is_some_and(|page| page.dirty)
    }

    pub(super) fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    pub(super) fn into_medium(self) -> M {
        self.medium
    }

    /// Read one block, served from the open page image when it covers the
    /// index (read-your-writes before durability), else from flash
    pub(super) fn read_block(&mut self, index: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let page = self.geometry.page_of_block(index);
        if let Some(open) = &self.open {
            if open.index == page {
                let offset = self.geometry.offset_in_page(index);
                buf.copy_from_slice(&open.image[offset..offset + BLOCK_SIZE]);
                return Ok(());
            }
        }
        self.medium
            .read(self.geometry.block_addr(index), buf)
            .map_err(StorageError::from)
    }

    /// Merge one block into its page image, opening the page as needed
    pub(super) fn write_block(&mut self, index: u32, data: &[u8]) -> Result<(), StorageError> {
        let page = self.geometry.page_of_block(index);
        let offset = self.geometry.offset_in_page(index);
        let open = self.open_page(page)?;
        open.image[offset..offset + BLOCK_SIZE].copy_from_slice(data);
        open.dirty = true;
        Ok(())
    }

    /// Commit the open page: erase, then reprogram the merged image
    ///
    /// A clean or absent page is a no-op. On a device failure the
    /// erase+program cycle is retried once; a second failure means
    /// exhausted endurance rather than a transient fault, and the dirty
    /// flag stays set so an explicit retry remains possible.
    pub(super) fn flush(&mut self) -> Result<(), StorageError> {
        let Self {
            medium,
            geometry,
            open,
        } = self;
        let Some(open) = open.as_mut() else {
            return Ok(());
        };
        if !open.dirty {
            return Ok(());
        }
        let base = geometry.page_base(open.index);
        let end = base + geometry.page_size();
        let image = &open.image[..geometry.page_size() as usize];
        match program_page(medium, base, end, image) {
            Ok(()) => {}
            Err(MediumError::Device) => {
                program_page(medium, base, end, image).map_err(StorageError::from)?;
            }
            Err(e) => return Err(e.into()),
        }
        open.dirty = false;
        Ok(())
    }

    /// Make `page` the open page, flushing any dirty predecessor and
    /// seeding the image from flash so sibling blocks are preserved
    fn open_page(&mut self, page: u32) -> Result<&mut OpenPage, StorageError> {
        if self.open.as_ref().map(|open| open.index) != Some(page) {
            self.flush()?;
            let mut open = OpenPage {
                index: page,
                image: [0; MAX_PAGE_SIZE],
                dirty: false,
            };
            let size = self.geometry.page_size() as usize;
            self.medium
                .read(self.geometry.page_base(page), &mut open.image[..size])
                .map_err(StorageError::from)?;
            self.open = Some(open);
        }
        match self.open.as_mut() {
            Some(open) => Ok(open),
            // just installed above
            None => Err(StorageError::Hardware),
        }
    }
}

fn program_page<M: FlashMedium>(
    medium: &mut M,
    base: u32,
    end: u32,
    image: &[u8],
) -> Result<(), MediumError> {
    medium.erase(base, end)?;
    medium.program(base, image)
}
