//! Directory navigation and file access
//!
//! All operations resolve names against the current directory only; there
//! is no path parsing beyond the `..` parent hop. Failed navigation never
//! moves the cursor.

use heapless::{String, Vec};
use stela_hal::{FlashMedium, TextSink, ERASED};

use super::layout::{
    Record, RecordKind, Superblock, KIND_OFFSET, NAME_LEN, RECORDS_PER_BLOCK, RECORD_SIZE,
    SUPERBLOCK_INDEX,
};
use super::FsError;
use crate::geometry::BLOCK_SIZE;
use crate::store::BlockStore;
use crate::traits::Evaluator;

/// Maximum directory nesting when rendering a path
const MAX_DEPTH: usize = 8;

/// Extent length handed to a newly created directory
const DIR_EXTENT_BLOCKS: u32 = 1;

/// The directory/file layer
///
/// Owns the current-directory cursor and the block store it reads
/// through. The cursor is the first block of the current directory's
/// extent; it starts at the root and moves only on a successful `cd`.
pub struct Dirfs<M: FlashMedium> {
    store: BlockStore<M>,
    cwd: u32,
}

impl<M: FlashMedium> Dirfs<M> {
    /// Write an empty filesystem onto the store and mount it
    pub fn format(mut store: BlockStore<M>) -> Result<Self, FsError> {
        if store.block_count() < 1 + DIR_EXTENT_BLOCKS {
            return Err(FsError::NoSpace);
        }
        let root_first = SUPERBLOCK_INDEX + 1;

        // root directory: header names the empty string, parent is itself
        let mut block = [ERASED; BLOCK_SIZE];
        let header = Record::new("", RecordKind::Header, root_first, DIR_EXTENT_BLOCKS)?;
        header.encode(&mut block[..RECORD_SIZE]);
        store.write(root_first, &block)?;

        let sb = Superblock {
            root_first,
            root_blocks: DIR_EXTENT_BLOCKS,
            alloc_cursor: root_first + DIR_EXTENT_BLOCKS,
        };
        Self::write_superblock(&mut store, &sb)?;
        store.flush()?;
        Ok(Self {
            store,
            cwd: root_first,
        })
    }

    /// Mount an existing filesystem, cursor at the root
    pub fn mount(mut store: BlockStore<M>) -> Result<Self, FsError> {
        let sb = Self::read_superblock(&mut store)?;
        Ok(Self {
            store,
            cwd: sb.root_first,
        })
    }

    /// Mount, or format first if no valid superblock is present
    pub fn mount_or_format(mut store: BlockStore<M>) -> Result<Self, FsError> {
        match Self::read_superblock(&mut store) {
            Ok(sb) => Ok(Self {
                store,
                cwd: sb.root_first,
            }),
            Err(FsError::Corrupted) => Self::format(store),
            Err(e) => Err(e),
        }
    }

    /// Direct access to the block store, for the runtime's block words
    pub fn store_mut(&mut self) -> &mut BlockStore<M> {
        &mut self.store
    }

    /// Consume the layer and return the block store
    pub fn into_store(self) -> BlockStore<M> {
        self.store
    }

    /// Print the path from the root to the current directory
    pub fn pwd(&mut self, sink: &mut dyn TextSink) -> Result<(), FsError> {
        let mut names: Vec<String<NAME_LEN>, MAX_DEPTH> = Vec::new();
        let mut at = self.cwd;
        loop {
            let header = self.dir_header(at)?;
            if header.first_block == at {
                // the root is its own parent
                break;
            }
            names
                .push(header.name)
                .map_err(|_| FsError::Corrupted)?;
            at = header.first_block;
        }
        if names.is_empty() {
            sink.write_str("/");
        } else {
            for name in names.iter().rev() {
                sink.write_str("/");
                sink.write_str(name);
            }
        }
        sink.write_str("\n");
        Ok(())
    }

    /// List live entries of the current directory in on-disk order
    pub fn ls(&mut self, sink: &mut dyn TextSink) -> Result<(), FsError> {
        let cwd = self.cwd;
        self.scan(cwd, |_, _, record| -> Option<()> {
            sink.write_str(record.name.as_str());
            if record.kind == RecordKind::Directory {
                sink.write_str("/");
            }
            sink.write_str("\n");
            None
        })?;
        Ok(())
    }

    /// Enter a subdirectory (or the parent, with `..`)
    ///
    /// On any failure the cursor is left where it was - there is no
    /// partial navigation.
    pub fn cd(&mut self, name: &str) -> Result<(), FsError> {
        if name == ".." {
            let header = self.dir_header(self.cwd)?;
            self.cwd = header.first_block;
            return Ok(());
        }
        let (_, _, record) = self.lookup(name)?;
        if record.kind != RecordKind::Directory {
            return Err(FsError::NotADirectory);
        }
        self.cwd = record.first_block;
        Ok(())
    }

    /// Stream a file's text to the output sink
    pub fn cat(&mut self, name: &str, sink: &mut dyn TextSink) -> Result<(), FsError> {
        let record = self.lookup_file(name)?;
        self.stream_file(&record, &mut |text| sink.write_str(text))
    }

    /// Feed an in-memory byte range to the language runtime
    ///
    /// The bytes need not originate from the block store.
    pub fn include(&mut self, source: &[u8], evaluator: &mut dyn Evaluator) -> Result<(), FsError> {
        let text = core::str::from_utf8(source).map_err(|_| FsError::NotText)?;
        evaluator.evaluate(text);
        Ok(())
    }

    /// Feed a stored file to the language runtime
    ///
    /// Lookup failures propagate exactly as for [`cat`](Self::cat).
    pub fn include_file(
        &mut self,
        name: &str,
        evaluator: &mut dyn Evaluator,
    ) -> Result<(), FsError> {
        let record = self.lookup_file(name)?;
        self.stream_file(&record, &mut |text| evaluator.evaluate(text))
    }

    /// Create an empty subdirectory in the current directory
    pub fn mkdir(&mut self, name: &str) -> Result<(), FsError> {
        self.ensure_absent(name)?;
        let first = self.alloc(DIR_EXTENT_BLOCKS)?;
        // the extent may hold stale data from an earlier life
        self.store.erase_range(first, DIR_EXTENT_BLOCKS)?;

        let mut block = [ERASED; BLOCK_SIZE];
        let header = Record::new(name, RecordKind::Header, self.cwd, DIR_EXTENT_BLOCKS)?;
        header.encode(&mut block[..RECORD_SIZE]);
        self.store.write(first, &block)?;

        let entry = Record::new(name, RecordKind::Directory, first, DIR_EXTENT_BLOCKS)?;
        self.insert_record(&entry)?;
        self.store.flush()?;
        Ok(())
    }

    /// Create a text file in the current directory
    pub fn create_file(&mut self, name: &str, contents: &[u8]) -> Result<(), FsError> {
        self.ensure_absent(name)?;
        core::str::from_utf8(contents).map_err(|_| FsError::NotText)?;

        let count = (contents.len().max(1) as u32).div_ceil(BLOCK_SIZE as u32);
        let first = self.alloc(count)?;
        if contents.is_empty() {
            self.store.erase_range(first, 1)?;
        }
        for (i, chunk) in contents.chunks(BLOCK_SIZE).enumerate() {
            let mut block = [ERASED; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            self.store.write(first + i as u32, &block)?;
        }

        let entry = Record::new(name, RecordKind::File, first, count)?;
        self.insert_record(&entry)?;
        self.store.flush()?;
        Ok(())
    }

    /// Remove a file or an empty directory
    ///
    /// Removal programs the record's kind byte down to the tombstone
    /// value; the extent's blocks are never reclaimed.
    pub fn remove(&mut self, name: &str) -> Result<(), FsError> {
        let (block_index, slot, record) = self.lookup(name)?;
        if record.kind == RecordKind::Directory
            && self
                .scan(record.first_block, |_, _, _| Some(()))?
                .is_some()
        {
            return Err(FsError::DirectoryNotEmpty);
        }
        let mut block = [0u8; BLOCK_SIZE];
        self.store.read(block_index, &mut block)?;
        block[slot * RECORD_SIZE + KIND_OFFSET] = RecordKind::Tombstone.as_u8();
        self.store.write(block_index, &block)?;
        self.store.flush()?;
        Ok(())
    }

    /// Scan the live records of the directory extent starting at `first`,
    /// stopping early when `visit` returns `Some`
    fn scan<T, F>(&mut self, first: u32, mut visit: F) -> Result<Option<T>, FsError>
    where
        F: FnMut(u32, usize, &Record) -> Option<T>,
    {
        let header = self.dir_header(first)?;
        let mut block = [0u8; BLOCK_SIZE];
        for b in 0..header.block_count {
            let index = first + b;
            self.store.read(index, &mut block)?;
            let first_slot = if b == 0 { 1 } else { 0 };
            for slot in first_slot..RECORDS_PER_BLOCK {
                let bytes = &block[slot * RECORD_SIZE..(slot + 1) * RECORD_SIZE];
                match RecordKind::of(bytes) {
                    Some(RecordKind::Free) | Some(RecordKind::Tombstone) => continue,
                    Some(RecordKind::Header) | None => return Err(FsError::Corrupted),
                    Some(_) => {
                        let record = Record::decode(bytes)?;
                        if let Some(found) = visit(index, slot, &record) {
                            return Ok(Some(found));
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    fn lookup(&mut self, name: &str) -> Result<(u32, usize, Record), FsError> {
        let cwd = self.cwd;
        self.scan(cwd, |block, slot, record| {
            (record.name.as_str() == name).then(|| (block, slot, record.clone()))
        })?
        .ok_or(FsError::NotFound)
    }

    fn lookup_file(&mut self, name: &str) -> Result<Record, FsError> {
        let (_, _, record) = self.lookup(name)?;
        if record.kind != RecordKind::File {
            return Err(FsError::NotAFile);
        }
        Ok(record)
    }

    fn ensure_absent(&mut self, name: &str) -> Result<(), FsError> {
        match self.lookup(name) {
            Ok(_) => Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Decode text blocks of a file extent, trimming the erased tail
    fn stream_file(
        &mut self,
        record: &Record,
        emit: &mut dyn FnMut(&str),
    ) -> Result<(), FsError> {
        let mut block = [0u8; BLOCK_SIZE];
        for b in 0..record.block_count {
            self.store.read(record.first_block + b, &mut block)?;
            let len = block
                .iter()
                .position(|&byte| byte == ERASED)
                .unwrap_or(BLOCK_SIZE);
            let text = core::str::from_utf8(&block[..len]).map_err(|_| FsError::NotText)?;
            emit(text);
            if len < BLOCK_SIZE {
                break;
            }
        }
        Ok(())
    }

    /// Header record of the directory whose extent starts at `first`
    fn dir_header(&mut self, first: u32) -> Result<Record, FsError> {
        let mut block = [0u8; BLOCK_SIZE];
        self.store.read(first, &mut block)?;
        let record = Record::decode(&block[..RECORD_SIZE])?;
        if record.kind != RecordKind::Header {
            return Err(FsError::Corrupted);
        }
        Ok(record)
    }

    /// Hand out `count` fresh blocks and advance the superblock cursor
    fn alloc(&mut self, count: u32) -> Result<u32, FsError> {
        let mut sb = Self::read_superblock(&mut self.store)?;
        let first = sb.alloc_cursor;
        let end = first.checked_add(count).ok_or(FsError::NoSpace)?;
        if end > self.store.block_count() {
            return Err(FsError::NoSpace);
        }
        sb.alloc_cursor = end;
        Self::write_superblock(&mut self.store, &sb)?;
        Ok(first)
    }

    /// Write a record into the first free slot of the current directory
    fn insert_record(&mut self, record: &Record) -> Result<(), FsError> {
        let header = self.dir_header(self.cwd)?;
        let mut block = [0u8; BLOCK_SIZE];
        for b in 0..header.block_count {
            let index = self.cwd + b;
            self.store.read(index, &mut block)?;
            let first_slot = if b == 0 { 1 } else { 0 };
            for slot in first_slot..RECORDS_PER_BLOCK {
                let span = slot * RECORD_SIZE..(slot + 1) * RECORD_SIZE;
                if RecordKind::of(&block[span.clone()]) == Some(RecordKind::Free) {
                    record.encode(&mut block[span]);
                    self.store.write(index, &block)?;
                    return Ok(());
                }
            }
        }
        Err(FsError::DirectoryFull)
    }

    fn read_superblock(store: &mut BlockStore<M>) -> Result<Superblock, FsError> {
        let mut block = [0u8; BLOCK_SIZE];
        store.read(SUPERBLOCK_INDEX, &mut block)?;
        Superblock::decode(&block)
    }

    fn write_superblock(store: &mut BlockStore<M>, sb: &Superblock) -> Result<(), FsError> {
        let mut block = [ERASED; BLOCK_SIZE];
        sb.encode(&mut block);
        store.write(SUPERBLOCK_INDEX, &block)?;
        Ok(())
    }
}
