//! Shell task
//!
//! Runs the file words against the guarded storage stack. Each command
//! holds the storage lock for its full duration - implicit page flushes
//! included - and a failed command aborts only itself, never the loop.
//! Anything that is not a file word is handed to the language runtime.

use defmt::*;

use stela_core::{Evaluator, FsError, StorageError};
use stela_hal::TextSink;

use crate::channels::{Line, OutChunk, LINE_CHANNEL, OUT_CHANNEL, SOURCE_CHANNEL};
use crate::storage::SharedDirfs;

/// Text sink that forwards to the console output channel
///
/// Buffers up to one chunk at a time; a full channel drops text rather
/// than blocking the storage path.
struct ConsoleSink {
    chunk: OutChunk,
}

impl ConsoleSink {
    fn new() -> Self {
        Self {
            chunk: OutChunk::new(),
        }
    }

    fn flush(&mut self) {
        if self.chunk.is_empty() {
            return;
        }
        if OUT_CHANNEL.try_send(self.chunk.clone()).is_err() {
            warn!("Output channel full, dropping text");
        }
        self.chunk.clear();
    }
}

impl TextSink for ConsoleSink {
    fn write_str(&mut self, mut text: &str) {
        while !text.is_empty() {
            if self.chunk.push_str(text).is_ok() {
                return;
            }
            let room = self.chunk.capacity() - self.chunk.len();
            let take = utf8_boundary(text, room);
            if take == 0 {
                self.flush();
                continue;
            }
            let _ = self.chunk.push_str(&text[..take]);
            text = &text[take..];
            self.flush();
        }
    }
}

/// Largest index `<= at` that falls on a character boundary
fn utf8_boundary(text: &str, at: usize) -> usize {
    if at >= text.len() {
        return text.len();
    }
    let mut at = at;
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

/// Hands source text to the language runtime's input channel
struct RuntimeEntry;

impl Evaluator for RuntimeEntry {
    fn evaluate(&mut self, source: &str) {
        for piece in source.lines() {
            let mut rest = piece;
            while !rest.is_empty() {
                let take = utf8_boundary(rest, crate::channels::LINE_LEN);
                let mut line = Line::new();
                let _ = line.push_str(&rest[..take]);
                rest = &rest[take..];
                if SOURCE_CHANNEL.try_send(line).is_err() {
                    warn!("Runtime channel full, dropping source");
                    return;
                }
            }
        }
    }
}

/// Shell task - executes file words from the console
#[embassy_executor::task]
pub async fn shell_task(dirfs: &'static SharedDirfs) {
    info!("Shell task started");

    loop {
        let line = LINE_CHANNEL.receive().await;
        let mut sink = ConsoleSink::new();
        run_command(dirfs, line.as_str(), &mut sink).await;
        sink.flush();
    }
}

async fn run_command(dirfs: &'static SharedDirfs, line: &str, sink: &mut ConsoleSink) {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return;
    };
    let arg = words.next();

    // the guard spans the whole command, implicit flushes included
    let mut fs = dirfs.lock().await;
    let result = match (word, arg) {
        ("pwd", None) => fs.pwd(sink),
        ("ls", None) => fs.ls(sink),
        ("cd", Some(name)) => fs.cd(name),
        ("cat", Some(name)) => fs.cat(name, sink),
        ("include", Some(name)) => fs.include_file(name, &mut RuntimeEntry),
        ("mkdir", Some(name)) => fs.mkdir(name),
        ("rm", Some(name)) => fs.remove(name),
        ("flush", None) => fs.store_mut().flush().map_err(FsError::Storage),
        ("cd" | "cat" | "include" | "mkdir" | "rm", None) => {
            sink.write_str(word);
            sink.write_line(": missing name");
            Ok(())
        }
        _ => {
            // not a file word: the whole line belongs to the runtime
            drop(fs);
            RuntimeEntry.evaluate(line);
            return;
        }
    };

    if let Err(e) = result {
        warn!("Command failed: {:?}", e);
        sink.write_str(word);
        sink.write_str(": ");
        sink.write_line(describe(&e));
    }
}

fn describe(e: &FsError) -> &'static str {
    match e {
        FsError::NotFound => "not found",
        FsError::NotADirectory => "not a directory",
        FsError::NotAFile => "not a file",
        FsError::AlreadyExists => "already exists",
        FsError::NameTooLong => "name too long",
        FsError::DirectoryFull => "directory full",
        FsError::DirectoryNotEmpty => "directory not empty",
        FsError::NoSpace => "no space left",
        FsError::Corrupted => "corrupted filesystem",
        FsError::NotText => "not text",
        FsError::Storage(StorageError::OutOfRange) => "block out of range",
        FsError::Storage(StorageError::SizeMismatch) => "bad block size",
        FsError::Storage(StorageError::Program) => "flash program fault",
        FsError::Storage(StorageError::Hardware) => "flash hardware failure",
    }
}
