//! Inter-task communication channels
//!
//! Defines the static bounded channels between the console tasks, the
//! shell, and the language runtime. Uses embassy-sync primitives for
//! safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;

/// Longest console line the shell accepts
pub const LINE_LEN: usize = 128;

/// One complete input line
pub type Line = String<LINE_LEN>;

/// One chunk of console output
pub type OutChunk = String<LINE_LEN>;

/// Channel capacity for input lines from the console
const LINE_CHANNEL_SIZE: usize = 4;

/// Channel capacity for output text to the console
const OUT_CHANNEL_SIZE: usize = 16;

/// Channel capacity for source lines handed to the language runtime
const SOURCE_CHANNEL_SIZE: usize = 16;

/// Complete lines from the console to the shell
pub static LINE_CHANNEL: Channel<CriticalSectionRawMutex, Line, LINE_CHANNEL_SIZE> =
    Channel::new();

/// Text from the shell and the file layer to the console
pub static OUT_CHANNEL: Channel<CriticalSectionRawMutex, OutChunk, OUT_CHANNEL_SIZE> =
    Channel::new();

/// Source text for the language runtime's text interpreter
pub static SOURCE_CHANNEL: Channel<CriticalSectionRawMutex, Line, SOURCE_CHANNEL_SIZE> =
    Channel::new();
