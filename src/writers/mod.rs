//! Writer implementations

pub mod buffer;
pub mod bus;
pub mod console;
pub mod daily_file;

pub use buffer::BufferWriter;
pub use bus::{BusWriter, NatsPublisher, Publisher};
pub use console::ConsoleWriter;
pub use daily_file::DailyFileWriter;

pub use crate::core::LogWriter;
