pub mod channels;
pub mod commands;
pub mod frame;
pub mod outputs;
pub mod scratch;

pub use self::channels::{CommandChannel, Pigpiod, Session};
pub use self::frame::CommandHeader;
