//! Client for the pigpiod socket interface.
//!
//! [`Pigpiod`] is one connection to the daemon. It speaks the raw command
//! protocol through [`CommandChannel`] and adds the usual GPIO operations
//! on top, keeping track of the GPIOs it made outputs so they can be
//! released again on shutdown.

pub mod board;
pub mod config;
pub mod diagnostics;
pub mod gpio;
pub mod hal;
pub mod protocol;
pub mod timing;

pub use crate::config::Device;
pub use crate::gpio::RemotePin;
pub use crate::hal::{PiError, PiResult};
pub use crate::protocol::{CommandChannel, Pigpiod};
