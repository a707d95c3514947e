//! Bookkeeping of the bank 0 GPIOs this client drives.

use std::sync::atomic::{AtomicU32, Ordering};

use log::info;

use crate::hal::gpio::GpioMode;
use crate::hal::{PiError, PiResult};
use crate::protocol::channels::{Pigpiod, Session};
use crate::protocol::commands::PI_CMD_MODES;

/// Highest GPIO number of bank 0.
pub const MAX_USER_GPIO: u32 = 31;

/// Highest GPIO number the daemon accepts.
pub const MAX_GPIO: u32 = 53;

/// Bank mask bit of `gpio`, 0 for GPIOs outside bank 0.
pub fn gpio_bit(gpio: u32) -> u32 {
    if gpio <= MAX_USER_GPIO {
        1 << gpio
    } else {
        0
    }
}

/// Set bits of a bank mask, lowest GPIO first.
#[derive(Debug, Clone)]
pub struct BankIter {
    mask: u32,
}

impl BankIter {
    pub fn new(mask: u32) -> Self {
        BankIter { mask }
    }
}

impl Iterator for BankIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.mask == 0 {
            return None;
        }
        let gpio = self.mask.trailing_zeros();
        self.mask &= self.mask - 1;
        Some(gpio)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.mask.count_ones() as usize;
        (n, Some(n))
    }
}

/// GPIOs 0..=31 set to a non-input mode through this connection.
///
/// A cache, not the truth: another client of the same daemon may change
/// modes behind our back.
#[derive(Debug, Default)]
pub struct OutputMask(AtomicU32);

impl OutputMask {
    pub fn new() -> Self {
        OutputMask(AtomicU32::new(0))
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// True if every bit of `mask` is tracked.
    pub fn covers(&self, mask: u32) -> bool {
        self.get() & mask == mask
    }

    pub(crate) fn mark(&self, gpio: u32) {
        self.0.fetch_or(gpio_bit(gpio), Ordering::AcqRel);
    }

    pub(crate) fn clear(&self, gpio: u32) {
        self.0.fetch_and(!gpio_bit(gpio), Ordering::AcqRel);
    }
}

impl<'a> Session<'a> {
    /// Run `f` for each set bit of `mask`, ascending. Stops at the first
    /// error.
    pub fn for_each_in_bank<F>(&mut self, mask: u32, mut f: F) -> PiResult<()>
    where
        F: FnMut(&mut Session<'a>, u32) -> PiResult<()>,
    {
        for gpio in BankIter::new(mask) {
            f(self, gpio)?;
        }
        Ok(())
    }
}

impl Pigpiod {
    /// Run `f` for each set bit of `mask`, ascending, inside one exclusive
    /// section. Stops at the first error.
    pub fn for_each_in_bank<F>(&self, mask: u32, f: F) -> PiResult<()>
    where
        F: for<'s> FnMut(&mut Session<'s>, u32) -> PiResult<()>,
    {
        if mask == 0 {
            return Ok(());
        }
        self.session()?.for_each_in_bank(mask, f)
    }

    /// Switch every tracked output back to input.
    ///
    /// The tracker is read inside the exclusive section, so outputs set by
    /// other threads before the release are released too. Returns the mask
    /// of outputs that were tracked.
    pub fn release_outputs(&self) -> PiResult<u32> {
        let board = self.device().board;
        let mut session = match self.session() {
            Ok(session) => session,
            Err(PiError::NotConnected) if self.outputs().get() == 0 => return Ok(0),
            Err(err) => return Err(err),
        };
        let were_out = session.outputs().get();
        session.for_each_in_bank(were_out, |session, gpio| {
            session.command(PI_CMD_MODES, gpio, GpioMode::Input.code())?;
            session.outputs().clear(gpio);
            info!("released GPIO{:02} (pin {:02}) to input", gpio, board.pin_for_gpio(gpio).unwrap_or(0));
            Ok(())
        })?;
        Ok(were_out)
    }

    /// Set the GPIOs listed as outputs.
    ///
    /// Only bank 0 may drive, so entries above 31 (the ignore and none
    /// sentinels among them) are skipped. Returns the bank mask of the
    /// GPIOs set.
    pub fn init_as_outputs(&self, gpios: &[u32]) -> PiResult<u32> {
        let mut mask = 0;
        for &gpio in gpios.iter().filter(|&&gpio| gpio <= MAX_USER_GPIO) {
            mask |= self.init_as_output(gpio)?;
        }
        Ok(mask)
    }

    /// Set the GPIOs listed as inputs, releasing them as outputs.
    ///
    /// Entries above 53 are skipped.
    pub fn init_as_inputs(&self, gpios: &[u32]) -> PiResult<()> {
        for &gpio in gpios.iter().filter(|&&gpio| gpio <= MAX_GPIO) {
            self.init_as_input(gpio)?;
        }
        Ok(())
    }
}
