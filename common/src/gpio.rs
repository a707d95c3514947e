//! Convenience GPIO operations on top of the socket commands.
//!
//! Every operation accepts [`PIN_IGNORE`] as GPIO number and then succeeds
//! without talking to the daemon, so pin tables can leave a signal
//! unconnected.

use std::convert::TryFrom;

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::board::PIN_IGNORE;
use crate::hal::gpio::{GpioMode, GpioPin, Pull};
use crate::hal::{PiError, PiResult};
use crate::protocol::commands::*;
use crate::protocol::outputs::{gpio_bit, MAX_GPIO, MAX_USER_GPIO};
use crate::protocol::scratch;
use crate::protocol::{CommandChannel, Pigpiod};

/// Highest PWM duty cycle value the daemon takes with a custom range.
pub const MAX_PWM_VALUE: u32 = 40_000;
pub const MIN_SERVO_PULSE: u32 = 500;
pub const MAX_SERVO_PULSE: u32 = 2_500;

/// Record a command that is answered without I/O.
fn settle<T>(cmd: u32, p1: u32, p2: u32, result: PiResult<T>) -> PiResult<T> {
    scratch::begin(cmd, p1, p2, 0);
    result
}

impl Pigpiod {
    /// Set the function of `gpio`.
    ///
    /// Input releases the GPIO from the output tracking, alternate
    /// functions count as output.
    pub fn set_mode(&self, gpio: u32, mode: GpioMode) -> PiResult<()> {
        self.command(PI_CMD_MODES, gpio, mode.code())?;
        match mode {
            GpioMode::Input => self.outputs().clear(gpio),
            GpioMode::Output => {}
            _ => self.outputs().mark(gpio),
        }
        Ok(())
    }

    pub fn get_mode(&self, gpio: u32) -> PiResult<GpioMode> {
        if gpio == PIN_IGNORE {
            return settle(PI_CMD_MODEG, gpio, 0, Ok(GpioMode::Input));
        }
        let code = self.command(PI_CMD_MODEG, gpio, 0)?;
        GpioMode::try_from(code)
    }

    /// Set the pull resistor of `gpio`, 0..=53. `Keep` and `Default` do
    /// nothing.
    pub fn set_pull(&self, gpio: u32, pull: Pull) -> PiResult<()> {
        if gpio == PIN_IGNORE || (pull.is_noop() && gpio <= MAX_GPIO) {
            return settle(PI_CMD_PUD, gpio, pull.code(), Ok(()));
        }
        if gpio > MAX_GPIO {
            return settle(PI_CMD_PUD, gpio, pull.code(), Err(PiError::BadGpio));
        }
        self.command(PI_CMD_PUD, gpio, pull.code()).map(|_| ())
    }

    /// Set the drive strength of a pad (0: GPIO 0..27, 1: 28..45,
    /// 2: 46..53) to `milliamps`, 1..=16.
    pub fn set_pad_strength(&self, pad: u32, milliamps: u32) -> PiResult<()> {
        if milliamps < 1 || milliamps > 16 {
            return settle(PI_CMD_PADS, pad, milliamps, Err(PiError::BadStrength));
        }
        self.command(PI_CMD_PADS, pad, milliamps).map(|_| ())
    }

    pub fn get_pad_strength(&self, pad: u32) -> PiResult<u32> {
        self.command(PI_CMD_PADG, pad, 0)
    }

    /// Make a bank 0 GPIO an output. Returns its bank mask bit.
    pub fn init_as_output(&self, gpio: u32) -> PiResult<u32> {
        if gpio == PIN_IGNORE {
            return settle(PI_CMD_MODES, gpio, GpioMode::Output.code(), Ok(0));
        }
        if gpio > MAX_USER_GPIO {
            return settle(PI_CMD_MODES, gpio, GpioMode::Output.code(), Err(PiError::BadUserGpio));
        }
        self.set_mode(gpio, GpioMode::Output)?;
        Ok(gpio_bit(gpio))
    }

    /// Make `gpio` an input, releasing it as output.
    pub fn init_as_input(&self, gpio: u32) -> PiResult<()> {
        if gpio > MAX_GPIO && gpio != PIN_IGNORE {
            return settle(PI_CMD_MODES, gpio, GpioMode::Input.code(), Err(PiError::BadGpio));
        }
        self.set_mode(gpio, GpioMode::Input)
    }

    /// Input for a switch to ground: input with pull-up.
    pub fn init_as_lo_input(&self, gpio: u32) -> PiResult<()> {
        self.init_as_input(gpio)?;
        self.set_pull(gpio, Pull::Up)
    }

    /// Input for a signal driven high when active: input with pull-down.
    pub fn init_as_hi_input(&self, gpio: u32) -> PiResult<()> {
        self.init_as_input(gpio)?;
        self.set_pull(gpio, Pull::Down)
    }

    /// Output, optionally set to `level` right away. The pull resistor is
    /// left alone.
    pub fn init_as_drive(&self, gpio: u32, level: Option<bool>) -> PiResult<()> {
        self.init_as_output(gpio)?;
        match level {
            Some(level) => self.set_output(gpio, level),
            None => Ok(()),
        }
    }

    /// Output with pull-up, so a broken wire shows when briefly switched
    /// to input.
    pub fn init_as_hi_drive(&self, gpio: u32, level: Option<bool>) -> PiResult<()> {
        self.init_as_output(gpio)?;
        self.set_pull(gpio, Pull::Up)?;
        match level {
            Some(level) => self.set_output(gpio, level),
            None => Ok(()),
        }
    }

    pub fn set_output(&self, gpio: u32, level: bool) -> PiResult<()> {
        self.command(PI_CMD_WRITE, gpio, level as u32).map(|_| ())
    }

    /// Set (or clear) all bank 0 outputs in `mask` at once.
    ///
    /// Every GPIO in `mask` must have been made an output through this
    /// connection, otherwise nothing is sent and the result is
    /// [`PiError::NotPermitted`].
    pub fn set_output_set(&self, mask: u32, level: bool) -> PiResult<()> {
        let cmd = if level { PI_CMD_BS1 } else { PI_CMD_BC1 };
        self.command(cmd, mask, 0).map(|_| ())
    }

    pub fn get_input(&self, gpio: u32) -> PiResult<bool> {
        Ok(self.command(PI_CMD_READ, gpio, 0)? != 0)
    }

    /// Set the PWM duty cycle, 0..=40000 (0..=255 in the default range).
    pub fn set_pwm_cycle(&self, gpio: u32, value: u32) -> PiResult<()> {
        if gpio != PIN_IGNORE {
            if gpio > MAX_USER_GPIO {
                return settle(PI_CMD_PWM, gpio, value, Err(PiError::BadUserGpio));
            }
            if value > MAX_PWM_VALUE {
                return settle(PI_CMD_PWM, gpio, value, Err(PiError::BadDutycycle));
            }
        }
        self.command(PI_CMD_PWM, gpio, value).map(|_| ())
    }

    pub fn get_pwm_cycle(&self, gpio: u32) -> PiResult<u32> {
        self.user_gpio_query(PI_CMD_GDC, gpio)
    }

    /// Set the PWM frequency in Hz. Returns the frequency the daemon chose.
    pub fn set_pwm_frequency(&self, gpio: u32, hertz: u32) -> PiResult<u32> {
        if gpio > MAX_USER_GPIO && gpio != PIN_IGNORE {
            return settle(PI_CMD_PFS, gpio, hertz, Err(PiError::BadUserGpio));
        }
        self.command(PI_CMD_PFS, gpio, hertz)
    }

    pub fn get_pwm_frequency(&self, gpio: u32) -> PiResult<u32> {
        self.user_gpio_query(PI_CMD_PFG, gpio)
    }

    /// Servo pulse width in µs: 0 (off) or 500..=2500.
    pub fn set_servo_pos(&self, gpio: u32, pulse_width: u32) -> PiResult<()> {
        if gpio != PIN_IGNORE {
            if gpio > MAX_USER_GPIO {
                return settle(PI_CMD_SERVO, gpio, pulse_width, Err(PiError::BadUserGpio));
            }
            if pulse_width != 0 && (pulse_width < MIN_SERVO_PULSE || pulse_width > MAX_SERVO_PULSE) {
                return settle(PI_CMD_SERVO, gpio, pulse_width, Err(PiError::BadPulsewidth));
            }
        }
        self.command(PI_CMD_SERVO, gpio, pulse_width).map(|_| ())
    }

    pub fn get_servo_pw(&self, gpio: u32) -> PiResult<u32> {
        self.user_gpio_query(PI_CMD_GPW, gpio)
    }

    fn user_gpio_query(&self, cmd: u32, gpio: u32) -> PiResult<u32> {
        if gpio > MAX_USER_GPIO && gpio != PIN_IGNORE {
            return settle(cmd, gpio, 0, Err(PiError::BadUserGpio));
        }
        self.command(cmd, gpio, 0)
    }

    /// Levels of GPIO 0..=31.
    pub fn read_bank(&self) -> PiResult<u32> {
        self.command(PI_CMD_BR1, 0, 0)
    }

    pub fn hardware_revision(&self) -> PiResult<u32> {
        self.command(PI_CMD_HWVER, 0, 0)
    }

    pub fn pigpio_version(&self) -> PiResult<u32> {
        self.command(PI_CMD_PIGPV, 0, 0)
    }

    /// Daemon's microsecond tick, wrapping every 72 minutes.
    pub fn tick(&self) -> PiResult<u32> {
        self.command(PI_CMD_TICK, 0, 0)
    }

    pub fn pin(&self, gpio: u32) -> RemotePin<'_> {
        RemotePin { pi: self, gpio }
    }
}

/// One GPIO of a [`Pigpiod`], usable with `embedded-hal` drivers.
#[derive(Clone, Copy)]
pub struct RemotePin<'a> {
    pi: &'a Pigpiod,
    gpio: u32,
}

impl<'a> RemotePin<'a> {
    pub fn into_output(self) -> PiResult<Self> {
        self.pi.init_as_output(self.gpio)?;
        Ok(self)
    }

    pub fn into_input(self) -> PiResult<Self> {
        self.pi.init_as_input(self.gpio)?;
        Ok(self)
    }
}

impl<'a> GpioPin for RemotePin<'a> {
    fn gpio(&self) -> u32 {
        self.gpio
    }

    fn mode(&self) -> PiResult<GpioMode> {
        self.pi.get_mode(self.gpio)
    }

    fn set_mode(&mut self, mode: GpioMode) -> PiResult<()> {
        self.pi.set_mode(self.gpio, mode)
    }

    fn set_output(&mut self, value: bool) -> PiResult<()> {
        self.pi.set_output(self.gpio, value)
    }

    fn get_input(&self) -> PiResult<bool> {
        self.pi.get_input(self.gpio)
    }
}

impl<'a> OutputPin for RemotePin<'a> {
    type Error = PiError;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pi.set_output(self.gpio, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pi.set_output(self.gpio, true)
    }
}

impl<'a> InputPin for RemotePin<'a> {
    type Error = PiError;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.pi.get_input(self.gpio)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.pi.get_input(self.gpio).map(|level| !level)
    }
}
