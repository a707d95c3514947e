use crate::hal::{PiError, PiResult};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// GPIO function select, numbered as the BCM283x hardware (and pigpiod) does.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum GpioMode {
    Input,
    Output,
    Alt0,
    Alt1,
    Alt2,
    Alt3,
    Alt4,
    Alt5,
}

impl GpioMode {
    pub fn code(self) -> u32 {
        match self {
            GpioMode::Input => 0,
            GpioMode::Output => 1,
            GpioMode::Alt0 => 4,
            GpioMode::Alt1 => 5,
            GpioMode::Alt2 => 6,
            GpioMode::Alt3 => 7,
            GpioMode::Alt4 => 3,
            GpioMode::Alt5 => 2,
        }
    }

    /// Anything but input drives the pin or hands it to a peripheral.
    pub fn is_input(self) -> bool {
        self == GpioMode::Input
    }
}

impl TryFrom<u32> for GpioMode {
    type Error = PiError;

    fn try_from(code: u32) -> PiResult<Self> {
        Ok(match code {
            0 => GpioMode::Input,
            1 => GpioMode::Output,
            2 => GpioMode::Alt5,
            3 => GpioMode::Alt4,
            4 => GpioMode::Alt0,
            5 => GpioMode::Alt1,
            6 => GpioMode::Alt2,
            7 => GpioMode::Alt3,
            _ => return Err(PiError::BadMode),
        })
    }
}

/// Pull resistor setting.
///
/// `Keep` and `Default` are accepted by the client but never sent: both mean
/// "leave the resistor as it is".
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Pull {
    Off,
    Down,
    Up,
    Keep,
    Default,
}

impl Pull {
    pub fn code(self) -> u32 {
        match self {
            Pull::Off => 0,
            Pull::Down => 1,
            Pull::Up => 2,
            Pull::Keep => 3,
            Pull::Default => 4,
        }
    }

    pub fn is_noop(self) -> bool {
        matches!(self, Pull::Keep | Pull::Default)
    }

    pub fn label(self) -> &'static str {
        match self {
            Pull::Off => "off ",
            Pull::Down => "down",
            Pull::Up => "up  ",
            Pull::Keep => "keep",
            Pull::Default => "dflt",
        }
    }
}

impl TryFrom<u32> for Pull {
    type Error = PiError;

    fn try_from(code: u32) -> PiResult<Self> {
        Ok(match code {
            0 => Pull::Off,
            1 => Pull::Down,
            2 => Pull::Up,
            3 => Pull::Keep,
            4 => Pull::Default,
            _ => return Err(PiError::BadPud),
        })
    }
}

pub trait GpioPin {
    fn gpio(&self) -> u32;

    fn mode(&self) -> PiResult<GpioMode>;

    fn set_mode(&mut self, mode: GpioMode) -> PiResult<()>;

    fn set_output(&mut self, value: bool) -> PiResult<()>;

    fn get_input(&self) -> PiResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes_round_trip() {
        for code in 0..8u32 {
            let mode = GpioMode::try_from(code).unwrap();
            assert_eq!(mode.code(), code);
        }
        assert_eq!(GpioMode::try_from(8u32), Err(PiError::BadMode));
    }

    #[test]
    fn alt_modes_are_not_input() {
        assert!(GpioMode::Input.is_input());
        assert!(!GpioMode::Alt5.is_input());
        assert!(!GpioMode::Output.is_input());
    }

    #[test]
    fn pull_noops() {
        assert!(Pull::Keep.is_noop());
        assert!(Pull::Default.is_noop());
        assert!(!Pull::Up.is_noop());
        assert_eq!(Pull::try_from(5u32), Err(PiError::BadPud));
        assert_eq!(Pull::try_from(2u32), Ok(Pull::Up));
    }
}
