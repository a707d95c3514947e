//! Raspberry Pi IO connector layouts.
//!
//! Pin lookups answer with a GPIO number or one of the `PIN_*` sentinels,
//! so a pin table can be written down once and handed to the GPIO
//! operations unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::outputs::MAX_USER_GPIO;

/// GPIO to be ignored: every operation on it succeeds without doing anything.
pub const PIN_IGNORE: u32 = 57;
/// No such pin or GPIO.
pub const PIN_NONE: u32 = 99;
pub const PIN_GND: u32 = 90;
pub const PIN_3V3: u32 = 93;
pub const PIN_5V: u32 = 95;

/// Highest GPIO number with a name.
const MAX_NAMED_GPIO: u32 = 56;

const N: u32 = PIN_NONE;
const G: u32 = PIN_GND;
const V3: u32 = PIN_3V3;
const V5: u32 = PIN_5V;

// index: connector pin, 0 meaning "no pin"
const PI3_PIN_TO_GPIO: [u32; 41] = [
    PIN_IGNORE, V3, V5, 2, V5, 3, G, 4, 14, G, //
    15, 17, 18, 27, G, 22, 23, V3, 24, 10, //
    G, 9, 25, 11, 8, G, 7, 0, 1, 5, //
    G, 6, 12, 13, G, 19, 16, 26, 20, G, //
    21,
];

const PI1_PIN_TO_GPIO: [u32; 27] = [
    PIN_IGNORE, V3, V5, 0, V5, 1, G, 4, 14, G, //
    15, 17, 18, 21, G, 22, 23, V3, 24, 10, //
    G, 9, 25, 11, 8, G, 7,
];

/// Connector layout of a Pi model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Board {
    /// First Pi model, 26 pin connector
    Pi1,
    /// 40 pin connector: Pi 0, 3, 4 and later
    #[serde(alias = "pi0", alias = "pi4")]
    Pi3,
}

impl Default for Board {
    fn default() -> Self {
        Board::Pi3
    }
}

impl Board {
    fn table(self) -> &'static [u32] {
        match self {
            Board::Pi1 => &PI1_PIN_TO_GPIO,
            Board::Pi3 => &PI3_PIN_TO_GPIO,
        }
    }

    /// Number of connector pins.
    pub fn pins(self) -> u32 {
        self.table().len() as u32 - 1
    }

    /// GPIO on connector `pin`.
    ///
    /// Power and ground pins give [`PIN_3V3`], [`PIN_5V`] or [`PIN_GND`],
    /// pin 0 gives [`PIN_IGNORE`] and pins beyond the connector [`PIN_NONE`].
    pub fn gpio_for_pin(self, pin: u32) -> u32 {
        self.table().get(pin as usize).copied().unwrap_or(N)
    }

    /// Connector pin carrying `gpio`, if any.
    pub fn pin_for_gpio(self, gpio: u32) -> Option<u32> {
        if gpio > MAX_USER_GPIO {
            return None;
        }
        self.table()
            .iter()
            .skip(1)
            .position(|&g| g == gpio)
            .map(|index| index as u32 + 1)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Board::Pi1 => write!(f, "pi1"),
            Board::Pi3 => write!(f, "pi3"),
        }
    }
}

impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "pi1" => Ok(Board::Pi1),
            "0" | "3" | "4" | "pi0" | "pi3" | "pi4" => Ok(Board::Pi3),
            other => Err(format!("unknown board type {:?}", other)),
        }
    }
}

/// True for GPIOs this client may drive: bank 0 and the ignore sentinel.
///
/// Higher GPIOs belong to the operating system and are only read.
pub fn gpio_may_output(gpio: u32) -> bool {
    gpio <= MAX_USER_GPIO || gpio == PIN_IGNORE
}

/// `GPIO00`..`GPIO31`, `gpio32`..`gpio56` or the name of a sentinel.
pub fn gpio_name(gpio: u32) -> String {
    match gpio {
        PIN_3V3 => "3V3".to_string(),
        PIN_5V => "5V0".to_string(),
        PIN_GND => "gnd".to_string(),
        PIN_IGNORE => "ignore".to_string(),
        g if g <= MAX_USER_GPIO => format!("GPIO{:02}", g),
        g if g <= MAX_NAMED_GPIO => format!("gpio{:02}", g),
        _ => "none".to_string(),
    }
}
