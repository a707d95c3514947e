use thiserror::Error;

pub mod gpio;

/// Failure of a pigpiod command.
///
/// Every variant maps to the numeric code pigpio uses for it, see
/// [`PiError::code`]. Codes the client does not name itself are kept as
/// [`PiError::Daemon`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum PiError {
    /// Command number outside 0..=117 or submitted through the wrong entry point
    #[error("bad command")]
    BadCommand,

    #[error("GPIO not 0-31")]
    BadUserGpio,

    #[error("GPIO not 0-53")]
    BadGpio,

    #[error("mode not 0-7")]
    BadMode,

    #[error("level not 0-1")]
    BadLevel,

    #[error("pull not 0-2")]
    BadPud,

    #[error("pulse width not 0 or 500-2500")]
    BadPulsewidth,

    #[error("duty cycle outside range")]
    BadDutycycle,

    #[error("unknown handle")]
    BadHandle,

    /// Bank operation on a GPIO this client has not configured as output
    #[error("GPIO operation not permitted")]
    NotPermitted,

    #[error("bad I2C bus")]
    BadI2cBus,

    #[error("bad pad number")]
    BadPad,

    #[error("bad pad drive strength")]
    BadStrength,

    #[error("socket read failed")]
    SocketReadFailed,

    #[error("socket write failed")]
    SocketWriteFailed,

    /// The daemon answered with fewer than 16 bytes
    #[error("socket read wrong length")]
    WrongResponseLength,

    /// Command issued on a connection that is not (or no longer) open
    #[error("not connected to pigpiod")]
    NotConnected,

    #[error("pigpiod error {0}")]
    Daemon(i32),
}

impl PiError {
    pub fn code(&self) -> i32 {
        match *self {
            PiError::BadCommand => PI_CMD_BAD,
            PiError::BadUserGpio => -2,
            PiError::BadGpio => -3,
            PiError::BadMode => -4,
            PiError::BadLevel => -5,
            PiError::BadPud => -6,
            PiError::BadPulsewidth => -7,
            PiError::BadDutycycle => -8,
            PiError::BadHandle => -25,
            PiError::NotConnected => -31,
            PiError::NotPermitted => -41,
            PiError::SocketReadFailed => -59,
            PiError::SocketWriteFailed => -60,
            PiError::BadI2cBus => -74,
            PiError::BadPad => -126,
            PiError::BadStrength => -127,
            PiError::WrongResponseLength => PI_SOCK_READ_LEN,
            PiError::Daemon(code) => code,
        }
    }

    /// Map a negative pigpio result to an error.
    ///
    /// The daemon's -31 ("not initialised") stays [`PiError::Daemon`]:
    /// [`PiError::NotConnected`] only ever comes from this side of the
    /// socket.
    pub fn from_code(code: i32) -> Self {
        match code {
            PI_CMD_BAD => PiError::BadCommand,
            -2 => PiError::BadUserGpio,
            -3 => PiError::BadGpio,
            -4 => PiError::BadMode,
            -5 => PiError::BadLevel,
            -6 => PiError::BadPud,
            -7 => PiError::BadPulsewidth,
            -8 => PiError::BadDutycycle,
            -25 => PiError::BadHandle,
            -41 => PiError::NotPermitted,
            -59 => PiError::SocketReadFailed,
            -60 => PiError::SocketWriteFailed,
            -74 => PiError::BadI2cBus,
            -126 => PiError::BadPad,
            -127 => PiError::BadStrength,
            PI_SOCK_READ_LEN => PiError::WrongResponseLength,
            other => PiError::Daemon(other),
        }
    }

    /// Transport faults as opposed to validation or daemon errors.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PiError::SocketReadFailed | PiError::SocketWriteFailed | PiError::WrongResponseLength
        )
    }
}

/// Client side code for "command bad; not 0..117".
pub const PI_CMD_BAD: i32 = -3081;

/// Client side code for "socket read wrong length".
pub const PI_SOCK_READ_LEN: i32 = -3059;

pub type PiResult<T> = Result<T, PiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back_to_variants() {
        let named = [
            PiError::BadCommand,
            PiError::BadUserGpio,
            PiError::BadGpio,
            PiError::BadMode,
            PiError::BadLevel,
            PiError::BadPud,
            PiError::BadPulsewidth,
            PiError::BadDutycycle,
            PiError::BadHandle,
            PiError::NotPermitted,
            PiError::SocketReadFailed,
            PiError::SocketWriteFailed,
            PiError::BadI2cBus,
            PiError::BadPad,
            PiError::BadStrength,
            PiError::WrongResponseLength,
        ];
        for err in named.iter() {
            assert_eq!(PiError::from_code(err.code()), *err);
        }
        assert_eq!(PiError::from_code(-88), PiError::Daemon(-88));
        assert_eq!(PiError::Daemon(-88).code(), -88);
    }

    #[test]
    fn daemon_not_initialised_is_not_a_lost_connection() {
        assert_eq!(PiError::from_code(-31), PiError::Daemon(-31));
        assert_eq!(PiError::NotConnected.code(), -31);
        assert_eq!(PiError::from_code(-31).to_string(), "pigpiod error -31");
    }

    #[test]
    fn transport_class() {
        assert!(PiError::WrongResponseLength.is_transport());
        assert!(PiError::SocketReadFailed.is_transport());
        assert!(!PiError::NotPermitted.is_transport());
        assert!(!PiError::Daemon(-41).is_transport());
    }

    #[test]
    fn display() {
        assert_eq!(PiError::BadCommand.to_string(), "bad command");
        assert_eq!(PiError::Daemon(-99).to_string(), "pigpiod error -99");
    }
}
