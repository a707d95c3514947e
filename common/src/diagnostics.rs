//! Log records of the calling thread's last command.
//!
//! Call right after a command, passing its result:
//!
//! ```ignore
//! let res = pi.set_output(17, true);
//! diagnostics::log_if_bad(&res);
//! ```

use std::fmt;

use log::{debug, error, info};

use crate::hal::{PiError, PiResult};
use crate::protocol::commands::command_name;
use crate::protocol::scratch::{self, CommandRecord, ExecStage};

/// `   4,  18,   1` style parameter list.
fn params(record: &CommandRecord) -> String {
    format!("{:4},{:4},{:4}", record.cmd, record.p1 as i32, record.p2 as i32)
}

fn describe<T: fmt::Debug>(record: &CommandRecord, result: &PiResult<T>) -> String {
    match result {
        Err(PiError::BadCommand) => format!("cmd({}) -> bad command", params(record)),
        Ok(value) => format!("ioCmd({}) -> {:?} {}", params(record), value, command_name(record.cmd)),
        Err(err) => format!(
            "ioCmd({}) -> {} {} ({})",
            params(record),
            err.code(),
            command_name(record.cmd),
            err
        ),
    }
}

/// Log the last command at info level, or error level if it failed.
pub fn log_command<T: fmt::Debug>(result: &PiResult<T>) {
    let record = scratch::last_command();
    let line = describe(&record, result);
    if result.is_ok() {
        info!("{}", line);
    } else {
        error!("{}", line);
    }
    if let Some(fault) = &record.fault {
        error!("    {}", fault);
    }
}

/// Log the last command only if it failed.
pub fn log_if_bad<T: fmt::Debug>(result: &PiResult<T>) {
    if result.is_err() {
        log_command(result);
    }
}

/// Like [`log_command`] at debug level, plus the raw request and
/// response bytes as far as the exchange got.
pub fn debug_command<T: fmt::Debug>(result: &PiResult<T>) {
    let record = scratch::last_command();
    debug!("{}", describe(&record, result));
    if record.stage != ExecStage::None {
        debug!("   request : {:?}", scratch::last_request());
    }
    if record.stage == ExecStage::ResponseReceived {
        debug!("   response: {:?}", scratch::last_response());
    }
    if let Some(fault) = &record.fault {
        debug!("      {}", fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{PI_CMD_BS1, PI_CMD_WRITE};

    fn record(cmd: u32, p1: u32, p2: u32) -> CommandRecord {
        CommandRecord {
            cmd,
            p1,
            p2,
            p3: 0,
            stage: ExecStage::None,
            fault: None,
        }
    }

    #[test]
    fn describes_success() {
        let line = describe(&record(PI_CMD_WRITE, 18, 1), &Ok(0u32));
        assert_eq!(line, "ioCmd(   4,  18,   1) -> 0 WRITE");
    }

    #[test]
    fn describes_failure() {
        let line = describe::<()>(&record(PI_CMD_BS1, 0x40, 0), &Err(PiError::NotPermitted));
        assert_eq!(line, "ioCmd(  14,  64,   0) -> -41 BS1 (GPIO operation not permitted)");
        let line = describe::<()>(&record(200, 1, 2), &Err(PiError::BadCommand));
        assert_eq!(line, "cmd( 200,   1,   2) -> bad command");
    }
}
