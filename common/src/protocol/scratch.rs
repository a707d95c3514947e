//! Per-thread record of the last command a thread issued.
//!
//! Nothing here is shared between threads, so nothing is locked. The
//! dispatcher fills it in; diagnostics and callers only read snapshots.

use std::cell::RefCell;
use std::io;

use crate::protocol::commands::PI_CMD_NONE;
use crate::protocol::frame::{HEADER_LEN, NUMERIC_FRAME_LEN};

/// How far the last command got.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecStage {
    /// rejected before the socket was touched (or nothing issued yet)
    None,
    RequestSent,
    ResponseReceived,
}

pub(crate) struct CommandScratch {
    pub request: [u8; NUMERIC_FRAME_LEN],
    pub request_len: usize,
    pub response: [u8; HEADER_LEN],
    pub cmd: u32,
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
    pub stage: ExecStage,
    pub fault: Option<io::Error>,
}

impl CommandScratch {
    fn new() -> Self {
        CommandScratch {
            request: [0; NUMERIC_FRAME_LEN],
            request_len: 0,
            response: [0; HEADER_LEN],
            cmd: PI_CMD_NONE,
            p1: 0,
            p2: 0,
            p3: 0,
            stage: ExecStage::None,
            fault: None,
        }
    }
}

thread_local! {
    static SCRATCH: RefCell<CommandScratch> = RefCell::new(CommandScratch::new());
}

pub(crate) fn with<R, F: FnOnce(&mut CommandScratch) -> R>(f: F) -> R {
    SCRATCH.with(|cell| f(&mut cell.borrow_mut()))
}

/// Record a new command and forget the previous fault.
pub(crate) fn begin(cmd: u32, p1: u32, p2: u32, p3: u32) {
    with(|s| {
        s.cmd = cmd;
        s.p1 = p1;
        s.p2 = p2;
        s.p3 = p3;
        s.request_len = 0;
        s.stage = ExecStage::None;
        s.fault = None;
    })
}

pub(crate) fn set_stage(stage: ExecStage) {
    with(|s| s.stage = stage)
}

pub(crate) fn record_fault(err: io::Error) {
    with(|s| s.fault = Some(err))
}

/// Copy of the calling thread's last command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub cmd: u32,
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
    pub stage: ExecStage,
    /// text of the transport fault, if the last exchange hit one
    pub fault: Option<String>,
}

pub fn last_command() -> CommandRecord {
    with(|s| CommandRecord {
        cmd: s.cmd,
        p1: s.p1,
        p2: s.p2,
        p3: s.p3,
        stage: s.stage,
        fault: s.fault.as_ref().map(|err| err.to_string()),
    })
}

/// Header (plus numeric extension) of the last request this thread sent.
pub fn last_request() -> Vec<u8> {
    with(|s| s.request[..s.request_len].to_vec())
}

pub fn last_response() -> [u8; HEADER_LEN] {
    with(|s| s.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn begin_clears_fault() {
        begin(3, 4, 0, 0);
        record_fault(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert_eq!(last_command().fault.as_deref(), Some("timed out"));

        begin(4, 4, 1, 0);
        let record = last_command();
        assert_eq!(record.cmd, 4);
        assert_eq!(record.p2, 1);
        assert_eq!(record.stage, ExecStage::None);
        assert!(record.fault.is_none());
    }

    #[test]
    fn threads_do_not_share() {
        begin(17, 0, 0, 0);
        let other = thread::spawn(last_command).join().unwrap();
        assert_eq!(other.cmd, PI_CMD_NONE);
        assert_eq!(last_command().cmd, 17);
    }
}
