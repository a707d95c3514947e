use std::convert::TryFrom;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::board::PIN_IGNORE;
use crate::config::Device;
use crate::hal::gpio::GpioMode;
use crate::hal::{PiError, PiResult};
use crate::protocol::commands::*;
use crate::protocol::frame::{
    decode_result, encode_header, encode_numeric, CommandHeader, HEADER_LEN, NUMERIC_FRAME_LEN, RESULT_OFFSET,
};
use crate::protocol::outputs::{OutputMask, MAX_GPIO, MAX_USER_GPIO};
use crate::protocol::scratch::{self, ExecStage};

/// Late responses skipped before an exchange gives up on the stream.
const MAX_LATE_RESPONSES: usize = 4;

/// The three ways of issuing a socket command.
///
/// All of them return the command's result: a non-negative value, or the
/// raw 32 bits for the commands listed by [`returns_unsigned`]. Negative
/// results of other commands become errors.
pub trait CommandChannel {
    /// Command without extension: 16 bytes out, 16 bytes back.
    fn command(&self, cmd: u32, p1: u32, p2: u32) -> PiResult<u32>;

    /// Command whose extension is a single number. Other commands are
    /// passed on to [`CommandChannel::command`].
    fn command_numeric(&self, cmd: u32, p1: u32, p2: u32, p_num: u32) -> PiResult<u32>;

    /// Command with arbitrary extension bytes.
    ///
    /// `request` is sent after the header. For commands that answer with
    /// extension bytes, as many as fit are copied to `response` and the
    /// result is the number the daemon sent.
    fn command_ext(&self, cmd: u32, p1: u32, p2: u32, request: &[u8], response: &mut [u8]) -> PiResult<u32>;
}

/// Input and output side of the daemon socket. Both exist or neither does.
struct Streams {
    input: TcpStream,
    output: TcpStream,
}

impl Streams {
    fn open(device: &Device) -> io::Result<Self> {
        let mut last_err = None;
        for addr in (device.host.as_str(), device.port).to_socket_addrs()? {
            match connect_stream(&addr, device.timeout) {
                Ok(input) => {
                    let output = input.try_clone()?;
                    return Ok(Streams { input, output });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, format!("no address for {}", device.host))
        }))
    }

    fn close(self) {
        let _ = self.output.shutdown(Shutdown::Both);
    }
}

fn connect_stream(addr: &std::net::SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    let stream = if timeout == Duration::from_secs(0) {
        TcpStream::connect(addr)?
    } else {
        TcpStream::connect_timeout(addr, timeout)?
    };
    if timeout > Duration::from_secs(0) {
        stream.set_read_timeout(Some(timeout))?;
    }
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Connection to one pigpiod daemon.
///
/// Share it between threads by reference or `Arc`: every request/response
/// exchange runs under one lock, so commands from different threads never
/// interleave on the socket.
pub struct Pigpiod {
    device: Device,
    link: Mutex<Option<Streams>>,
    outputs: OutputMask,
}

impl Pigpiod {
    /// Unconnected client; see [`Pigpiod::connect`].
    pub fn new(device: Device) -> Self {
        Pigpiod {
            device,
            link: Mutex::new(None),
            outputs: OutputMask::new(),
        }
    }

    pub fn open(device: Device) -> io::Result<Self> {
        let pi = Pigpiod::new(device);
        pi.connect()?;
        Ok(pi)
    }

    /// Open the socket unless it is open already.
    ///
    /// On failure the client is left disconnected and the original error
    /// is returned.
    pub fn connect(&self) -> io::Result<()> {
        let mut link = self.lock();
        if link.is_some() {
            return Ok(());
        }
        match Streams::open(&self.device) {
            Ok(streams) => {
                *link = Some(streams);
                info!("connected to pigpiod at {}:{}", self.device.host, self.device.port);
                Ok(())
            }
            Err(err) => {
                warn!("can't connect to pigpiod at {}:{}: {}", self.device.host, self.device.port, err);
                Err(err)
            }
        }
    }

    /// Close the socket. Harmless when not connected.
    pub fn disconnect(&self) {
        if let Some(streams) = self.lock().take() {
            streams.close();
            info!("disconnected from pigpiod at {}:{}", self.device.host, self.device.port);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Bank 0 GPIOs this client has set to a non-input mode.
    pub fn outputs(&self) -> &OutputMask {
        &self.outputs
    }

    fn lock(&self) -> MutexGuard<'_, Option<Streams>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the exclusive section for a series of exchanges.
    ///
    /// Commands issued through the `Pigpiod` itself while the session is
    /// alive block forever; use [`Session::command`] instead.
    pub fn session(&self) -> PiResult<Session<'_>> {
        let link = self.lock();
        if link.is_none() {
            return Err(PiError::NotConnected);
        }
        Ok(Session {
            link,
            outputs: &self.outputs,
        })
    }

    fn plan_plain(&self, info: &CommandInfo, cmd: u32, p1: u32, p2: u32) -> PiResult<Plan> {
        match info.p1 {
            ParamKind::Gpio if p1 == PIN_IGNORE => Ok(Plan::Skip),
            ParamKind::Gpio => match cmd {
                PI_CMD_MODES => {
                    check_gpio(p1)?;
                    match GpioMode::try_from(p2)? {
                        GpioMode::Output => Ok(Plan::SendAsOutput(p1)),
                        _ => Ok(Plan::Send),
                    }
                }
                PI_CMD_WRITE | PI_CMD_PWM | PI_CMD_SERVO => {
                    check_user_gpio(p1)?;
                    match cmd {
                        PI_CMD_WRITE if p2 > 1 => return Err(PiError::BadLevel),
                        PI_CMD_PWM if p2 > i32::MAX as u32 => return Err(PiError::BadDutycycle),
                        PI_CMD_SERVO if p2 > i32::MAX as u32 => return Err(PiError::BadPulsewidth),
                        _ => {}
                    }
                    // the daemon switches the GPIO to output by itself
                    Ok(Plan::SendAsOutput(p1))
                }
                _ => check_gpio(p1).map(|_| Plan::Send),
            },
            ParamKind::Bits if cmd == PI_CMD_BS1 || cmd == PI_CMD_BC1 => {
                if p1 == 0 {
                    Ok(Plan::Skip)
                } else if !self.outputs.covers(p1) {
                    Err(PiError::NotPermitted)
                } else {
                    Ok(Plan::Send)
                }
            }
            ParamKind::Pad => {
                if p1 > 2 {
                    return Err(PiError::BadPad);
                }
                if cmd == PI_CMD_PADS && (p2 < 1 || p2 > 16) {
                    return Err(PiError::BadStrength);
                }
                Ok(Plan::Send)
            }
            kind => check_signed(kind, p1).map(|_| Plan::Send),
        }
    }
}

impl Drop for Pigpiod {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Outcome of the checks that run before the socket is touched.
enum Plan {
    /// nothing to do, succeed without I/O
    Skip,
    Send,
    /// send and track the GPIO as output
    SendAsOutput(u32),
}

fn check_gpio(gpio: u32) -> PiResult<()> {
    if gpio > MAX_GPIO {
        Err(PiError::BadGpio)
    } else {
        Ok(())
    }
}

fn check_user_gpio(gpio: u32) -> PiResult<()> {
    if gpio > MAX_USER_GPIO {
        Err(PiError::BadUserGpio)
    } else {
        Ok(())
    }
}

/// Handles and bus numbers are signed on the daemon side.
fn check_signed(kind: ParamKind, p1: u32) -> PiResult<()> {
    match kind {
        ParamKind::Handle if p1 > i32::MAX as u32 => Err(PiError::BadHandle),
        ParamKind::Bus if p1 > i32::MAX as u32 => Err(PiError::BadI2cBus),
        _ => Ok(()),
    }
}

fn interpret(cmd: u32, raw: i32) -> PiResult<u32> {
    if raw < 0 && !returns_unsigned(cmd) {
        Err(PiError::from_code(raw))
    } else {
        Ok(raw as u32)
    }
}

impl CommandChannel for Pigpiod {
    fn command(&self, cmd: u32, p1: u32, p2: u32) -> PiResult<u32> {
        scratch::begin(cmd, p1, p2, 0);
        let info = match command_info(cmd) {
            Some(info) if info.is_plain() => info,
            _ => return Err(PiError::BadCommand),
        };
        let plan = self.plan_plain(info, cmd, p1, p2)?;
        if let Plan::Skip = plan {
            return Ok(0);
        }

        let mut frame = [0u8; HEADER_LEN];
        encode_header(&mut frame, cmd, p1, p2, 0);
        let mut session = self.session()?;
        if let Plan::SendAsOutput(gpio) = plan {
            self.outputs.mark(gpio);
        }
        let raw = session.exchange(&frame, &[], None)?;
        interpret(cmd, raw)
    }

    fn command_numeric(&self, cmd: u32, p1: u32, p2: u32, p_num: u32) -> PiResult<u32> {
        let info = match command_info(cmd) {
            Some(info) if info.numeric_ext => info,
            _ => return self.command(cmd, p1, p2),
        };
        scratch::begin(cmd, p1, p2, 4);
        match info.p1 {
            ParamKind::Gpio if p1 == PIN_IGNORE => return Ok(0),
            ParamKind::Gpio => check_user_gpio(p1)?,
            kind => check_signed(kind, p1)?,
        }

        let mut frame = [0u8; NUMERIC_FRAME_LEN];
        encode_numeric(&mut frame, cmd, p1, p2, p_num);
        let raw = self.session()?.exchange(&frame, &[], None)?;
        interpret(cmd, raw)
    }

    fn command_ext(&self, cmd: u32, p1: u32, p2: u32, request: &[u8], response: &mut [u8]) -> PiResult<u32> {
        let info = match command_info(cmd) {
            Some(info) if !info.is_plain() => info,
            _ => return self.command(cmd, p1, p2),
        };
        if info.numeric_ext {
            let mut number = [0u8; 4];
            let n = request.len().min(4);
            number[..n].copy_from_slice(&request[..n]);
            return self.command_numeric(cmd, p1, p2, u32::from_le_bytes(number));
        }

        let p3 = request.len() as u32;
        scratch::begin(cmd, p1, p2, p3);
        match info.p1 {
            ParamKind::Gpio if p1 == PIN_IGNORE => return Ok(0),
            ParamKind::Gpio => check_gpio(p1)?,
            kind => check_signed(kind, p1)?,
        }

        let mut frame = [0u8; HEADER_LEN];
        encode_header(&mut frame, cmd, p1, p2, p3);
        let reply = if info.response_ext { Some(response) } else { None };
        let raw = self.session()?.exchange(&frame, request, reply)?;
        interpret(cmd, raw)
    }
}

/// Exclusive use of the connection, see [`Pigpiod::session`].
pub struct Session<'a> {
    link: MutexGuard<'a, Option<Streams>>,
    outputs: &'a OutputMask,
}

impl<'a> Session<'a> {
    pub fn outputs(&self) -> &OutputMask {
        self.outputs
    }

    /// Plain command without parameter checks or output tracking.
    pub fn command(&mut self, cmd: u32, p1: u32, p2: u32) -> PiResult<u32> {
        scratch::begin(cmd, p1, p2, 0);
        match command_info(cmd) {
            Some(info) if info.is_plain() => {}
            _ => return Err(PiError::BadCommand),
        }
        let mut frame = [0u8; HEADER_LEN];
        encode_header(&mut frame, cmd, p1, p2, 0);
        let raw = self.exchange(&frame, &[], None)?;
        interpret(cmd, raw)
    }

    /// Write one request and read its response. Returns the raw result.
    fn exchange(&mut self, frame: &[u8], ext: &[u8], reply: Option<&mut [u8]>) -> PiResult<i32> {
        let streams = self.link.as_mut().ok_or(PiError::NotConnected)?;
        let header = CommandHeader::decode(frame);
        scratch::with(|s| {
            s.request[..frame.len()].copy_from_slice(frame);
            s.request_len = frame.len();
        });

        if let Err(err) = write_request(&mut streams.output, frame, ext) {
            warn!("{}: socket write failed: {}", command_name(header.cmd), err);
            scratch::record_fault(err);
            return Err(PiError::SocketWriteFailed);
        }
        scratch::set_stage(ExecStage::RequestSent);

        let mut response = [0u8; HEADER_LEN];
        let mut stale = 0;
        loop {
            let received = match read_response(&mut streams.input, &mut response) {
                Ok(received) => received,
                Err(err) => {
                    warn!("{}: socket read failed: {}", command_name(header.cmd), err);
                    scratch::record_fault(err);
                    return Err(PiError::SocketReadFailed);
                }
            };
            scratch::with(|s| s.response = response);
            if received != HEADER_LEN {
                warn!("{}: response has {} of {} bytes", command_name(header.cmd), received, HEADER_LEN);
                return Err(PiError::WrongResponseLength);
            }
            if response[..RESULT_OFFSET] == frame[..RESULT_OFFSET] {
                break;
            }

            // late answer to a command that ran into the read timeout
            let late = CommandHeader::decode(&response);
            warn!("{}: dropped late response to {}", command_name(header.cmd), command_name(late.cmd));
            let late_len = decode_result(&response);
            if late_len > 0 && command_info(late.cmd).map_or(false, |info| info.response_ext) {
                read_extension(&mut streams.input, late_len as usize, &mut [])?;
            }
            stale += 1;
            if stale > MAX_LATE_RESPONSES {
                scratch::record_fault(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "response does not echo the request",
                ));
                return Err(PiError::WrongResponseLength);
            }
        }
        scratch::set_stage(ExecStage::ResponseReceived);

        let raw = decode_result(&response);
        debug!("{}({}, {}, {}) -> {}", command_name(header.cmd), header.p1, header.p2, header.p3, raw);
        if let Some(reply) = reply {
            if raw > 0 {
                read_extension(&mut streams.input, raw as usize, reply)?;
            }
        }
        Ok(raw)
    }
}

fn write_request(output: &mut TcpStream, frame: &[u8], ext: &[u8]) -> io::Result<()> {
    output.write_all(frame)?;
    if !ext.is_empty() {
        output.write_all(ext)?;
    }
    output.flush()
}

/// Read up to a full response header; fewer bytes means the peer closed.
fn read_response(input: &mut TcpStream, buf: &mut [u8; HEADER_LEN]) -> io::Result<usize> {
    let mut received = 0;
    while received < HEADER_LEN {
        match input.read(&mut buf[received..]) {
            Ok(0) => break,
            Ok(n) => received += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(received)
}

/// Read `len` extension bytes: keep what fits into `out`, drop the rest.
fn read_extension(input: &mut TcpStream, len: usize, out: &mut [u8]) -> PiResult<()> {
    let keep = len.min(out.len());
    let result = input.read_exact(&mut out[..keep]).and_then(|_| {
        let rest = (len - keep) as u64;
        let drained = io::copy(&mut Read::by_ref(input).take(rest), &mut io::sink())?;
        if drained < rest {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "response extension cut short"))
        } else {
            Ok(())
        }
    });
    result.map_err(|err| {
        warn!("response extension of {} bytes: {}", len, err);
        let short = err.kind() == io::ErrorKind::UnexpectedEof;
        scratch::record_fault(err);
        if short {
            PiError::WrongResponseLength
        } else {
            PiError::SocketReadFailed
        }
    })
}
