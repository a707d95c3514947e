//! Per-command properties of the pigpiod socket interface.
//!
//! One [`CommandInfo`] per command number 0..=117, indexed by number.

pub const PI_CMD_MODES: u32 = 0;
pub const PI_CMD_MODEG: u32 = 1;
pub const PI_CMD_PUD: u32 = 2;
pub const PI_CMD_READ: u32 = 3;
pub const PI_CMD_WRITE: u32 = 4;
pub const PI_CMD_PWM: u32 = 5;
pub const PI_CMD_PRS: u32 = 6;
pub const PI_CMD_PFS: u32 = 7;
pub const PI_CMD_SERVO: u32 = 8;
pub const PI_CMD_WDOG: u32 = 9;
pub const PI_CMD_BR1: u32 = 10;
pub const PI_CMD_BR2: u32 = 11;
pub const PI_CMD_BC1: u32 = 12;
pub const PI_CMD_BC2: u32 = 13;
pub const PI_CMD_BS1: u32 = 14;
pub const PI_CMD_BS2: u32 = 15;
pub const PI_CMD_TICK: u32 = 16;
pub const PI_CMD_HWVER: u32 = 17;
pub const PI_CMD_NB: u32 = 19;
pub const PI_CMD_PRG: u32 = 22;
pub const PI_CMD_PFG: u32 = 23;
pub const PI_CMD_PRRG: u32 = 24;
pub const PI_CMD_PIGPV: u32 = 26;
pub const PI_CMD_WVAG: u32 = 28;
pub const PI_CMD_TRIG: u32 = 37;
pub const PI_CMD_SLRO: u32 = 42;
pub const PI_CMD_SLR: u32 = 43;
pub const PI_CMD_I2CO: u32 = 54;
pub const PI_CMD_I2CC: u32 = 55;
pub const PI_CMD_I2CRD: u32 = 56;
pub const PI_CMD_I2CWD: u32 = 57;
pub const PI_CMD_I2CWB: u32 = 62;
pub const PI_CMD_I2CRI: u32 = 67;
pub const PI_CMD_SPIX: u32 = 75;
pub const PI_CMD_SERR: u32 = 80;
pub const PI_CMD_SERW: u32 = 81;
pub const PI_CMD_GDC: u32 = 83;
pub const PI_CMD_GPW: u32 = 84;
pub const PI_CMD_HP: u32 = 86;
pub const PI_CMD_FN: u32 = 98;
pub const PI_CMD_PADS: u32 = 102;
pub const PI_CMD_PADG: u32 = 103;
pub const PI_CMD_FS: u32 = 108;
pub const PI_CMD_PROCU: u32 = 117;

/// Highest command number the daemon knows.
pub const PI_CMD_LAST: u32 = 117;

/// Pseudo command recorded before any command was issued on a thread.
pub const PI_CMD_NONE: u32 = 118;

/// What parameter p1 means for a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// p1 is unused and must be 0
    None,
    Gpio,
    /// bank 0 bit mask
    Bits,
    Pad,
    Mode,
    SubCommand,
    Micros,
    Millis,
    Baud,
    Count,
    Sda,
    Arg1,
    LenName,
    Config,
    Channel,
    WaveId,
    ScriptId,
    Event,
    Handle,
    Bus,
    Cs,
    Control,
    Ignore,
}

/// Static properties of one socket command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub p1: ParamKind,
    /// request carries extension bytes after the 16 byte header
    pub request_ext: bool,
    /// request extension is exactly one 4 byte number
    pub numeric_ext: bool,
    /// response carries extension bytes after the 16 byte header
    pub response_ext: bool,
    /// result is a uint32 that can't fail
    pub unsigned: bool,
}

impl CommandInfo {
    const fn new(name: &'static str, p1: ParamKind) -> Self {
        CommandInfo {
            name,
            p1,
            request_ext: false,
            numeric_ext: false,
            response_ext: false,
            unsigned: false,
        }
    }

    const fn ext(self) -> Self {
        CommandInfo { request_ext: true, ..self }
    }

    const fn num(self) -> Self {
        CommandInfo { request_ext: true, numeric_ext: true, ..self }
    }

    const fn resp(self) -> Self {
        CommandInfo { response_ext: true, ..self }
    }

    const fn uint(self) -> Self {
        CommandInfo { unsigned: true, ..self }
    }

    /// Plain commands: 16 byte request, 16 byte response.
    pub fn is_plain(&self) -> bool {
        !self.request_ext && !self.response_ext
    }
}

use self::ParamKind as K;

const fn c(name: &'static str, p1: ParamKind) -> CommandInfo {
    CommandInfo::new(name, p1)
}

static COMMANDS: [CommandInfo; 118] = [
    // 0
    c("MODES", K::Gpio),
    c("MODEG", K::Gpio),
    c("PUD", K::Gpio),
    c("READ", K::Gpio),
    c("WRITE", K::Gpio),
    c("PWM", K::Gpio),
    c("PRS", K::Gpio),
    c("PFS", K::Gpio),
    c("SERVO", K::Gpio),
    c("WDOG", K::Gpio),
    // 10
    c("BR1", K::None).uint(),
    c("BR2", K::None).uint(),
    c("BC1", K::Bits),
    c("BC2", K::Bits),
    c("BS1", K::Bits),
    c("BS2", K::Bits),
    c("TICK", K::None).uint(),
    c("HWVER", K::None).uint(),
    c("NO", K::None),
    c("NB", K::Handle),
    // 20
    c("NP", K::Handle),
    c("NC", K::Handle),
    c("PRG", K::Gpio),
    c("PFG", K::Gpio),
    c("PRRG", K::Gpio),
    c("HELP", K::Ignore),
    c("PIGPV", K::None).uint(),
    c("WVCLR", K::None),
    c("WVAG", K::None).ext(),
    c("WVAS", K::Gpio).ext(),
    // 30
    c("bad30", K::None),
    c("bad31", K::None),
    c("WVBSY", K::None),
    c("WVHLT", K::None),
    c("WVSM", K::SubCommand),
    c("WVSP", K::SubCommand),
    c("WVSC", K::SubCommand),
    c("TRIG", K::Gpio).num(),
    c("PROC", K::None).ext(),
    c("PROCD", K::ScriptId),
    // 40
    c("PROCR", K::ScriptId).ext(),
    c("PROCS", K::ScriptId),
    c("SLRO", K::Gpio).num(),
    c("SLR", K::Gpio).resp(),
    c("SLRC", K::Gpio),
    c("PROCP", K::ScriptId).resp(),
    c("MICS", K::Micros),
    c("MILS", K::Millis),
    c("PARSE", K::Ignore),
    c("WVCRE", K::None),
    // 50
    c("WVDEL", K::WaveId),
    c("WVTX", K::WaveId),
    c("WVTXR", K::WaveId),
    c("WVNEW", K::None),
    c("I2CO", K::Bus).num(),
    c("I2CC", K::Handle),
    c("I2CRD", K::Handle).resp(),
    c("I2CWD", K::Handle).ext(),
    c("I2CWQ", K::Handle),
    c("I2CRS", K::Handle),
    // 60
    c("I2CWS", K::Handle),
    c("I2CRB", K::Handle),
    c("I2CWB", K::Handle).num(),
    c("I2CRW", K::Handle),
    c("I2CWW", K::Handle).num(),
    c("I2CRK", K::Handle).resp(),
    c("I2CWK", K::Handle).ext(),
    c("I2CRI", K::Handle).ext().resp(),
    c("I2CWI", K::Handle).ext(),
    c("I2CPC", K::Handle).num(),
    // 70
    c("I2CPK", K::Handle).ext().resp(),
    c("SPIO", K::Channel).num(),
    c("SPIC", K::Handle),
    c("SPIR", K::Handle).resp(),
    c("SPIW", K::Handle).ext(),
    c("SPIX", K::Handle).ext().resp(),
    c("SERO", K::Baud).ext(),
    c("SERC", K::Handle),
    c("SERRB", K::Handle),
    c("SERWB", K::Handle),
    // 80
    c("SERR", K::Handle).resp(),
    c("SERW", K::Handle).ext(),
    c("SERDA", K::Handle),
    c("GDC", K::Gpio),
    c("GPW", K::Gpio),
    c("HC", K::Gpio),
    c("HP", K::Gpio).num(),
    c("CF1", K::Arg1).num(),
    c("CF2", K::Arg1).ext().resp(),
    c("BI2CC", K::Sda),
    // 90
    c("BI2CO", K::Sda).num(),
    c("BI2CZ", K::Sda).ext().resp(),
    c("I2CZ", K::Handle).ext().resp(),
    c("WVCHA", K::None).ext(),
    c("SLRI", K::Gpio),
    c("CGI", K::None),
    c("CSI", K::Config),
    c("FG", K::Gpio),
    c("FN", K::Gpio).num(),
    c("NOIB", K::None),
    // 100
    c("WVTXM", K::WaveId),
    c("WVTAT", K::None),
    c("PADS", K::Pad),
    c("PADG", K::Pad),
    c("FO", K::Mode).ext(),
    c("FC", K::Handle),
    c("FR", K::Handle).resp(),
    c("FW", K::Handle).ext(),
    c("FS", K::Handle).num(),
    c("FL", K::Count).ext().resp(),
    // 110
    c("SHELL", K::LenName).ext(),
    c("BSPIC", K::Cs),
    c("BSPIO", K::Cs).ext(),
    c("BSPIX", K::Cs).ext().resp(),
    c("BSCX", K::Control).ext().resp(),
    c("EVM", K::Handle),
    c("EVT", K::Event),
    c("PROCU", K::ScriptId).ext(),
];

/// Properties of `cmd`, `None` outside 0..=117.
pub fn command_info(cmd: u32) -> Option<&'static CommandInfo> {
    COMMANDS.get(cmd as usize)
}

/// True for the five commands whose result is an unsigned 32 bit value.
pub fn returns_unsigned(cmd: u32) -> bool {
    command_info(cmd).map_or(false, |info| info.unsigned)
}

/// Short name as in the socket interface documentation.
pub fn command_name(cmd: u32) -> &'static str {
    command_info(cmd).map_or("none", |info| info.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_commands() {
        let unsigned: Vec<u32> = (0..=PI_CMD_LAST).filter(|&cmd| returns_unsigned(cmd)).collect();
        assert_eq!(unsigned, vec![PI_CMD_BR1, PI_CMD_BR2, PI_CMD_TICK, PI_CMD_HWVER, PI_CMD_PIGPV]);
    }

    #[test]
    fn extension_counts() {
        let request = COMMANDS.iter().filter(|info| info.request_ext).count();
        let numeric = COMMANDS.iter().filter(|info| info.numeric_ext).count();
        let plain = COMMANDS.iter().filter(|info| info.is_plain()).count();
        assert_eq!(request, 37);
        assert_eq!(numeric, 12);
        assert_eq!(plain, 118 - 37 - 7);
    }

    #[test]
    fn numeric_implies_request_without_response() {
        for info in COMMANDS.iter().filter(|info| info.numeric_ext) {
            assert!(info.request_ext, "{}", info.name);
            assert!(!info.response_ext, "{}", info.name);
        }
    }

    #[test]
    fn names_line_up_with_numbers() {
        assert_eq!(command_name(PI_CMD_MODES), "MODES");
        assert_eq!(command_name(PI_CMD_BS1), "BS1");
        assert_eq!(command_name(PI_CMD_GDC), "GDC");
        assert_eq!(command_name(PI_CMD_PADS), "PADS");
        assert_eq!(command_name(PI_CMD_FS), "FS");
        assert_eq!(command_name(PI_CMD_PROCU), "PROCU");
        assert_eq!(command_name(PI_CMD_NONE), "none");
    }

    #[test]
    fn custom_commands_take_a_free_argument() {
        for name in ["CF1", "CF2"].iter() {
            let info = COMMANDS.iter().find(|info| info.name == *name).unwrap();
            assert_eq!(info.p1, ParamKind::Arg1);
        }
    }

    #[test]
    fn out_of_range() {
        assert!(command_info(118).is_none());
        assert!(command_info(u32::max_value()).is_none());
        assert!(!returns_unsigned(1000));
    }
}
