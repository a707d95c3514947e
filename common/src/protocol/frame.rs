//! Byte layout of socket requests and responses.
//!
//! Every request starts with four little-endian 32 bit words: command, p1,
//! p2 and the number of extension bytes that follow. Responses echo the
//! first three words and put the result in the fourth.

pub const HEADER_LEN: usize = 16;
pub const NUMERIC_FRAME_LEN: usize = HEADER_LEN + 4;
pub const RESULT_OFFSET: usize = 12;

/// The four words at the start of every request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandHeader {
    pub cmd: u32,
    pub p1: u32,
    pub p2: u32,
    /// extension length
    pub p3: u32,
}

impl CommandHeader {
    pub fn plain(cmd: u32, p1: u32, p2: u32) -> Self {
        CommandHeader { cmd, p1, p2, p3: 0 }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        encode_header(buf, self.cmd, self.p1, self.p2, self.p3);
    }

    pub fn decode(buf: &[u8]) -> Self {
        CommandHeader {
            cmd: word(buf, 0),
            p1: word(buf, 4),
            p2: word(buf, 8),
            p3: word(buf, 12),
        }
    }
}

fn word(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

/// Write the 16 byte header into `buf[..16]`.
pub fn encode_header(buf: &mut [u8], cmd: u32, p1: u32, p2: u32, p3: u32) {
    buf[0..4].copy_from_slice(&cmd.to_le_bytes());
    buf[4..8].copy_from_slice(&p1.to_le_bytes());
    buf[8..12].copy_from_slice(&p2.to_le_bytes());
    buf[12..16].copy_from_slice(&p3.to_le_bytes());
}

/// Header with extension length 4 followed by `p_num`.
pub fn encode_numeric(buf: &mut [u8; NUMERIC_FRAME_LEN], cmd: u32, p1: u32, p2: u32, p_num: u32) {
    encode_header(&mut buf[..], cmd, p1, p2, 4);
    buf[HEADER_LEN..].copy_from_slice(&p_num.to_le_bytes());
}

/// Signed result word of a 16 byte response.
pub fn decode_result(response: &[u8; HEADER_LEN]) -> i32 {
    word(&response[..], RESULT_OFFSET) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_layout() {
        let mut buf = [0u8; HEADER_LEN];
        CommandHeader::plain(4, 18, 1).encode(&mut buf);
        assert_eq!(buf, [4, 0, 0, 0, 18, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(CommandHeader::decode(&buf), CommandHeader::plain(4, 18, 1));
    }

    #[test]
    fn numeric_layout() {
        let mut buf = [0u8; NUMERIC_FRAME_LEN];
        encode_numeric(&mut buf, 86, 18, 800, 250_000);
        assert_eq!(&buf[12..16], &[4, 0, 0, 0]);
        assert_eq!(&buf[16..20], &250_000u32.to_le_bytes());
    }

    #[test]
    fn result_word() {
        let mut response = [0u8; HEADER_LEN];
        response[RESULT_OFFSET..].copy_from_slice(&(-41i32).to_le_bytes());
        assert_eq!(decode_result(&response), -41);
        response[RESULT_OFFSET..].copy_from_slice(&[0, 0, 0, 0x80]);
        assert_eq!(decode_result(&response) as u32, 0x8000_0000);
    }
}
