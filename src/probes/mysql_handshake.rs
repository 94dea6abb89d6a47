//! Decoder for the MySQL protocol-10 initial handshake packet.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! 3  packet length        1  sequence id
//! 1  protocol version (10)
//! n  server version, NUL terminated
//! 4  connection id
//! 8  auth plugin data part 1     1  filler
//! 2  capability flags (lower)
//! -- extended fields, only if the packet continues --
//! 1  character set        2  status flags
//! 2  capability flags (upper)
//! 1  auth plugin data length     10 reserved
//! n  auth plugin data part 2     (CLIENT_SECURE_CONNECTION)
//! n  auth plugin name, NUL terminated (CLIENT_PLUGIN_AUTH)
//! ```
//!
//! Fields after the lower capability word depend on capability bits read
//! partway through, so decoding is a straight run of bounds-checked reads
//! with a guard per optional section.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::DecodeError;

pub const PROTOCOL_VERSION: u8 = 10;

pub const CLIENT_SECURE_CONNECTION: u32 = 0x0000_8000;
pub const CLIENT_PLUGIN_AUTH: u32 = 0x0008_0000;

/// Length of the auth plugin data that always precedes the filler byte.
const AUTH_DATA_PART1_LEN: usize = 8;
/// Lower bound of part 2 (including its trailing NUL).
const AUTH_DATA_PART2_MIN: i32 = 13;
const RESERVED_LEN: usize = 10;

/// Every capability flag known to MySQL 8.x, in bit order.
pub const CAPABILITY_FLAGS: &[(u32, &str)] = &[
    (0x0000_0001, "CLIENT_LONG_PASSWORD"),
    (0x0000_0002, "CLIENT_FOUND_ROWS"),
    (0x0000_0004, "CLIENT_LONG_FLAG"),
    (0x0000_0008, "CLIENT_CONNECT_WITH_DB"),
    (0x0000_0010, "CLIENT_NO_SCHEMA"),
    (0x0000_0020, "CLIENT_COMPRESS"),
    (0x0000_0040, "CLIENT_ODBC"),
    (0x0000_0080, "CLIENT_LOCAL_FILES"),
    (0x0000_0100, "CLIENT_IGNORE_SPACE"),
    (0x0000_0200, "CLIENT_PROTOCOL_41"),
    (0x0000_0400, "CLIENT_INTERACTIVE"),
    (0x0000_0800, "CLIENT_SSL"),
    (0x0000_1000, "CLIENT_IGNORE_SIGPIPE"),
    (0x0000_2000, "CLIENT_TRANSACTIONS"),
    (0x0000_4000, "CLIENT_RESERVED"),
    (CLIENT_SECURE_CONNECTION, "CLIENT_SECURE_CONNECTION"),
    (0x0001_0000, "CLIENT_MULTI_STATEMENTS"),
    (0x0002_0000, "CLIENT_MULTI_RESULTS"),
    (0x0004_0000, "CLIENT_PS_MULTI_RESULTS"),
    (CLIENT_PLUGIN_AUTH, "CLIENT_PLUGIN_AUTH"),
    (0x0010_0000, "CLIENT_CONNECT_ATTRS"),
    (0x0020_0000, "CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA"),
    (0x0040_0000, "CLIENT_CAN_HANDLE_EXPIRED_PASSWORDS"),
    (0x0080_0000, "CLIENT_SESSION_TRACK"),
    (0x0100_0000, "CLIENT_DEPRECATE_EOF"),
    (0x0200_0000, "CLIENT_OPTIONAL_RESULTSET_METADATA"),
    (0x0400_0000, "CLIENT_ZSTD_COMPRESSION_ALGORITHM"),
    (0x0800_0000, "CLIENT_QUERY_ATTRIBUTES"),
    (0x1000_0000, "MULTI_FACTOR_AUTHENTICATION"),
    (0x2000_0000, "CLIENT_CAPABILITY_EXTENSION"),
    (0x4000_0000, "CLIENT_SSL_VERIFY_SERVER_CERT"),
    (0x8000_0000, "CLIENT_REMEMBER_OPTIONS"),
];

pub const STATUS_FLAGS: &[(u16, &str)] = &[
    (0x0001, "SERVER_STATUS_IN_TRANS"),
    (0x0002, "SERVER_STATUS_AUTOCOMMIT"),
    (0x0008, "SERVER_MORE_RESULTS_EXISTS"),
    (0x0010, "SERVER_QUERY_NO_GOOD_INDEX_USED"),
    (0x0020, "SERVER_QUERY_NO_INDEX_USED"),
    (0x0040, "SERVER_STATUS_CURSOR_EXISTS"),
    (0x0080, "SERVER_STATUS_LAST_ROW_SENT"),
    (0x0100, "SERVER_STATUS_DB_DROPPED"),
    (0x0200, "SERVER_STATUS_NO_BACKSLASH_ESCAPES"),
    (0x0400, "SERVER_STATUS_METADATA_CHANGED"),
    (0x0800, "SERVER_QUERY_WAS_SLOW"),
    (0x1000, "SERVER_PS_OUT_PARAMS"),
    (0x2000, "SERVER_STATUS_IN_TRANS_READONLY"),
    (0x4000, "SERVER_SESSION_STATE_CHANGED"),
];

pub fn capability_names(bits: u32) -> Vec<&'static str> {
    CAPABILITY_FLAGS
        .iter()
        .filter(|(flag, _)| bits & flag != 0)
        .map(|(_, name)| *name)
        .collect()
}

pub fn status_names(bits: u16) -> Vec<&'static str> {
    STATUS_FLAGS
        .iter()
        .filter(|(flag, _)| bits & flag != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// A decoded protocol-10 handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandshakeRecord {
    pub server_version: String,
    pub connection_id: u32,
    /// Collation id; `None` when the packet stops before the extended fields.
    pub character_set: Option<u8>,
    pub status: Option<u16>,
    /// Lower and upper capability words combined.
    pub capabilities: u32,
    /// Only present when `CLIENT_PLUGIN_AUTH` is advertised.
    pub auth_plugin: Option<String>,
    /// Salt part 1, followed by part 2 when `CLIENT_SECURE_CONNECTION` is set.
    #[serde(serialize_with = "serialize_hex")]
    pub auth_data: Vec<u8>,
}

impl HandshakeRecord {
    pub fn has_capability(&self, flag: u32) -> bool {
        self.capabilities & flag != 0
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn serialize_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_hex(bytes))
}

impl fmt::Display for HandshakeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server_version: {}", self.server_version)?;
        writeln!(f, "connection_id:  {}", self.connection_id)?;
        match self.character_set {
            Some(cs) => writeln!(f, "character_set:  {}", cs)?,
            None => writeln!(f, "character_set:  -")?,
        }
        match self.status {
            Some(st) => writeln!(
                f,
                "status:         0x{:04x} [{}]",
                st,
                status_names(st).join(", ")
            )?,
            None => writeln!(f, "status:         -")?,
        }
        writeln!(
            f,
            "capabilities:   0x{:08x} [{}]",
            self.capabilities,
            capability_names(self.capabilities).join(", ")
        )?;
        writeln!(f, "auth_plugin:    {}", self.auth_plugin.as_deref().unwrap_or("-"))?;
        write!(f, "auth_data:      {} ({} bytes)", to_hex(&self.auth_data), self.auth_data.len())
    }
}

/// Cursor over an immutable buffer. Every field read goes through `take`,
/// which fails with `MissingData` instead of reading past the end.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::MissingData)?;
        let bytes = self.buf.get(self.pos..end).ok_or(DecodeError::MissingData)?;
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn u24_le(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u24(self.take(3)?))
    }

    fn u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// NUL-terminated string. A missing terminator takes the rest of the buffer.
    fn cstr(&mut self) -> Result<String, DecodeError> {
        let rest = self.buf.get(self.pos..).unwrap_or_default();
        let terminator = rest.iter().position(|&b| b == 0);
        let raw = self.take(terminator.unwrap_or(rest.len()))?;
        if terminator.is_some() {
            self.skip(1)?;
        }
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/// Decode a protocol-10 handshake from the raw bytes of a single read,
/// starting at the 4-byte packet header.
pub fn decode(buf: &[u8]) -> Result<HandshakeRecord, DecodeError> {
    let mut r = Reader::new(buf);

    let pkt_len = r.u24_le()? as usize;
    let _seq = r.u8()?;
    let packet_end = pkt_len + 4;
    if packet_end > buf.len() {
        return Err(DecodeError::MissingData);
    }

    let protocol = r.u8()?;
    if protocol != PROTOCOL_VERSION {
        return Err(DecodeError::InvalidProtocol(protocol));
    }

    let server_version = r.cstr()?;
    let connection_id = r.u32_le()?;

    let mut auth_data = r.take(AUTH_DATA_PART1_LEN)?.to_vec();
    r.skip(1)?; // filler

    let mut capabilities = r.u16_le()? as u32;
    let mut character_set = None;
    let mut status = None;
    let mut auth_plugin = None;

    if r.position() < packet_end {
        character_set = Some(r.u8()?);
        status = Some(r.u16_le()?);
        capabilities |= (r.u16_le()? as u32) << 16;

        // Only meaningful with CLIENT_PLUGIN_AUTH; -1 otherwise, which lets the
        // fixed minimum win below.
        let declared = r.u8()?;
        let auth_len: i32 = if capabilities & CLIENT_PLUGIN_AUTH != 0 {
            declared as i32
        } else {
            -1
        };
        r.skip(RESERVED_LEN)?;

        if capabilities & CLIENT_SECURE_CONNECTION != 0 {
            // max(13, len - 8) includes a trailing NUL that is not part of the salt
            let part2_len = ((auth_len - 8).max(AUTH_DATA_PART2_MIN) - 1) as usize;
            auth_data.extend_from_slice(r.take(part2_len)?);
            r.skip(1)?;
        }

        if capabilities & CLIENT_PLUGIN_AUTH != 0 {
            auth_plugin = Some(r.cstr()?);
        }
    }

    Ok(HandshakeRecord {
        server_version,
        connection_id,
        character_set,
        status,
        capabilities,
        auth_plugin,
        auth_data,
    })
}
