//! Frame header parsing and validation.
//!
//! The header is a packed little-endian structure at the start of every frame:
//!
//! ```text
//! offset  size  field
//!      0     3  sync marker (0xAA 0x44 0x12)
//!      3     1  header_len
//!      4     2  msg_id
//!      6     1  msg_type
//!      7     1  reserved
//!      8     2  msg_len
//!     10     2  reserved
//!     12     1  idle_time
//!     13     1  quality
//!     14     2  week (GPS week number)
//!     16     4  ms (milliseconds into the week)
//!     20     4  reserved
//!     24     2  diff_age_sec (differential age, seconds)
//!     26     2  reserved
//! ```
//!
//! `header_len` declares where the payload starts and may exceed the 28-byte
//! minimum; the bytes between 28 and `header_len` are opaque and skipped.
//! Reserved fields are not retained — the encoder writes them back as zero.

use super::wire;
use super::{MIN_HEADER_LEN, SYNC};
use crate::error::DecodeError;

/// Fixed-layout frame header, decoded field by field.
///
/// Invariant (enforced by [`FrameHeader::parse`]): `header_len` lies in
/// `[MIN_HEADER_LEN, valid_len]`, so header reads never touch payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Total header span in bytes; the position record starts here.
    pub header_len: u8,
    /// Message identifier (42 for the best-position message).
    pub msg_id: u16,
    /// Message type / port discriminator.
    pub msg_type: u8,
    /// Declared payload length, excluding header and checksum.
    pub msg_len: u16,
    /// Receiver idle time indicator.
    pub idle_time: u8,
    /// Time quality indicator.
    pub quality: u8,
    /// GPS week number.
    pub week: u16,
    /// Milliseconds into the GPS week.
    pub ms_of_week: u32,
    /// Differential correction age in seconds.
    pub diff_age_sec: u16,
}

impl FrameHeader {
    /// Parse and validate a header from the first `valid_len` bytes of `buf`.
    pub fn parse(buf: &[u8], valid_len: usize) -> Result<Self, DecodeError> {
        if valid_len > buf.len() || valid_len < MIN_HEADER_LEN {
            return Err(DecodeError::Truncated { valid_len, buffer_len: buf.len() });
        }

        let found = [buf[0], buf[1], buf[2]];
        if found != SYNC {
            return Err(DecodeError::BadSync { found });
        }

        let header_len = buf[3];
        let span = header_len as usize;
        if span < MIN_HEADER_LEN || span > valid_len {
            return Err(DecodeError::HeaderOutOfRange {
                header_len: span,
                min: MIN_HEADER_LEN,
                valid_len,
            });
        }

        Ok(Self {
            header_len,
            msg_id: wire::read_u16(buf, 4),
            msg_type: buf[6],
            msg_len: wire::read_u16(buf, 8),
            idle_time: buf[12],
            quality: buf[13],
            week: wire::read_u16(buf, 14),
            ms_of_week: wire::read_u32(buf, 16),
            diff_age_sec: wire::read_u16(buf, 24),
        })
    }

    /// Append the minimum 28-byte header image; reserved fields are zeroed.
    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&SYNC);
        buf.push(self.header_len);
        wire::put_u16(buf, self.msg_id);
        buf.push(self.msg_type);
        buf.push(0); // reserved
        wire::put_u16(buf, self.msg_len);
        wire::put_u16(buf, 0); // reserved
        buf.push(self.idle_time);
        buf.push(self.quality);
        wire::put_u16(buf, self.week);
        wire::put_u32(buf, self.ms_of_week);
        wire::put_u32(buf, 0); // reserved
        wire::put_u16(buf, self.diff_age_sec);
        wire::put_u16(buf, 0); // reserved
    }
}
