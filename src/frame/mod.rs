//! Binary frame decoding for the positioning sensor.
//!
//! The sensor emits discrete binary frames over its serial link. Each frame is
//! a fixed-layout header followed immediately by a best-position record at
//! offset `header_len`:
//!
//! ```text
//! +--------------------+----------------------------+
//! | FrameHeader        | PositionRecord             |
//! | sync .. reserved   | sol_status .. checksum     |
//! | >= 28 bytes        | 76 bytes                   |
//! +--------------------+----------------------------+
//! 0                    header_len                   header_len + 76
//! ```
//!
//! # Decoding strategy
//!
//! All multi-byte fields are packed little-endian with no alignment padding.
//! Decoding therefore reads every field at an explicit byte offset rather than
//! reinterpreting the buffer as a structure — struct layout and host
//! endianness never leak into the wire format.
//!
//! [`decode`] validates in order: buffer/valid-length sanity, sync marker,
//! header length range, payload bounds. Nothing is read past `valid_len`, and
//! malformed input always yields a typed [`DecodeError`].

mod header;
mod record;

pub use header::FrameHeader;
pub use record::PositionRecord;

use crate::error::DecodeError;

/// Frame sync marker: every valid frame starts with these three bytes.
pub const SYNC: [u8; 3] = [0xAA, 0x44, 0x12];

/// Smallest header the sensor emits; `header_len` may exceed this.
pub const MIN_HEADER_LEN: usize = 28;

/// Fixed span of the position record that follows the header.
pub const RECORD_LEN: usize = 76;

/// A fully decoded frame: header plus the position record it carries.
///
/// Both halves are plain owned values; the source buffer is not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub header: FrameHeader,
    pub record: PositionRecord,
}

/// Decode one frame from `buf`, trusting at most `valid_len` bytes.
///
/// Pure and deterministic; safe to call concurrently on disjoint buffers.
///
/// # Errors
///
/// - [`DecodeError::Truncated`] — `valid_len` exceeds the buffer or is below
///   [`MIN_HEADER_LEN`]
/// - [`DecodeError::BadSync`] — sync marker mismatch
/// - [`DecodeError::HeaderOutOfRange`] — declared `header_len` outside
///   `[MIN_HEADER_LEN, valid_len]`
/// - [`DecodeError::PayloadOutOfRange`] — record would cross `valid_len`
pub fn decode(buf: &[u8], valid_len: usize) -> Result<PositionReport, DecodeError> {
    let header = FrameHeader::parse(buf, valid_len)?;

    let start = header.header_len as usize;
    let needed = start + RECORD_LEN;
    if needed > valid_len {
        return Err(DecodeError::PayloadOutOfRange { needed, valid_len });
    }

    let record = PositionRecord::parse(&buf[start..needed]);
    Ok(PositionReport { header, record })
}

/// Serialize a header and record back to wire bytes.
///
/// Reserved regions are zero-filled, including any header padding between
/// [`MIN_HEADER_LEN`] and `header.header_len`. Used by the mock transport and
/// by round-trip tests; a real sensor produces these frames itself.
pub fn encode_frame(header: &FrameHeader, record: &PositionRecord) -> Vec<u8> {
    let header_len = (header.header_len as usize).max(MIN_HEADER_LEN);
    let mut buf = Vec::with_capacity(header_len + RECORD_LEN);
    header.write(&mut buf);
    buf.resize(header_len, 0);
    record.write(&mut buf);
    buf
}

/// Little-endian field readers/writers shared by the header and record codecs.
///
/// Callers validate bounds before reading; these helpers only convert bytes.
pub(crate) mod wire {
    pub fn read_u16(buf: &[u8], off: usize) -> u16 {
        u16::from_le_bytes([buf[off], buf[off + 1]])
    }

    pub fn read_u32(buf: &[u8], off: usize) -> u32 {
        u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
    }

    pub fn read_f32(buf: &[u8], off: usize) -> f32 {
        f32::from_bits(read_u32(buf, off))
    }

    pub fn read_f64(buf: &[u8], off: usize) -> f64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&buf[off..off + 8]);
        f64::from_le_bytes(raw)
    }

    pub fn put_u16(buf: &mut Vec<u8>, value: u16) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f32(buf: &mut Vec<u8>, value: f32) {
        put_u32(buf, value.to_bits());
    }

    pub fn put_f64(buf: &mut Vec<u8>, value: f64) {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn sample_header(header_len: u8) -> FrameHeader {
        FrameHeader {
            header_len,
            msg_id: 42,
            msg_type: 0,
            msg_len: 72,
            idle_time: 30,
            quality: 4,
            week: 2325,
            ms_of_week: 345_600_000,
            diff_age_sec: 0,
        }
    }

    pub(crate) fn sample_record() -> PositionRecord {
        PositionRecord {
            sol_status: 0,
            pos_type: 50,
            lat_deg: 48.858_093,
            lon_deg: 2.294_694,
            height_m: 96.7,
            undulation: 44.2,
            datum_id: 61,
            lat_std: 0.8,
            lon_std: 0.7,
            height_std: 1.5,
            station_id: *b"AAAA",
            diff_age_s: 0.0,
            sol_age_s: 0.0,
            sats_tracked: 14,
            sats_in_solution: 11,
            ext_sol_status: 0,
            galileo_mask: 0x03,
            signal_mask: 0x33,
            checksum: 0xDEAD_BEEF,
        }
    }

    #[test]
    fn minimal_frame_decodes() {
        let buf = encode_frame(&sample_header(28), &sample_record());
        assert_eq!(buf.len(), MIN_HEADER_LEN + RECORD_LEN);

        let report = decode(&buf, buf.len()).expect("decode");
        assert_eq!(report.header.msg_id, 42);
        assert_eq!(report.record.pos_type, 50);
        assert_eq!(report.record.sats_in_solution, 11);
    }

    #[test]
    fn extended_header_offsets_record() {
        // header_len beyond the minimum shifts the record, not the header fields
        let buf = encode_frame(&sample_header(40), &sample_record());
        assert_eq!(buf.len(), 40 + RECORD_LEN);

        let report = decode(&buf, buf.len()).expect("decode");
        assert_eq!(report.header.header_len, 40);
        assert_eq!(report.record.checksum, 0xDEAD_BEEF);
    }

    #[test]
    fn truncated_below_min_header_is_rejected() {
        let buf = encode_frame(&sample_header(28), &sample_record());
        assert_eq!(
            decode(&buf, 20),
            Err(DecodeError::Truncated { valid_len: 20, buffer_len: buf.len() })
        );
    }

    #[test]
    fn valid_len_beyond_buffer_is_rejected() {
        let buf = encode_frame(&sample_header(28), &sample_record());
        let result = decode(&buf, buf.len() + 1);
        assert_eq!(
            result,
            Err(DecodeError::Truncated { valid_len: buf.len() + 1, buffer_len: buf.len() })
        );
    }

    #[test]
    fn record_crossing_valid_len_is_rejected() {
        let buf = encode_frame(&sample_header(28), &sample_record());
        // Header parses but the record no longer fits.
        assert_eq!(
            decode(&buf, 60),
            Err(DecodeError::PayloadOutOfRange { needed: 28 + RECORD_LEN, valid_len: 60 })
        );
    }

    #[test]
    fn header_len_below_min_is_rejected() {
        let mut buf = encode_frame(&sample_header(28), &sample_record());
        buf[3] = 27;
        assert_eq!(
            decode(&buf, buf.len()),
            Err(DecodeError::HeaderOutOfRange { header_len: 27, min: MIN_HEADER_LEN, valid_len: buf.len() })
        );
    }

    #[test]
    fn header_len_beyond_valid_len_is_rejected() {
        let mut buf = encode_frame(&sample_header(28), &sample_record());
        buf[3] = 255;
        assert_eq!(
            decode(&buf, buf.len()),
            Err(DecodeError::HeaderOutOfRange {
                header_len: 255,
                min: MIN_HEADER_LEN,
                valid_len: buf.len()
            })
        );
    }

    // Property test strategies for generating wire-valid frames
    prop_compose! {
        fn arb_header()(
            header_len in 28u8..=64,
            msg_id in any::<u16>(),
            msg_type in any::<u8>(),
            msg_len in any::<u16>(),
            idle_time in any::<u8>(),
            quality in any::<u8>(),
            week in any::<u16>(),
            ms_of_week in any::<u32>(),
            diff_age_sec in any::<u16>(),
        ) -> FrameHeader {
            FrameHeader {
                header_len,
                msg_id,
                msg_type,
                msg_len,
                idle_time,
                quality,
                week,
                ms_of_week,
                diff_age_sec,
            }
        }
    }

    prop_compose! {
        fn arb_record()(
            sol_status in any::<u32>(),
            pos_type in any::<u32>(),
            lat_deg in any::<f64>(),
            lon_deg in any::<f64>(),
            height_m in any::<f64>(),
            undulation in any::<f32>(),
            datum_id in any::<u32>(),
            lat_std in any::<f32>(),
            lon_std in any::<f32>(),
            height_std in any::<f32>(),
            station_id in any::<[u8; 4]>(),
            diff_age_s in any::<f32>(),
            sol_age_s in any::<f32>(),
            sats_tracked in any::<u8>(),
            sats_in_solution in any::<u8>(),
            ext_sol_status in any::<u8>(),
            galileo_mask in any::<u8>(),
            signal_mask in any::<u8>(),
            checksum in any::<u32>(),
        ) -> PositionRecord {
            PositionRecord {
                sol_status,
                pos_type,
                lat_deg,
                lon_deg,
                height_m,
                undulation,
                datum_id,
                lat_std,
                lon_std,
                height_std,
                station_id,
                diff_age_s,
                sol_age_s,
                sats_tracked,
                sats_in_solution,
                ext_sol_status,
                galileo_mask,
                signal_mask,
                checksum,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_roundtrip_is_bit_exact(header in arb_header(), record in arb_record()) {
            let buf = encode_frame(&header, &record);
            let report = decode(&buf, buf.len()).expect("round-trip decode");

            prop_assert_eq!(&report.header, &header);

            // Floats compared through their bit patterns so NaN payloads count too
            let got = &report.record;
            prop_assert_eq!(got.sol_status, record.sol_status);
            prop_assert_eq!(got.pos_type, record.pos_type);
            prop_assert_eq!(got.lat_deg.to_bits(), record.lat_deg.to_bits());
            prop_assert_eq!(got.lon_deg.to_bits(), record.lon_deg.to_bits());
            prop_assert_eq!(got.height_m.to_bits(), record.height_m.to_bits());
            prop_assert_eq!(got.undulation.to_bits(), record.undulation.to_bits());
            prop_assert_eq!(got.datum_id, record.datum_id);
            prop_assert_eq!(got.lat_std.to_bits(), record.lat_std.to_bits());
            prop_assert_eq!(got.lon_std.to_bits(), record.lon_std.to_bits());
            prop_assert_eq!(got.height_std.to_bits(), record.height_std.to_bits());
            prop_assert_eq!(got.station_id, record.station_id);
            prop_assert_eq!(got.diff_age_s.to_bits(), record.diff_age_s.to_bits());
            prop_assert_eq!(got.sol_age_s.to_bits(), record.sol_age_s.to_bits());
            prop_assert_eq!(got.sats_tracked, record.sats_tracked);
            prop_assert_eq!(got.sats_in_solution, record.sats_in_solution);
            prop_assert_eq!(got.ext_sol_status, record.ext_sol_status);
            prop_assert_eq!(got.galileo_mask, record.galileo_mask);
            prop_assert_eq!(got.signal_mask, record.signal_mask);
            prop_assert_eq!(got.checksum, record.checksum);
        }

        #[test]
        fn prop_every_truncation_fails_cleanly(
            header in arb_header(),
            record in arb_record(),
            cut in 0usize..=100,
        ) {
            let buf = encode_frame(&header, &record);
            let valid_len = cut.min(buf.len().saturating_sub(1));

            let result = decode(&buf, valid_len);
            prop_assert!(result.is_err());

            let header_len = header.header_len as usize;
            let expected = if valid_len < MIN_HEADER_LEN {
                DecodeError::Truncated { valid_len, buffer_len: buf.len() }
            } else if header_len > valid_len {
                DecodeError::HeaderOutOfRange { header_len, min: MIN_HEADER_LEN, valid_len }
            } else {
                DecodeError::PayloadOutOfRange { needed: header_len + RECORD_LEN, valid_len }
            };
            prop_assert_eq!(result.unwrap_err(), expected);
        }

        #[test]
        fn prop_bad_sync_rejected_regardless_of_content(
            sync in any::<[u8; 3]>(),
            header in arb_header(),
            record in arb_record(),
        ) {
            prop_assume!(sync != SYNC);

            let mut buf = encode_frame(&header, &record);
            buf[..3].copy_from_slice(&sync);

            prop_assert_eq!(decode(&buf, buf.len()), Err(DecodeError::BadSync { found: sync }));
        }

        #[test]
        fn prop_arbitrary_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode(&bytes, bytes.len());
        }
    }
}
