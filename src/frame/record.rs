//! Best-position record parsing.
//!
//! The record occupies the 76 bytes immediately after the header:
//!
//! ```text
//! offset  size  field
//!      0     4  sol_status
//!      4     4  pos_type
//!      8     8  lat (degrees, f64)
//!     16     8  lon (degrees, f64)
//!     24     8  height (metres above mean sea level, f64)
//!     32     4  undulation (f32)
//!     36     4  datum_id
//!     40     4  lat_std (f32)
//!     44     4  lon_std (f32)
//!     48     4  height_std (f32)
//!     52     4  station_id
//!     56     4  diff_age (seconds, f32)
//!     60     4  sol_age (seconds, f32)
//!     64     1  sats_tracked
//!     65     1  sats_in_solution
//!     66     3  reserved
//!     69     1  ext_sol_status
//!     70     1  galileo_mask
//!     71     1  signal_mask
//!     72     4  checksum
//! ```
//!
//! Offsets here are relative to `header_len`; [`super::decode`] slices the
//! record span out of the frame before calling [`PositionRecord::parse`], so
//! parsing itself is bounds-free.

use super::wire;
use super::RECORD_LEN;

/// Decoded best-position payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRecord {
    /// Solution status code (0 = solution computed).
    pub sol_status: u32,
    /// Position type code (e.g. 16 = single, 50 = RTK narrow-lane).
    pub pos_type: u32,
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// Height above mean sea level in metres.
    pub height_m: f64,
    /// Undulation: geoid to ellipsoid separation in metres.
    pub undulation: f32,
    /// Datum identifier.
    pub datum_id: u32,
    /// Latitude standard deviation in metres.
    pub lat_std: f32,
    /// Longitude standard deviation in metres.
    pub lon_std: f32,
    /// Height standard deviation in metres.
    pub height_std: f32,
    /// Base station identifier.
    pub station_id: [u8; 4],
    /// Differential correction age in seconds.
    pub diff_age_s: f32,
    /// Solution age in seconds.
    pub sol_age_s: f32,
    /// Satellites tracked.
    pub sats_tracked: u8,
    /// Satellites used in the solution.
    pub sats_in_solution: u8,
    /// Extended solution status bits.
    pub ext_sol_status: u8,
    /// Galileo and BeiDou signal-used mask.
    pub galileo_mask: u8,
    /// GPS and GLONASS signal-used mask.
    pub signal_mask: u8,
    /// Trailing frame checksum as carried on the wire (not verified).
    pub checksum: u32,
}

impl PositionRecord {
    /// Decode a record from exactly [`RECORD_LEN`] bytes.
    ///
    /// Callers guarantee the slice length; [`super::decode`] rejects frames
    /// whose record span crosses the valid region before slicing.
    pub(crate) fn parse(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), RECORD_LEN);

        let mut station_id = [0u8; 4];
        station_id.copy_from_slice(&buf[52..56]);

        Self {
            sol_status: wire::read_u32(buf, 0),
            pos_type: wire::read_u32(buf, 4),
            lat_deg: wire::read_f64(buf, 8),
            lon_deg: wire::read_f64(buf, 16),
            height_m: wire::read_f64(buf, 24),
            undulation: wire::read_f32(buf, 32),
            datum_id: wire::read_u32(buf, 36),
            lat_std: wire::read_f32(buf, 40),
            lon_std: wire::read_f32(buf, 44),
            height_std: wire::read_f32(buf, 48),
            station_id,
            diff_age_s: wire::read_f32(buf, 56),
            sol_age_s: wire::read_f32(buf, 60),
            sats_tracked: buf[64],
            sats_in_solution: buf[65],
            ext_sol_status: buf[69],
            galileo_mask: buf[70],
            signal_mask: buf[71],
            checksum: wire::read_u32(buf, 72),
        }
    }

    /// Append the 76-byte record image; reserved bytes are zeroed.
    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        wire::put_u32(buf, self.sol_status);
        wire::put_u32(buf, self.pos_type);
        wire::put_f64(buf, self.lat_deg);
        wire::put_f64(buf, self.lon_deg);
        wire::put_f64(buf, self.height_m);
        wire::put_f32(buf, self.undulation);
        wire::put_u32(buf, self.datum_id);
        wire::put_f32(buf, self.lat_std);
        wire::put_f32(buf, self.lon_std);
        wire::put_f32(buf, self.height_std);
        buf.extend_from_slice(&self.station_id);
        wire::put_f32(buf, self.diff_age_s);
        wire::put_f32(buf, self.sol_age_s);
        buf.push(self.sats_tracked);
        buf.push(self.sats_in_solution);
        buf.extend_from_slice(&[0, 0, 0]); // reserved
        buf.push(self.ext_sol_status);
        buf.push(self.galileo_mask);
        buf.push(self.signal_mask);
        wire::put_u32(buf, self.checksum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_image_is_record_len() {
        let record = crate::frame::tests::sample_record();
        let mut buf = Vec::new();
        record.write(&mut buf);
        assert_eq!(buf.len(), RECORD_LEN);
    }

    #[test]
    fn doubles_decode_at_documented_offsets() {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[8..16].copy_from_slice(&31.25f64.to_le_bytes());
        buf[16..24].copy_from_slice(&(-117.5f64).to_le_bytes());
        buf[24..32].copy_from_slice(&1082.0f64.to_le_bytes());

        let record = PositionRecord::parse(&buf);
        assert_eq!(record.lat_deg, 31.25);
        assert_eq!(record.lon_deg, -117.5);
        assert_eq!(record.height_m, 1082.0);
    }

    #[test]
    fn tail_bytes_decode_after_reserved_gap() {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[64] = 20;
        buf[65] = 17;
        buf[69] = 0x01;
        buf[70] = 0x0F;
        buf[71] = 0xF0;
        buf[72..76].copy_from_slice(&0xCAFE_F00Du32.to_le_bytes());

        let record = PositionRecord::parse(&buf);
        assert_eq!(record.sats_tracked, 20);
        assert_eq!(record.sats_in_solution, 17);
        assert_eq!(record.ext_sol_status, 0x01);
        assert_eq!(record.galileo_mask, 0x0F);
        assert_eq!(record.signal_mask, 0xF0);
        assert_eq!(record.checksum, 0xCAFE_F00D);
    }
}
