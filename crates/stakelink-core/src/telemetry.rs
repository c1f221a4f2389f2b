//! Telemetry interpretation
//!
//! Acceleration reports and time-sync values.

use crate::field::decode_accel_axis;
use crate::{CodecError, DownlinkCommand, Result};
use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};

/// Accelerometer sensitivity: 0.061 mg per LSB
pub const ACCEL_SCALE_G_PER_LSB: f64 = 0.061 / 1000.0;

/// Command byte plus three i16 axes
pub const ACCEL_PAYLOAD_LEN: usize = 7;

/// One three-axis acceleration report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSample {
    pub raw: [i16; 3],
}

impl AccelerationSample {
    /// Decode from a full uplink payload (command byte at offset 0)
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < ACCEL_PAYLOAD_LEN {
            return Err(CodecError::ShortPayload {
                needed: ACCEL_PAYLOAD_LEN,
                have: payload.len(),
            });
        }
        Ok(Self {
            raw: [
                decode_accel_axis(payload[1], payload[2]),
                decode_accel_axis(payload[3], payload[4]),
                decode_accel_axis(payload[5], payload[6]),
            ],
        })
    }

    pub fn x_g(&self) -> f64 {
        self.raw[0] as f64 * ACCEL_SCALE_G_PER_LSB
    }

    pub fn y_g(&self) -> f64 {
        self.raw[1] as f64 * ACCEL_SCALE_G_PER_LSB
    }

    pub fn z_g(&self) -> f64 {
        self.raw[2] as f64 * ACCEL_SCALE_G_PER_LSB
    }
}

/// Fixed UTC offset from whole hours, `None` outside ±23 h
pub fn fixed_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

/// Milliseconds elapsed since midnight of `now`'s own calendar day
pub fn millis_since_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> u32 {
    let time = now.time();
    // nanosecond() exceeds 999_999_999 only inside a leap second
    let millis = time.nanosecond().min(999_999_999) / 1_000_000;
    time.num_seconds_from_midnight() * 1000 + millis
}

/// Time-sync reply for the given instant, measured in `offset`
pub fn time_sync_reply(now: DateTime<Utc>, offset: FixedOffset) -> DownlinkCommand {
    DownlinkCommand::TimeSync(millis_since_midnight(&now.with_timezone(&offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload(x: i16, y: i16, z: i16) -> Vec<u8> {
        let mut payload = vec![crate::code::ACCELERATION_MONITOR];
        payload.extend_from_slice(&x.to_le_bytes());
        payload.extend_from_slice(&y.to_le_bytes());
        payload.extend_from_slice(&z.to_le_bytes());
        payload
    }

    #[test]
    fn test_acceleration_scaling() {
        let sample = AccelerationSample::decode(&sample_payload(100, -50, 200)).unwrap();
        assert_eq!(sample.raw, [100, -50, 200]);
        assert!((sample.x_g() - 100.0 * 0.061 / 1000.0).abs() < 1e-12);
        assert!((sample.y_g() - -50.0 * 0.061 / 1000.0).abs() < 1e-12);
        assert!((sample.z_g() - 200.0 * 0.061 / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_extra_bytes_ignored() {
        let mut payload = sample_payload(1, 2, 3);
        payload.push(0xFF);
        let sample = AccelerationSample::decode(&payload).unwrap();
        assert_eq!(sample.raw, [1, 2, 3]);
    }

    #[test]
    fn test_acceleration_short_payload() {
        let payload = [0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(
            AccelerationSample::decode(&payload),
            Err(CodecError::ShortPayload { needed: 7, have: 6 })
        );
    }

    #[test]
    fn test_millis_since_midnight_in_offset() {
        // 2024-03-01T17:30:15.250Z is 01:30:15.250 the next day at UTC+8
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 15).unwrap()
            + chrono::Duration::milliseconds(250);
        let offset = fixed_offset(8).unwrap();
        let expected = (3600 + 30 * 60 + 15) * 1000 + 250;
        assert_eq!(
            time_sync_reply(now, offset),
            DownlinkCommand::TimeSync(expected)
        );
        assert_eq!(
            time_sync_reply(now, fixed_offset(8).unwrap())
                .encode()
                .as_ref(),
            &(expected as u32).to_be_bytes()
        );
    }

    #[test]
    fn test_midnight_is_zero() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(
            millis_since_midnight(&now.with_timezone(&fixed_offset(8).unwrap())),
            0
        );
    }

    #[test]
    fn test_fixed_offset_bounds() {
        assert!(fixed_offset(8).is_some());
        assert!(fixed_offset(-12).is_some());
        assert!(fixed_offset(24).is_none());
    }
}
