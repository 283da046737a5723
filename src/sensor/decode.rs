/// Fixed-point decoding of MPL3115A2 output frames
///
/// Every data read returns the same 5-byte frame: bytes 0-2 hold the
/// pressure/altitude channel, bytes 3-4 the temperature channel. Which
/// fixed-point format applies to bytes 0-2 depends on the measurement mode
/// the control register was put in before the read:
///
/// - altimeter mode: Q16.4, signed 20-bit field, 0.0625 m per LSB
/// - barometer mode: Q18.2, unsigned 20-bit field, 0.25 Pa per LSB
///
/// The temperature channel is always Q12.4, signed 12-bit, 0.0625 C per LSB.
/// All functions here are pure arithmetic; no I/O.
use crate::models::PressureUnit;

/// Pascals per inch of mercury.
pub const PA_PER_INHG: f64 = 3386.389;
/// Inches of mercury per kilopascal.
pub const INHG_PER_KPA: f64 = 0.29530099194;

/// Decode altitude in meters from a 5-byte output frame.
///
/// The 20-bit field spans bytes 0-2, right-justified by a 4-bit shift.
/// Values above 0x7FFFF are negative (two's complement at bit 19).
pub fn altitude_m(frame: &[u8; 5]) -> f64 {
    let raw = ((frame[0] as u32) << 16 | (frame[1] as u32) << 8 | frame[2] as u32) >> 4;
    let signed = if raw > 0x7FFFF {
        raw as i32 - 0x10_0000
    } else {
        raw as i32
    };
    signed as f64 * 0.0625
}

/// Decode pressure in Pascals from a 5-byte output frame.
///
/// Same 20-bit field as altitude but unsigned Q18.2.
pub fn pressure_pa(frame: &[u8; 5]) -> f64 {
    let raw = ((frame[0] as u32) << 16 | (frame[1] as u32) << 8 | frame[2] as u32) >> 4;
    raw as f64 * 0.25
}

/// Decode temperature in degrees Celsius from a 5-byte output frame.
///
/// The 12-bit field spans bytes 3-4; values above 0x7FF are negative.
pub fn temperature_c(frame: &[u8; 5]) -> f64 {
    let raw = ((frame[3] as u32) << 8 | frame[4] as u32) >> 4;
    let signed = if raw > 0x7FF {
        raw as i32 - 0x1000
    } else {
        raw as i32
    };
    signed as f64 * 0.0625
}

/// Build the 2-byte BAR_IN register image for a barometric offset.
///
/// The register LSB equals 2.0 Pascals, so the offset is converted to
/// Pascals and halved before rounding. MSB first.
pub fn encode_pressure_offset(offset: f64, unit: PressureUnit) -> [u8; 2] {
    let pa_per_unit = match unit {
        PressureUnit::KiloPascals => 1000.0,
        PressureUnit::InchesHg => PA_PER_INHG,
    };
    let pascals_div2 = (offset * pa_per_unit / 2.0).round() as u16;
    [(pascals_div2 >> 8) as u8, (pascals_div2 & 0xFF) as u8]
}

pub fn fahrenheit_from_celsius(temp_c: f64) -> f64 {
    1.8 * temp_c + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_decodes_to_zero() {
        let frame = [0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(altitude_m(&frame), 0.0);
        assert_eq!(pressure_pa(&frame), 0.0);
        assert_eq!(temperature_c(&frame), 0.0);
    }

    #[test]
    fn altitude_decodes_positive() {
        // Field 0x001900 >> 4 = 0x190 = 400 LSB, 400 * 0.0625 = 25.0 m
        let frame = [0x00, 0x19, 0x00, 0x00, 0x00];
        assert_eq!(altitude_m(&frame), 25.0);
    }

    #[test]
    fn altitude_sign_extends() {
        // Raw field 0xFFFFF is -1 LSB
        let frame = [0xFF, 0xFF, 0xF0, 0x00, 0x00];
        assert_eq!(altitude_m(&frame), -0.0625);
        // Raw field 0x80000 is the most negative value, -2^19 LSB
        let frame = [0x80, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(altitude_m(&frame), -(1 << 19) as f64 * 0.0625);
    }

    #[test]
    fn pressure_is_unsigned() {
        // Same bit pattern as the negative altitude case decodes positive
        let frame = [0xFF, 0xFF, 0xF0, 0x00, 0x00];
        assert_eq!(pressure_pa(&frame), 0xFFFFF as f64 * 0.25);
    }

    #[test]
    fn pressure_decodes_sea_level() {
        // 101325 Pa = 405300 LSB = 0x62F34, shifted left 4 in the frame
        let frame = [0x62, 0xF3, 0x40, 0x00, 0x00];
        assert_eq!(pressure_pa(&frame), 101325.0);
    }

    #[test]
    fn temperature_decodes_both_signs() {
        // 0x190 = 400 LSB = 25.0 C
        let frame = [0x00, 0x00, 0x00, 0x19, 0x00];
        assert_eq!(temperature_c(&frame), 25.0);
        // 0xFFF = -1 LSB
        let frame = [0x00, 0x00, 0x00, 0xFF, 0xF0];
        assert_eq!(temperature_c(&frame), -0.0625);
    }

    #[test]
    fn offset_encodes_kilopascals() {
        // 101.325 kPa -> round(101325 / 2) = 50663 = 0xC5E7
        let bytes = encode_pressure_offset(101.325, PressureUnit::KiloPascals);
        assert_eq!(bytes, [0xC5, 0xE7]);
    }

    #[test]
    fn offset_round_trips_within_register_resolution() {
        for &(offset, unit) in &[
            (101.325, PressureUnit::KiloPascals),
            (98.415, PressureUnit::KiloPascals),
            (29.92, PressureUnit::InchesHg),
        ] {
            let pa_per_unit = match unit {
                PressureUnit::KiloPascals => 1000.0,
                PressureUnit::InchesHg => PA_PER_INHG,
            };
            let bytes = encode_pressure_offset(offset, unit);
            let stored_pa = ((bytes[0] as u16) << 8 | bytes[1] as u16) as f64 * 2.0;
            // The register LSB is 2 Pa, so half of that is the worst case.
            assert!((stored_pa - offset * pa_per_unit).abs() <= 1.0);
        }
    }

    #[test]
    fn unit_conversions_agree() {
        // kPa -> inHg through the direct factor matches Pa / PA_PER_INHG
        let kpa = 101.325;
        let via_factor = kpa * INHG_PER_KPA;
        let via_pa = kpa * 1000.0 / PA_PER_INHG;
        assert!((via_factor - via_pa).abs() < 1e-6);
        assert_eq!(fahrenheit_from_celsius(0.0), 32.0);
        assert_eq!(fahrenheit_from_celsius(100.0), 212.0);
    }
}
