//! PWM comparator.
//!
//! A pure function of the enable bit, the two compare thresholds, the
//! waveform-shaping mode bits, and the live counter value. There is no state
//! and no clock dependency; callers re-evaluate whenever an input changes.
//!
//! Modes (FUNCTIONS bits 1:0):
//! - `00` left-aligned: high while `count <= compare1`, with `compare1 == 0`
//!   forcing the output low (no always-high sliver at the wrap boundary)
//! - `01` right-aligned: high while `count >= compare1`
//! - `1x` unaligned: high while `compare1 <= count < compare2`
//!
//! `compare1 == compare2` is a degenerate zero-width configuration and forces
//! the output low in every mode. The counter period is not consulted here.

/// Compute the PWM output level.
pub fn pwm_output(enable: bool, compare1: u16, compare2: u16, functions: u8,
                  count_val: u16) -> bool {
    if !enable || compare1 == compare2 {
        return false;
    }
    match functions & 0x03 {
        0b00 => compare1 != 0 && count_val <= compare1,
        0b01 => count_val >= compare1,
        _ => compare1 <= count_val && count_val < compare2,
    }
}

/// Human-readable mode name for dumps and diagnostics.
pub fn mode_name(functions: u8) -> &'static str {
    match functions & 0x03 {
        0b00 => "left",
        0b01 => "right",
        _ => "unaligned",
    }
}
