//! Configuration register file.
//!
//! 64 byte-addressed slots, 14 of them mapped. The 16-bit logical registers
//! (PERIOD, COMPARE1, COMPARE2, COUNTER_VAL) expose independent LSB/MSB byte
//! views; single-bit registers store bit 0 and read back zero-extended.
//! Unmapped addresses read 0x00 and drop writes. A write to COUNTER_RESET
//! does not store anything: it arms a countdown that holds the counter reset
//! line high for exactly [`RESET_PULSE_TICKS`] internal ticks.

// Register addresses (6-bit instruction address space)
pub const PERIOD_L: u8 = 0x00;
pub const PERIOD_H: u8 = 0x01;
pub const COUNTER_EN: u8 = 0x02;
pub const COMPARE1_L: u8 = 0x03;
pub const COMPARE1_H: u8 = 0x04;
pub const COMPARE2_L: u8 = 0x05;
pub const COMPARE2_H: u8 = 0x06;
pub const COUNTER_RESET: u8 = 0x07;
pub const COUNTER_VAL_L: u8 = 0x08;
pub const COUNTER_VAL_H: u8 = 0x09;
pub const PRESCALE: u8 = 0x0A;
pub const UPNOTDOWN: u8 = 0x0B;
pub const PWM_EN: u8 = 0x0C;
pub const FUNCTIONS: u8 = 0x0D;

/// Width of the counter reset pulse in internal clock ticks.
pub const RESET_PULSE_TICKS: u8 = 2;

pub struct RegisterFile {
    period: u16,
    counter_en: bool,
    compare1: u16,
    compare2: u16,
    prescale: u8,
    up_not_down: bool,
    pwm_en: bool,
    functions: u8,
    reset_countdown: u8,
}

impl RegisterFile {
    /// Power-on defaults: everything zeroed, direction up.
    pub fn new() -> Self {
        RegisterFile {
            period: 0,
            counter_en: false,
            compare1: 0,
            compare2: 0,
            prescale: 0,
            up_not_down: true,
            pwm_en: false,
            functions: 0,
            reset_countdown: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = RegisterFile::new();
    }

    /// Apply one byte write. Called only under the decoder's one-tick write
    /// strobe; unmapped addresses are no-ops.
    pub fn write(&mut self, addr: u8, value: u8) {
        match addr {
            PERIOD_L => self.period = (self.period & 0xFF00) | value as u16,
            PERIOD_H => self.period = (self.period & 0x00FF) | ((value as u16) << 8),
            COUNTER_EN => self.counter_en = value & 1 != 0,
            COMPARE1_L => self.compare1 = (self.compare1 & 0xFF00) | value as u16,
            COMPARE1_H => self.compare1 = (self.compare1 & 0x00FF) | ((value as u16) << 8),
            COMPARE2_L => self.compare2 = (self.compare2 & 0xFF00) | value as u16,
            COMPARE2_H => self.compare2 = (self.compare2 & 0x00FF) | ((value as u16) << 8),
            // Strobe: arms the pulse countdown, restarting any in progress
            COUNTER_RESET => self.reset_countdown = RESET_PULSE_TICKS,
            PRESCALE => self.prescale = value,
            UPNOTDOWN => self.up_not_down = value & 1 != 0,
            PWM_EN => self.pwm_en = value & 1 != 0,
            FUNCTIONS => self.functions = value & 0x03,
            _ => {}
        }
    }

    /// Combinational read multiplexer. `count_val` is the live counter value;
    /// COUNTER_VAL is a view onto it, not stored here. COUNTER_RESET and
    /// unmapped addresses read 0x00.
    pub fn read(&self, addr: u8, count_val: u16) -> u8 {
        match addr {
            PERIOD_L => self.period as u8,
            PERIOD_H => (self.period >> 8) as u8,
            COUNTER_EN => self.counter_en as u8,
            COMPARE1_L => self.compare1 as u8,
            COMPARE1_H => (self.compare1 >> 8) as u8,
            COMPARE2_L => self.compare2 as u8,
            COMPARE2_H => (self.compare2 >> 8) as u8,
            COUNTER_VAL_L => count_val as u8,
            COUNTER_VAL_H => (count_val >> 8) as u8,
            PRESCALE => self.prescale,
            UPNOTDOWN => self.up_not_down as u8,
            PWM_EN => self.pwm_en as u8,
            FUNCTIONS => self.functions,
            _ => 0x00,
        }
    }

    /// Advance the reset-pulse countdown one internal tick. Returns the pulse
    /// level for this tick: high while the countdown is non-zero.
    pub fn reset_pulse_tick(&mut self) -> bool {
        if self.reset_countdown > 0 {
            self.reset_countdown -= 1;
            true
        } else {
            false
        }
    }

    // Typed views consumed by the counter/PWM subsystem

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn counter_enabled(&self) -> bool {
        self.counter_en
    }

    pub fn compare1(&self) -> u16 {
        self.compare1
    }

    pub fn compare2(&self) -> u16 {
        self.compare2
    }

    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    pub fn up_not_down(&self) -> bool {
        self.up_not_down
    }

    pub fn pwm_enabled(&self) -> bool {
        self.pwm_en
    }

    pub fn functions(&self) -> u8 {
        self.functions
    }

    pub fn dbg_info(&self) -> String {
        format!(
            "period={} en={} cmp1={} cmp2={} ps={} up={} pwm_en={} fn={:02b} rst_cd={}",
            self.period, self.counter_en as u8, self.compare1, self.compare2,
            self.prescale, self.up_not_down as u8, self.pwm_en as u8,
            self.functions, self.reset_countdown
        )
    }

    /// Capture state for save state.
    pub fn save_state(&self) -> crate::savestate::RegFileState {
        crate::savestate::RegFileState {
            period: self.period,
            counter_en: self.counter_en,
            compare1: self.compare1,
            compare2: self.compare2,
            prescale: self.prescale,
            up_not_down: self.up_not_down,
            pwm_en: self.pwm_en,
            functions: self.functions,
            reset_countdown: self.reset_countdown,
        }
    }

    /// Restore state from save state.
    pub fn load_state(&mut self, s: &crate::savestate::RegFileState) {
        self.period = s.period;
        self.counter_en = s.counter_en;
        self.compare1 = s.compare1;
        self.compare2 = s.compare2;
        self.prescale = s.prescale;
        self.up_not_down = s.up_not_down;
        self.pwm_en = s.pwm_en;
        self.functions = s.functions;
        self.reset_countdown = s.reset_countdown;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
