//! # spitimer-core
//!
//! Cycle-accurate behavioral model of a small memory-mapped peripheral: an
//! SPI slave front-end exposing a byte-oriented register interface, backing a
//! programmable up/down counter/timer and a configurable PWM waveform
//! generator.
//!
//! The model replaces physical flip-flops with explicit per-domain tick
//! functions: the caller's scheduling harness invokes one set on serial-clock
//! transitions (driven by an untrusted, asynchronous master) and another on
//! internal-clock ticks. Completed bytes cross between the two domains only
//! through an explicitly modeled 2-stage synchronizer, never by direct reads
//! of the other domain's state.
//!
//! ## Architecture
//!
//! - [`SpiTimer`] — Top-level device that wires bridge, decoder, register
//!   file and counter together and exposes the per-domain tick entry points
//! - [`ClockDomainBridge`] — Serial bit framing and the byte-event
//!   synchronizer chain
//! - [`InstructionDecoder`] — Two-phase (instruction, data) protocol decoder
//! - [`RegisterFile`] — Address-mapped configuration storage with the
//!   counter reset-pulse generator
//! - [`CounterEngine`] — Prescaled up/down counter
//! - [`pwm`] — Stateless PWM comparator
//! - [`SpiHost`] — Reference bit-banging master and clock-interleaving
//!   harness used by tests and the frontend
//! - [`savestate`] — Bit-exact device checkpointing to a compressed file
//!
//! ## Wire protocol
//!
//! MSB-first, 8 bits per byte, two bytes per transaction with chip-select
//! held asserted throughout: an instruction byte (bit 7 = direction,
//! 1 = write; bit 6 = high/low select, reserved; bits 5:0 = register
//! address), then a data byte. Writes carry the data byte on MOSI; reads
//! return the addressed register on the data-phase MISO.
//!
//! ## Rate bound
//!
//! The synchronizer observes at most one byte completion per round-trip of
//! [`SYNC_LATENCY_TICKS`] internal ticks; see [`max_sclk_hz`] for the
//! resulting ceiling on the serial clock.

pub mod bridge;
pub mod counter;
pub mod decoder;
pub mod host;
pub mod pwm;
pub mod regfile;
pub mod savestate;

pub use bridge::{max_sclk_hz, ClockDomainBridge, FrameState, SYNC_LATENCY_TICKS};
pub use counter::CounterEngine;
pub use decoder::{DecodeState, InstructionDecoder};
pub use host::{SpiHost, INSTR_WRITE, MIN_CLK_PER_PHASE};
pub use regfile::RegisterFile;

/// Byte-addressed register slots reachable through the 6-bit address field.
pub const NUM_REG_SLOTS: usize = 64;

/// Main device model combining all subsystems.
pub struct SpiTimer {
    pub bridge: ClockDomainBridge,
    pub decoder: InstructionDecoder,
    pub regs: RegisterFile,
    pub counter: CounterEngine,
    cs_active: bool,
    /// Internal clock tick counter
    pub tick: u64,
    /// Debug counter: byte events delivered since reset
    pub dbg_byte_events: u64,
    /// Enable debug output (eprintln)
    pub debug: bool,
}

impl SpiTimer {
    /// Create a new device with all components in reset state.
    pub fn new() -> Self {
        SpiTimer {
            bridge: ClockDomainBridge::new(),
            decoder: InstructionDecoder::new(),
            regs: RegisterFile::new(),
            counter: CounterEngine::new(),
            cs_active: false,
            tick: 0,
            dbg_byte_events: 0,
            debug: false,
        }
    }

    /// Reset all components to power-on state.
    pub fn reset(&mut self) {
        self.bridge.reset();
        self.decoder.reset();
        self.regs.reset();
        self.counter.reset();
        self.cs_active = false;
        self.tick = 0;
        self.dbg_byte_events = 0;
        // Note: debug flag is NOT cleared on reset
    }

    /// Chip-select edge, immediate effect: evaluated before any clocked
    /// logic. Assertion preloads the first MISO bit; release discards any
    /// partial byte.
    pub fn set_cs(&mut self, active: bool) {
        if active == self.cs_active {
            return;
        }
        self.cs_active = active;
        if active {
            self.bridge.select(self.decoder.output_byte());
        } else {
            self.bridge.deselect();
        }
    }

    pub fn cs_active(&self) -> bool {
        self.cs_active
    }

    /// Serial-clock rising edge (SPI domain): sample MOSI.
    pub fn sclk_rising(&mut self, mosi: bool) {
        self.bridge.sclk_rising(mosi, self.cs_active);
    }

    /// Serial-clock falling edge (SPI domain): drive the next MISO bit.
    pub fn sclk_falling(&mut self) {
        self.bridge.sclk_falling(self.cs_active, self.decoder.output_byte());
    }

    /// Current MISO line level.
    pub fn miso(&self) -> bool {
        self.bridge.miso()
    }

    /// One internal clock tick. Intra-tick order follows the data
    /// dependencies: synchronizer update and byte-event detection, decoder
    /// step (which performs the register access), reset-pulse countdown,
    /// counter tick. PWM is combinational and recomputed on demand.
    pub fn clk_tick(&mut self) {
        if let Some(byte) = self.bridge.clk_tick() {
            self.dbg_byte_events += 1;
            if self.debug {
                eprintln!("[spitimer] t={} byte=0x{:02X} {}", self.tick, byte, self.decoder.dbg_info());
            }
            self.decoder.on_byte(byte, &mut self.regs, self.counter.value());
        }
        let reset_pulse = self.regs.reset_pulse_tick();
        self.counter.tick(
            self.regs.counter_enabled(),
            reset_pulse,
            self.regs.up_not_down(),
            self.regs.period(),
            self.regs.prescale(),
        );
        self.tick += 1;
    }

    /// Run `n` internal clock ticks.
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.clk_tick();
        }
    }

    /// Live counter value (COUNTER_VAL view).
    pub fn count_val(&self) -> u16 {
        self.counter.value()
    }

    /// Current PWM output level (combinational).
    pub fn pwm_output(&self) -> bool {
        pwm::pwm_output(
            self.regs.pwm_enabled(),
            self.regs.compare1(),
            self.regs.compare2(),
            self.regs.functions(),
            self.counter.value(),
        )
    }

    /// Serial framing state for inspection.
    pub fn frame_state(&self) -> FrameState {
        self.bridge.frame_state(self.cs_active)
    }

    pub fn dbg_info(&self) -> String {
        format!(
            "t={} cs={} events={} | {} | {} | {} | {} pwm={}",
            self.tick, self.cs_active as u8, self.dbg_byte_events,
            self.bridge.dbg_info(), self.decoder.dbg_info(),
            self.regs.dbg_info(), self.counter.dbg_info(),
            self.pwm_output() as u8
        )
    }

    /// Capture the full device state.
    pub fn save_state(&self) -> savestate::SaveState {
        savestate::SaveState {
            bridge: self.bridge.save_state(),
            decoder: self.decoder.save_state(),
            regs: self.regs.save_state(),
            counter: self.counter.save_state(),
            cs_active: self.cs_active,
            tick: self.tick,
        }
    }

    /// Restore the full device state.
    pub fn load_state(&mut self, s: &savestate::SaveState) {
        self.bridge.load_state(&s.bridge);
        self.decoder.load_state(&s.decoder);
        self.regs.load_state(&s.regs);
        self.counter.load_state(&s.counter);
        self.cs_active = s.cs_active;
        self.tick = s.tick;
        self.dbg_byte_events = 0;
    }
}

impl Default for SpiTimer {
    fn default() -> Self {
        Self::new()
    }
}
