//! Instruction/data protocol decoder.
//!
//! Consumes byte events from the bridge and interprets them as a two-byte
//! protocol: the first byte of a transaction is the instruction (direction,
//! high/low select, 6-bit address), the second is write data. A read latches
//! the register value into the outgoing MISO buffer during the instruction
//! phase; the buffer starts shifting out one transaction pipeline stage later
//! than the instruction that requested it, and that latency is part of the
//! protocol contract.

use crate::regfile::RegisterFile;

/// Instruction byte layout
const DIR_WRITE: u8 = 0x80;
const HIGH_LOW_SELECT: u8 = 0x40;
pub const ADDR_MASK: u8 = 0x3F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for an instruction byte.
    Setup,
    /// Waiting for the data byte of the current instruction.
    Data,
}

pub struct InstructionDecoder {
    state: DecodeState,
    write_pending: bool,
    high_low: bool,
    addr: u8,
    /// Read-result buffer, shifted out on MISO by the bridge.
    data_out: u8,
    /// Debug counter: register reads issued since reset
    pub dbg_reads: u64,
    /// Debug counter: register writes issued since reset
    pub dbg_writes: u64,
}

impl InstructionDecoder {
    pub fn new() -> Self {
        InstructionDecoder {
            state: DecodeState::Setup,
            write_pending: false,
            high_low: false,
            addr: 0,
            data_out: 0,
            dbg_reads: 0,
            dbg_writes: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = InstructionDecoder::new();
    }

    /// Process one byte event.
    ///
    /// Issues exactly one register-file access per two-byte transaction: a
    /// read during the instruction phase, or a write (with a one-tick strobe)
    /// during the data phase. `count_val` is the live counter value routed
    /// into the read multiplexer.
    pub fn on_byte(&mut self, byte: u8, regs: &mut RegisterFile, count_val: u16) {
        match self.state {
            DecodeState::Setup => {
                self.write_pending = byte & DIR_WRITE != 0;
                self.high_low = byte & HIGH_LOW_SELECT != 0;
                self.addr = byte & ADDR_MASK;
                if self.write_pending {
                    // Nothing to return for a write
                    self.data_out = 0;
                } else {
                    self.data_out = regs.read(self.addr, count_val);
                    self.dbg_reads += 1;
                }
                self.state = DecodeState::Data;
            }
            DecodeState::Data => {
                if self.write_pending {
                    regs.write(self.addr, byte);
                    self.dbg_writes += 1;
                }
                self.state = DecodeState::Setup;
            }
        }
    }

    /// Byte currently presented to the bridge for MISO output.
    pub fn output_byte(&self) -> u8 {
        self.data_out
    }

    /// Current protocol state for inspection.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn dbg_info(&self) -> String {
        format!(
            "state={:?} write_pending={} addr=0x{:02X} data_out=0x{:02X} reads={} writes={}",
            self.state, self.write_pending, self.addr, self.data_out,
            self.dbg_reads, self.dbg_writes
        )
    }

    /// Capture state for save state.
    pub fn save_state(&self) -> crate::savestate::DecoderState {
        crate::savestate::DecoderState {
            in_data_phase: self.state == DecodeState::Data,
            write_pending: self.write_pending,
            high_low: self.high_low,
            addr: self.addr,
            data_out: self.data_out,
        }
    }

    /// Restore state from save state.
    pub fn load_state(&mut self, s: &crate::savestate::DecoderState) {
        self.state = if s.in_data_phase { DecodeState::Data } else { DecodeState::Setup };
        self.write_pending = s.write_pending;
        self.high_low = s.high_low;
        self.addr = s.addr;
        self.data_out = s.data_out;
        self.dbg_reads = 0;
        self.dbg_writes = 0;
    }
}

impl Default for InstructionDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regfile;

    #[test]
    fn test_write_transaction() {
        let mut d = InstructionDecoder::new();
        let mut regs = RegisterFile::new();
        d.on_byte(DIR_WRITE | regfile::PRESCALE, &mut regs, 0);
        assert_eq!(d.state(), DecodeState::Data);
        // No access yet: the write waits for the data byte
        assert_eq!(d.dbg_writes, 0);
        d.on_byte(0x07, &mut regs, 0);
        assert_eq!(d.state(), DecodeState::Setup);
        assert_eq!(regs.prescale(), 0x07);
        assert_eq!(d.dbg_writes, 1);
        assert_eq!(d.dbg_reads, 0);
    }

    #[test]
    fn test_read_latches_in_setup_phase() {
        let mut d = InstructionDecoder::new();
        let mut regs = RegisterFile::new();
        regs.write(regfile::PRESCALE, 0x42);
        d.on_byte(regfile::PRESCALE, &mut regs, 0);
        // Result is latched immediately, to be shifted on the next MISO phase
        assert_eq!(d.output_byte(), 0x42);
        assert_eq!(d.dbg_reads, 1);
        // The data byte of a read issues no further access
        d.on_byte(0xFF, &mut regs, 0);
        assert_eq!(d.dbg_reads, 1);
        assert_eq!(d.dbg_writes, 0);
        assert_eq!(regs.prescale(), 0x42);
    }

    #[test]
    fn test_write_clears_output_buffer() {
        let mut d = InstructionDecoder::new();
        let mut regs = RegisterFile::new();
        regs.write(regfile::PRESCALE, 0x42);
        d.on_byte(regfile::PRESCALE, &mut regs, 0);
        d.on_byte(0x00, &mut regs, 0);
        assert_eq!(d.output_byte(), 0x42);
        // A write instruction has no data to return
        d.on_byte(DIR_WRITE | regfile::PERIOD_L, &mut regs, 0);
        assert_eq!(d.output_byte(), 0x00);
        d.on_byte(0x10, &mut regs, 0);
    }

    #[test]
    fn test_counter_val_read_uses_live_value() {
        let mut d = InstructionDecoder::new();
        let mut regs = RegisterFile::new();
        d.on_byte(regfile::COUNTER_VAL_L, &mut regs, 0x1234);
        assert_eq!(d.output_byte(), 0x34);
        d.on_byte(0x00, &mut regs, 0x1234);
        d.on_byte(regfile::COUNTER_VAL_H, &mut regs, 0x1234);
        assert_eq!(d.output_byte(), 0x12);
    }

    #[test]
    fn test_instruction_overwritten_by_next_setup() {
        let mut d = InstructionDecoder::new();
        let mut regs = RegisterFile::new();
        d.on_byte(DIR_WRITE | regfile::PERIOD_L, &mut regs, 0);
        d.on_byte(0xAA, &mut regs, 0);
        // Second transaction targets a different register
        d.on_byte(DIR_WRITE | regfile::PERIOD_H, &mut regs, 0);
        d.on_byte(0x01, &mut regs, 0);
        assert_eq!(regs.period(), 0x01AA);
    }
}
