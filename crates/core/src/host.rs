//! Reference SPI host driver and clock-scheduling harness.
//!
//! The model itself only exposes per-domain tick functions; something has to
//! play the part of the external master and of the clock generators. SpiHost
//! bit-bangs full two-byte transactions against a [`SpiTimer`], interleaving
//! a fixed number of internal clock ticks into each serial half-period, and
//! samples MISO at rising edges the way a mode-0 master does. Tests and the
//! frontend drive the device exclusively through it.

use crate::decoder::ADDR_MASK;
use crate::SpiTimer;

/// Instruction-byte direction bit (1 = write).
pub const INSTR_WRITE: u8 = 0x80;

/// Fewest internal ticks per serial half-period that still guarantees a byte
/// event crosses the synchronizer before the next byte starts.
pub const MIN_CLK_PER_PHASE: u32 = 2;

pub struct SpiHost {
    clk_per_phase: u32,
}

impl SpiHost {
    /// `clk_per_phase` is how many internal ticks elapse per serial
    /// half-period; values below [`MIN_CLK_PER_PHASE`] are clamped up to it.
    pub fn new(clk_per_phase: u32) -> Self {
        SpiHost { clk_per_phase: clk_per_phase.max(MIN_CLK_PER_PHASE) }
    }

    fn run_clk(&self, dev: &mut SpiTimer) {
        for _ in 0..self.clk_per_phase {
            dev.clk_tick();
        }
    }

    /// Exchange one byte, MSB-first. Chip-select must already be asserted.
    pub fn transfer(&self, dev: &mut SpiTimer, mosi: u8) -> u8 {
        let mut miso = 0u8;
        for bit in (0..8).rev() {
            // The slave drove MISO at the previous falling edge (or the
            // chip-select preload); sample it at the rising edge.
            miso = (miso << 1) | dev.miso() as u8;
            dev.sclk_rising(mosi & (1 << bit) != 0);
            self.run_clk(dev);
            dev.sclk_falling();
            self.run_clk(dev);
        }
        miso
    }

    /// One full transaction: assert chip-select, send the instruction byte,
    /// exchange the data byte, release chip-select. Returns the data-phase
    /// MISO byte.
    pub fn transaction(&self, dev: &mut SpiTimer, instr: u8, data: u8) -> u8 {
        dev.set_cs(true);
        self.run_clk(dev);
        self.transfer(dev, instr);
        let response = self.transfer(dev, data);
        dev.set_cs(false);
        self.run_clk(dev);
        response
    }

    /// Write one register over the wire.
    pub fn write_reg(&self, dev: &mut SpiTimer, addr: u8, value: u8) {
        self.transaction(dev, INSTR_WRITE | (addr & ADDR_MASK), value);
    }

    /// Read one register over the wire. The value is returned on the
    /// data-phase MISO of the same transaction.
    pub fn read_reg(&self, dev: &mut SpiTimer, addr: u8) -> u8 {
        self.transaction(dev, addr & ADDR_MASK, 0x00)
    }
}

impl Default for SpiHost {
    fn default() -> Self {
        Self::new(4)
    }
}
