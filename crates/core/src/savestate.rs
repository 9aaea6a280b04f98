//! Save state (capture / restore) for the peripheral model.
//!
//! Captures the full device state to a file using bincode serialization with
//! deflate compression, so a long-running simulation can be checkpointed and
//! resumed bit-exactly — including a transaction that is mid-byte on the
//! serial side.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "SPTS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes identifying a spitimer save state file.
const MAGIC: &[u8; 4] = b"SPTS";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;

// ─── Per-component state structs ────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BridgeState {
    pub bit_pos: u8,
    pub shift: u8,
    pub captured: u8,
    pub byte_count: u8,
    pub sync1: u8,
    pub sync2: u8,
    pub prev: u8,
    pub miso: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecoderState {
    pub in_data_phase: bool,
    pub write_pending: bool,
    pub high_low: bool,
    pub addr: u8,
    pub data_out: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegFileState {
    pub period: u16,
    pub counter_en: bool,
    pub compare1: u16,
    pub compare2: u16,
    pub prescale: u8,
    pub up_not_down: bool,
    pub pwm_en: bool,
    pub functions: u8,
    pub reset_countdown: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterState {
    pub value: u16,
    pub prescale_acc: u16,
}

// ─── Top-level save state ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    pub bridge: BridgeState,
    pub decoder: DecoderState,
    pub regs: RegFileState,
    pub counter: CounterState,
    pub cs_active: bool,
    pub tick: u64,
}

// ─── File I/O ───────────────────────────────────────────────────────────────

/// Save state to file with header and deflate compression.
pub fn save_to_file(state: &SaveState, path: &Path) -> Result<(), String> {
    let payload = bincode::serialize(state)
        .map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(8 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);

    std::fs::write(path, &out)
        .map_err(|e| format!("Write error: {}", e))
}

/// Load state from file, verifying magic and version.
pub fn load_from_file(path: &Path) -> Result<SaveState, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Read error: {}", e))?;

    if data.len() < 8 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid save state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!("Unsupported save state version {} (expected {})",
            version, FORMAT_VERSION));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[8..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    bincode::deserialize(&decompressed)
        .map_err(|e| format!("Deserialize error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SpiHost, SpiTimer};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spitimer-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_file_round_trip() {
        let mut dev = SpiTimer::new();
        let host = SpiHost::default();
        host.write_reg(&mut dev, crate::regfile::PERIOD_L, 9);
        host.write_reg(&mut dev, crate::regfile::COUNTER_EN, 1);
        for _ in 0..3 {
            dev.clk_tick();
        }

        let path = temp_path("round-trip.state");
        save_to_file(&dev.save_state(), &path).expect("save");

        let loaded = load_from_file(&path).expect("load");
        let mut restored = SpiTimer::new();
        restored.load_state(&loaded);
        assert_eq!(restored.count_val(), dev.count_val());
        assert_eq!(restored.tick, dev.tick);

        // Both instances must evolve identically from here
        for _ in 0..20 {
            dev.clk_tick();
            restored.clk_tick();
            assert_eq!(restored.count_val(), dev.count_val());
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_bad_magic_rejected() {
        let path = temp_path("bad-magic.state");
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00rest").expect("write");
        assert!(load_from_file(&path).unwrap_err().contains("magic"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_bad_version_rejected() {
        let path = temp_path("bad-version.state");
        let mut data = Vec::new();
        data.extend_from_slice(b"SPTS");
        data.extend_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, &data).expect("write");
        assert!(load_from_file(&path).unwrap_err().contains("version"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_truncated_file_rejected() {
        let path = temp_path("truncated.state");
        std::fs::write(&path, b"SPT").expect("write");
        assert!(load_from_file(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
