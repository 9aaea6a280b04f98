//! spitimer headless frontend.
//!
//! Drives the peripheral model through its reference SPI host and prints what
//! the hardware would do. Two execution modes:
//!
//! - **Demo mode** (default): programs a PWM configuration over the wire,
//!   runs the internal clock, and prints the counter/PWM waveform.
//! - **Script mode** (`--script FILE`): line-oriented command file:
//!   `write ADDR VAL`, `read ADDR`, `run N`, `reset`, `dump`; `#` comments.
//!
//! Options: `--ticks N` demo run length, `--save FILE` / `--load FILE`
//! savestate round-trip, `--clk-per-phase N` internal ticks per serial
//! half-period, `--debug` core diagnostics on stderr.

use spitimer_core::{regfile, savestate, SpiHost, SpiTimer};
use std::env;
use std::fs;
use std::path::Path;
use std::process::exit;

/// Waveform ticks printed per output row.
const ROW_TICKS: usize = 64;

fn usage() -> ! {
    eprintln!("Usage: spitimer-cli [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --script FILE         run a command script instead of the demo");
    eprintln!("  --ticks N             demo run length in internal ticks (default 64)");
    eprintln!("  --clk-per-phase N     internal ticks per serial half-period (default 4)");
    eprintln!("  --save FILE           save device state after the run");
    eprintln!("  --load FILE           load device state before the run");
    eprintln!("  --debug               verbose core diagnostics on stderr");
    eprintln!("  --help                this text");
    exit(1);
}

/// Parse a decimal or 0x-prefixed hex number.
fn parse_num(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("bad number '{}': {}", s, e))
    } else {
        s.parse().map_err(|e| format!("bad number '{}': {}", s, e))
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
    }

    let debug = args.iter().any(|a| a == "--debug");
    let ticks = match flag_value(&args, "--ticks") {
        Some(s) => parse_num(&s).unwrap_or_else(|e| { eprintln!("{}", e); exit(1) }),
        None => 64,
    };
    let clk_per_phase = match flag_value(&args, "--clk-per-phase") {
        Some(s) => parse_num(&s).unwrap_or_else(|e| { eprintln!("{}", e); exit(1) }) as u32,
        None => 4,
    };

    let mut dev = SpiTimer::new();
    dev.debug = debug;
    let host = SpiHost::new(clk_per_phase);

    if let Some(path) = flag_value(&args, "--load") {
        match savestate::load_from_file(Path::new(&path)) {
            Ok(state) => {
                dev.load_state(&state);
                if debug { eprintln!("Loaded state from {}", path); }
            }
            Err(e) => { eprintln!("Load error: {}", e); exit(1); }
        }
    }

    let result = match flag_value(&args, "--script") {
        Some(path) => run_script(&path, &mut dev, &host),
        None => { run_demo(&mut dev, &host, ticks); Ok(()) }
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        exit(1);
    }

    if let Some(path) = flag_value(&args, "--save") {
        match savestate::save_to_file(&dev.save_state(), Path::new(&path)) {
            Ok(()) => { if debug { eprintln!("Saved state to {}", path); } }
            Err(e) => { eprintln!("Save error: {}", e); exit(1); }
        }
    }
}

// ─── Demo Mode ──────────────────────────────────────────────────────────────

/// Program an unaligned PWM window over the wire and show the waveform.
fn run_demo(dev: &mut SpiTimer, host: &SpiHost, ticks: u64) {
    println!("spitimer demo: period=9, compare1=2, compare2=7, unaligned PWM");
    host.write_reg(dev, regfile::PERIOD_L, 9);
    host.write_reg(dev, regfile::COMPARE1_L, 2);
    host.write_reg(dev, regfile::COMPARE2_L, 7);
    host.write_reg(dev, regfile::FUNCTIONS, 0b10);
    host.write_reg(dev, regfile::PWM_EN, 1);
    host.write_reg(dev, regfile::COUNTER_RESET, 1);
    host.write_reg(dev, regfile::COUNTER_EN, 1);

    print_waveform(dev, ticks);
    dump_registers(dev, host);
}

/// Run `ticks` internal clock ticks, printing count and PWM rows.
fn print_waveform(dev: &mut SpiTimer, ticks: u64) {
    let mut t = 0u64;
    while t < ticks {
        let chunk = ROW_TICKS.min((ticks - t) as usize);
        let mut counts = String::with_capacity(chunk);
        let mut wave = String::with_capacity(chunk);
        for _ in 0..chunk {
            dev.clk_tick();
            counts.push(char::from_digit((dev.count_val() % 16) as u32, 16).unwrap_or('?'));
            wave.push(if dev.pwm_output() { '#' } else { '.' });
        }
        println!("t={:>6}  count {}", t, counts);
        println!("          pwm   {}", wave);
        t += chunk as u64;
    }
}

/// Read every mapped register back over the wire.
fn dump_registers(dev: &mut SpiTimer, host: &SpiHost) {
    let named: &[(u8, &str)] = &[
        (regfile::PERIOD_L, "PERIOD_L"),
        (regfile::PERIOD_H, "PERIOD_H"),
        (regfile::COUNTER_EN, "COUNTER_EN"),
        (regfile::COMPARE1_L, "COMPARE1_L"),
        (regfile::COMPARE1_H, "COMPARE1_H"),
        (regfile::COMPARE2_L, "COMPARE2_L"),
        (regfile::COMPARE2_H, "COMPARE2_H"),
        (regfile::COUNTER_RESET, "COUNTER_RESET"),
        (regfile::COUNTER_VAL_L, "COUNTER_VAL_L"),
        (regfile::COUNTER_VAL_H, "COUNTER_VAL_H"),
        (regfile::PRESCALE, "PRESCALE"),
        (regfile::UPNOTDOWN, "UPNOTDOWN"),
        (regfile::PWM_EN, "PWM_EN"),
        (regfile::FUNCTIONS, "FUNCTIONS"),
    ];
    println!();
    println!("Register dump (read over SPI):");
    for (addr, name) in named {
        let value = host.read_reg(dev, *addr);
        println!("  0x{:02X} {:<14} = 0x{:02X}", addr, name, value);
    }
}

// ─── Script Mode ────────────────────────────────────────────────────────────

fn run_script(path: &str, dev: &mut SpiTimer, host: &SpiHost) -> Result<(), String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("script {}: {}", path, e))?;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let err = |msg: String| format!("{}:{}: {}", path, lineno + 1, msg);
        match words[0] {
            "write" if words.len() == 3 => {
                let addr = parse_num(words[1]).map_err(err)? as u8;
                let value = parse_num(words[2]).map_err(err)? as u8;
                host.write_reg(dev, addr, value);
            }
            "read" if words.len() == 2 => {
                let addr = parse_num(words[1]).map_err(err)? as u8;
                let value = host.read_reg(dev, addr);
                println!("read 0x{:02X} = 0x{:02X}", addr, value);
            }
            "run" if words.len() == 2 => {
                let n = parse_num(words[1]).map_err(err)?;
                print_waveform(dev, n);
            }
            "reset" if words.len() == 1 => dev.reset(),
            "dump" if words.len() == 1 => dump_registers(dev, host),
            other => {
                return Err(err(format!("unknown command '{}'", other)));
            }
        }
    }
    Ok(())
}
