use clap::Parser;
use env_logger::Env;
use mos6510_emu::Mos6510;
use mos6510_emu::bus::BusInterface;
use mos6510_emu::config::Mos6510Config;
use mos6510_emu::debug::CpuSnapshot;
use mos6510_emu::opcodes::{self, Operation};
use mos6510_emu::registers::StatusRegister;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

// Single-step suites record every bus access as [address, value, "read" | "write"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct BusAccess(u16, u8, Access);

/// Flat 64 KiB RAM that logs each access. Only addresses poked since the last reset are cleared.
struct TraceBus {
    ram: Box<[u8; 0x10000]>,
    dirty: Vec<u16>,
    trace: Vec<BusAccess>,
}

impl TraceBus {
    fn new() -> Self {
        Self { ram: Box::new([0; 0x10000]), dirty: Vec::new(), trace: Vec::new() }
    }

    fn reset(&mut self) {
        for address in self.dirty.drain(..) {
            self.ram[usize::from(address)] = 0;
        }
        self.trace.clear();
    }

    fn poke(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
        self.dirty.push(address);
    }
}

impl BusInterface for TraceBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = self.ram[usize::from(address)];
        self.trace.push(BusAccess(address, value, Access::Read));
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.poke(address, value);
        self.trace.push(BusAccess(address, value, Access::Write));
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MachineState {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

impl MachineState {
    fn load_into(&self, cpu: &mut Mos6510, bus: &mut TraceBus) {
        bus.reset();
        for &(address, value) in &self.ram {
            bus.poke(address, value);
        }

        let registers = cpu.registers_mut();
        registers.set_pc(self.pc);
        registers.sp = self.s;
        registers.accumulator = self.a;
        registers.x = self.x;
        registers.y = self.y;
        registers.status = StatusRegister::from_byte(self.p);
    }

    /// Describe every way the CPU and RAM differ from this state.
    fn diff(&self, snapshot: &CpuSnapshot, bus: &TraceBus) -> Vec<String> {
        // B and bit 5 only exist in pushed bytes
        const STACK_ONLY_BITS: u8 = 0x30;

        let registers = [
            ("A", self.a, snapshot.accumulator),
            ("X", self.x, snapshot.x),
            ("Y", self.y, snapshot.y),
            ("S", self.s, snapshot.sp),
            ("P", self.p | STACK_ONLY_BITS, snapshot.status.to_byte() | STACK_ONLY_BITS),
        ];

        let mut diffs: Vec<String> = registers
            .into_iter()
            .filter(|&(_, expected, actual)| expected != actual)
            .map(|(name, expected, actual)| format!("{name}: expected {expected:02X}, got {actual:02X}"))
            .collect();

        if self.pc != snapshot.pc {
            diffs.push(format!("PC: expected {:04X}, got {:04X}", self.pc, snapshot.pc));
        }

        diffs.extend(self.ram.iter().filter_map(|&(address, expected)| {
            let actual = bus.ram[usize::from(address)];
            (expected != actual)
                .then(|| format!("RAM[{address:04X}]: expected {expected:02X}, got {actual:02X}"))
        }));

        diffs
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SingleStepTest {
    name: String,
    initial: MachineState,
    #[serde(rename = "final")]
    expected: MachineState,
    cycles: Vec<BusAccess>,
}

impl SingleStepTest {
    /// Run one instruction from the initial state and return a description of each mismatch.
    fn run(&self, config: Mos6510Config, bus: &mut TraceBus) -> Vec<String> {
        let mut cpu = Mos6510::new(config);
        self.initial.load_into(&mut cpu, bus);

        cpu.clock(bus);
        while cpu.is_mid_instruction() {
            cpu.clock(bus);
        }

        let mut diffs = self.expected.diff(&cpu.snapshot(), bus);
        if let Some(cycle_diff) = diff_trace(&self.cycles, &bus.trace) {
            diffs.push(cycle_diff);
        }
        diffs
    }
}

fn diff_trace(expected: &[BusAccess], actual: &[BusAccess]) -> Option<String> {
    if expected.len() != actual.len() {
        return Some(format!(
            "bus trace has {} cycles, expected {}: expected {expected:?}, got {actual:?}",
            actual.len(),
            expected.len()
        ));
    }

    expected.iter().zip(actual).position(|(expected, actual)| expected != actual).map(|i| {
        format!("bus cycle {i}: expected {:?}, got {:?}", expected[i], actual[i])
    })
}

#[derive(Debug, Parser)]
struct Args {
    /// Directory containing JSON tests, one `<opcode>.json` file per opcode
    #[arg(long, short = 'd')]
    dir_path: PathBuf,

    /// Magic constant for the unstable ANE opcode ($8B)
    #[arg(long, default_value_t = Mos6510Config::DEFAULT_MAGIC)]
    ane_magic: u8,

    /// Magic constant for the unstable LXA opcode ($AB)
    #[arg(long, default_value_t = Mos6510Config::DEFAULT_MAGIC)]
    lxa_magic: u8,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Mos6510Config { ane_magic: args.ane_magic, lxa_magic: args.lxa_magic };
    let mut bus = TraceBus::new();

    let mut total_failures = 0;
    for opcode in 0..=u8::MAX {
        let (mode, operation) = opcodes::decode(opcode);
        // JAM never completes an instruction
        if operation == Operation::Jam {
            continue;
        }

        let file = File::open(opcode_file(&args.dir_path, opcode))?;
        let tests: Vec<SingleStepTest> = serde_json::from_reader(BufReader::new(file))?;

        let mut failures = 0;
        for test in &tests {
            let diffs = test.run(config, &mut bus);
            if !diffs.is_empty() {
                failures += 1;
                log::debug!("'{}' failed:", test.name);
                for diff in diffs {
                    log::debug!("  {diff}");
                }
            }
        }

        if failures != 0 {
            log::error!(
                "{opcode:02X} ({} {mode:?}): {failures} of {} tests failed",
                operation.mnemonic(),
                tests.len()
            );
        }
        total_failures += failures;
    }

    log::info!("Finished with {total_failures} total failures");

    Ok(())
}

fn opcode_file(dir_path: &Path, opcode: u8) -> PathBuf {
    dir_path.join(format!("{opcode:02x}.json"))
}
