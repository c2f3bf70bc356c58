//! Read-only inspection of CPU state for tooling and tests.

use crate::Mos6510;
use crate::opcodes::{self, AddressingMode, Operation};
use crate::registers::{BusPins, InternalLatches, StatusRegister};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub status: StatusRegister,
    pub sp: u8,
    pub accumulator: u8,
    pub x: u8,
    pub y: u8,
    pub latches: InternalLatches,
    pub pins: BusPins,
    pub pending_steps: usize,
    pub jammed: bool,
}

impl CpuSnapshot {
    pub(crate) fn capture(cpu: &Mos6510) -> Self {
        let registers = cpu.registers();
        Self {
            pc: registers.pc(),
            status: registers.status,
            sp: registers.sp,
            accumulator: registers.accumulator,
            x: registers.x,
            y: registers.y,
            latches: *cpu.latches(),
            pins: *cpu.pins(),
            pending_steps: cpu.queue_len(),
            jammed: cpu.is_jammed(),
        }
    }

    /// Decoded form of the opcode in the instruction latch.
    #[must_use]
    pub fn instruction(&self) -> (AddressingMode, Operation) {
        opcodes::decode(self.latches.instruction)
    }
}

impl Display for CpuSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (mode, operation) = self.instruction();

        write!(
            f,
            "PC={:04X} A={:02X} X={:02X} Y={:02X} SP={:02X} P={:02X} [{}] IR={:02X} ({} {mode:?}) \
             AD={:04X} DL={:02X} ADDR={:04X} DATA={:02X} pending={}",
            self.pc,
            self.accumulator,
            self.x,
            self.y,
            self.sp,
            self.status.to_byte(),
            self.status.flags_string(),
            self.latches.instruction,
            operation.mnemonic(),
            self.latches.address(),
            self.latches.data,
            self.pins.address,
            self.pins.data,
            self.pending_steps,
        )?;

        if self.jammed {
            write!(f, " JAMMED")?;
        }

        Ok(())
    }
}
