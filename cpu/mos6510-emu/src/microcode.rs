//! Micro-steps: one variant per kind of bus transaction. Each clock pulse pops exactly one step off
//! the CPU's queue and executes it.

use crate::bus::BusInterface;
use crate::opcodes::{AccessKind, Operation};
use crate::Mos6510;
use bincode::{Decode, Encode};
use mos_common::num::U16Ext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum IndexRegister {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StackSource {
    Accumulator,
    /// Status as pushed by PHP/BRK (B set)
    Status,
    /// Status as pushed by a hardware interrupt (B clear)
    InterruptStatus,
    Pch,
    Pcl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StackTarget {
    Accumulator,
    Status,
    Pcl,
    Pch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum MicroOp {
    /// Fetch the effective address low byte (or zero-page address) from PC
    FetchAdl,
    FetchAdh,
    /// Fetch the base high byte and add the index to ADL; DL keeps the unindexed high byte
    FetchAdhIndexed(IndexRegister),
    /// Fetch the high byte and jump to ADL/high
    FetchAdhJump,
    /// Dummy read at the zero-page base, then add the index (wrapping within page 0)
    ZeroPageIndexed(IndexRegister),
    ReadPointerLow,
    ReadPointerHigh,
    ReadPointerHighIndexed(IndexRegister),
    ReadPointerHighJump,
    FetchImmediate,
    FetchBranchOffset,
    Implied,
    Accumulator,
    Read,
    /// Read at the indexed address; on a page crossing this is a dummy read at the unfixed
    /// address and the real read is queued
    ReadIndexed,
    /// Dummy read at the unfixed indexed address (writes and read-modify-writes)
    ReadUnfixed,
    Write,
    ReadForModify,
    WriteUnmodified,
    WriteModified,
    BranchTaken,
    BranchPageFix,
    DummyReadPc,
    ReadPcIncrement,
    ReadStack,
    Push(StackSource),
    Pull(StackTarget),
    /// Read the vector low byte into PCL and set I
    VectorLow(u16),
    VectorHigh(u16),
    Jam,
}

impl MicroOp {
    /// Whether this step can run while `operation` is in IR. Only steps that hand off to an
    /// operation handler are restricted.
    fn runs_with(self, operation: Operation) -> bool {
        let kind = operation.access_kind();
        match self {
            Self::FetchImmediate | Self::Read | Self::ReadIndexed => kind == AccessKind::Read,
            Self::Write => kind == AccessKind::Write,
            Self::Accumulator | Self::WriteModified => kind == AccessKind::ReadModifyWrite,
            Self::Implied => kind == AccessKind::Internal || operation == Operation::Nop,
            Self::FetchBranchOffset => kind == AccessKind::Branch,
            _ => true,
        }
    }
}

impl Mos6510 {
    /// Check that every queued step agrees with the opcode in IR, as it always does for a queue
    /// built by the decoder.
    pub(crate) fn queue_matches_instruction(&self) -> bool {
        let operation = self.operation();
        self.queue.iter().all(|op| op.runs_with(operation))
    }

    pub(crate) fn execute_micro_op<B: BusInterface>(&mut self, op: MicroOp, bus: &mut B) {
        match op {
            MicroOp::FetchAdl => {
                self.latches.adl = self.fetch_operand(bus);
            }
            MicroOp::FetchAdh => {
                self.latches.adh = self.fetch_operand(bus);
            }
            MicroOp::FetchAdhIndexed(index) => {
                let base_high = self.fetch_operand(bus);
                self.latches.data = base_high;
                self.apply_index(index, base_high);
            }
            MicroOp::FetchAdhJump => {
                let high = self.fetch_operand(bus);
                self.registers.set_pcl(self.latches.adl);
                self.registers.set_pch(high);
            }
            MicroOp::ZeroPageIndexed(index) => {
                self.read_bus(bus, self.latches.adl.into());
                self.latches.adl = self.latches.adl.wrapping_add(self.index_value(index));
                self.latches.adh = 0;
            }
            MicroOp::ReadPointerLow => {
                self.latches.data = self.read_bus(bus, self.latches.address());
            }
            MicroOp::ReadPointerHigh => {
                let high = self.read_bus(bus, self.pointer_high_address());
                self.latches.adl = self.latches.data;
                self.latches.adh = high;
            }
            MicroOp::ReadPointerHighIndexed(index) => {
                let high = self.read_bus(bus, self.pointer_high_address());
                let low = self.latches.data;
                self.latches.adl = low;
                self.latches.data = high;
                self.apply_index(index, high);
            }
            MicroOp::ReadPointerHighJump => {
                let high = self.read_bus(bus, self.pointer_high_address());
                self.registers.set_pcl(self.latches.data);
                self.registers.set_pch(high);
            }
            MicroOp::FetchImmediate => {
                let value = self.fetch_operand(bus);
                self.execute_read(value);
            }
            MicroOp::FetchBranchOffset => {
                self.latches.data = self.fetch_operand(bus);
                self.execute_branch();
            }
            MicroOp::Implied => {
                self.read_bus(bus, self.registers.pc());
                self.execute_internal();
            }
            MicroOp::Accumulator => {
                self.read_bus(bus, self.registers.pc());
                self.registers.accumulator = self.modify(self.registers.accumulator);
            }
            MicroOp::Read => {
                let value = self.read_bus(bus, self.latches.address());
                self.execute_read(value);
            }
            MicroOp::ReadIndexed => {
                if self.crossed_page() {
                    self.read_bus(bus, self.unfixed_address());
                    self.enqueue(&[MicroOp::Read]);
                } else {
                    let value = self.read_bus(bus, self.latches.address());
                    self.execute_read(value);
                }
            }
            MicroOp::ReadUnfixed => {
                self.read_bus(bus, self.unfixed_address());
            }
            MicroOp::Write => {
                let (address, value) = self.store();
                self.write_bus(bus, address, value);
            }
            MicroOp::ReadForModify => {
                self.latches.data = self.read_bus(bus, self.latches.address());
            }
            MicroOp::WriteUnmodified => {
                self.write_bus(bus, self.latches.address(), self.latches.data);
            }
            MicroOp::WriteModified => {
                let result = self.modify(self.latches.data);
                self.write_bus(bus, self.latches.address(), result);
            }
            MicroOp::BranchTaken => {
                self.read_bus(bus, self.registers.pc());

                let offset = self.latches.data as i8;
                let target = self.registers.pc().wrapping_add_signed(offset.into());
                self.registers.set_pcl(target.lsb());
                if target.msb() != self.registers.pch() {
                    self.latches.adh = target.msb();
                    self.enqueue(&[MicroOp::BranchPageFix]);
                }
            }
            MicroOp::BranchPageFix => {
                self.read_bus(bus, self.registers.pc());
                self.registers.set_pch(self.latches.adh);
            }
            MicroOp::DummyReadPc => {
                self.read_bus(bus, self.registers.pc());
            }
            MicroOp::ReadPcIncrement => {
                self.read_bus(bus, self.registers.pc());
                self.registers.increment_pc();
            }
            MicroOp::ReadStack => {
                self.read_bus(bus, self.registers.stack_address());
            }
            MicroOp::Push(source) => {
                let value = match source {
                    StackSource::Accumulator => self.registers.accumulator,
                    StackSource::Status => self.registers.status.pushed_byte(true),
                    StackSource::InterruptStatus => self.registers.status.pushed_byte(false),
                    StackSource::Pch => self.registers.pch(),
                    StackSource::Pcl => self.registers.pcl(),
                };
                self.write_bus(bus, self.registers.stack_address(), value);
                self.registers.sp = self.registers.sp.wrapping_sub(1);
            }
            MicroOp::Pull(target) => {
                self.registers.sp = self.registers.sp.wrapping_add(1);
                let value = self.read_bus(bus, self.registers.stack_address());
                match target {
                    StackTarget::Accumulator => {
                        self.registers.accumulator = value;
                        self.registers.status.set_nz(value);
                    }
                    StackTarget::Status => self.registers.status.restore_pulled(value),
                    StackTarget::Pcl => self.registers.set_pcl(value),
                    StackTarget::Pch => self.registers.set_pch(value),
                }
            }
            MicroOp::VectorLow(vector) => {
                let low = self.read_bus(bus, vector);
                self.registers.set_pcl(low);
                self.registers.status.set_interrupt_disable(true);
            }
            MicroOp::VectorHigh(vector) => {
                let high = self.read_bus(bus, vector.wrapping_add(1));
                self.registers.set_pch(high);
            }
            MicroOp::Jam => {
                // Bus floats high; no memory access
                self.pins.address = 0xFFFF;
                self.pins.data = 0xFF;
                self.enqueue(&[MicroOp::Jam]);
            }
        }
    }

    fn index_value(&self, index: IndexRegister) -> u8 {
        match index {
            IndexRegister::X => self.registers.x,
            IndexRegister::Y => self.registers.y,
        }
    }

    fn apply_index(&mut self, index: IndexRegister, base_high: u8) {
        let (low, carry) = self.latches.adl.overflowing_add(self.index_value(index));
        self.latches.adl = low;
        self.latches.adh = base_high.wrapping_add(carry.into());
    }

    // Pointer reads never carry into the high byte: zero-page pointers wrap within page 0 and
    // JMP ($xxFF) reads its high byte from $xx00
    fn pointer_high_address(&self) -> u16 {
        u16::from_halves(self.latches.adl.wrapping_add(1), self.latches.adh)
    }

    pub(crate) fn crossed_page(&self) -> bool {
        self.latches.adh != self.latches.data
    }

    fn unfixed_address(&self) -> u16 {
        u16::from_halves(self.latches.adl, self.latches.data)
    }

    pub(crate) fn operation(&self) -> Operation {
        crate::opcodes::OPERATIONS[self.latches.instruction as usize]
    }
}
