//! Addressing-mode decoders: expand a freshly fetched opcode into its queue of micro-steps.

use crate::Mos6510;
use crate::microcode::{IndexRegister, MicroOp, StackSource};
use crate::opcodes::{AccessKind, AddressingMode, Operation};

const READ_TAIL: &[MicroOp] = &[MicroOp::Read];
const READ_INDEXED_TAIL: &[MicroOp] = &[MicroOp::ReadIndexed];
const WRITE_TAIL: &[MicroOp] = &[MicroOp::Write];
const WRITE_INDEXED_TAIL: &[MicroOp] = &[MicroOp::ReadUnfixed, MicroOp::Write];
const MODIFY_TAIL: &[MicroOp] =
    &[MicroOp::ReadForModify, MicroOp::WriteUnmodified, MicroOp::WriteModified];
const MODIFY_INDEXED_TAIL: &[MicroOp] = &[
    MicroOp::ReadUnfixed,
    MicroOp::ReadForModify,
    MicroOp::WriteUnmodified,
    MicroOp::WriteModified,
];

fn address_steps(mode: AddressingMode) -> &'static [MicroOp] {
    use MicroOp::*;

    match mode {
        AddressingMode::Implied => &[Implied],
        AddressingMode::Accumulator => &[Accumulator],
        AddressingMode::Immediate => &[FetchImmediate],
        AddressingMode::Relative => &[FetchBranchOffset],
        AddressingMode::ZeroPage => &[FetchAdl],
        AddressingMode::ZeroPageX => &[FetchAdl, ZeroPageIndexed(IndexRegister::X)],
        AddressingMode::ZeroPageY => &[FetchAdl, ZeroPageIndexed(IndexRegister::Y)],
        AddressingMode::Absolute => &[FetchAdl, FetchAdh],
        AddressingMode::AbsoluteX => &[FetchAdl, FetchAdhIndexed(IndexRegister::X)],
        AddressingMode::AbsoluteY => &[FetchAdl, FetchAdhIndexed(IndexRegister::Y)],
        AddressingMode::Indirect => &[FetchAdl, FetchAdh, ReadPointerLow, ReadPointerHighJump],
        AddressingMode::IndexedIndirect => {
            &[FetchAdl, ZeroPageIndexed(IndexRegister::X), ReadPointerLow, ReadPointerHigh]
        }
        AddressingMode::IndirectIndexed => {
            &[FetchAdl, ReadPointerLow, ReadPointerHighIndexed(IndexRegister::Y)]
        }
    }
}

fn is_indexed(mode: AddressingMode) -> bool {
    matches!(
        mode,
        AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectIndexed
    )
}

/// Steps that follow address calculation and perform the operand access.
fn access_tail(mode: AddressingMode, kind: AccessKind) -> &'static [MicroOp] {
    // Implied, Immediate, Accumulator and Relative steps complete the operation themselves
    if matches!(
        mode,
        AddressingMode::Implied
            | AddressingMode::Immediate
            | AddressingMode::Accumulator
            | AddressingMode::Relative
    ) {
        return &[];
    }

    match (kind, is_indexed(mode)) {
        (AccessKind::Read, false) => READ_TAIL,
        (AccessKind::Read, true) => READ_INDEXED_TAIL,
        (AccessKind::Write, false) => WRITE_TAIL,
        (AccessKind::Write, true) => WRITE_INDEXED_TAIL,
        (AccessKind::ReadModifyWrite, false) => MODIFY_TAIL,
        (AccessKind::ReadModifyWrite, true) => MODIFY_INDEXED_TAIL,
        (AccessKind::Internal | AccessKind::Branch | AccessKind::Jump, _) => &[],
    }
}

impl Mos6510 {
    /// Queue every remaining micro-step of the instruction in IR. Called from the opcode fetch
    /// cycle, so the queue is empty on entry.
    pub(crate) fn decode(&mut self, mode: AddressingMode, operation: Operation) {
        use MicroOp::*;

        match operation {
            Operation::Jsr => {
                self.enqueue(&[
                    FetchAdl,
                    ReadStack,
                    Push(StackSource::Pch),
                    Push(StackSource::Pcl),
                    FetchAdhJump,
                ]);
            }
            Operation::Jmp if mode == AddressingMode::Absolute => {
                self.enqueue(&[FetchAdl, FetchAdhJump]);
            }
            _ => {
                self.enqueue(access_tail(mode, operation.access_kind()));
                self.enqueue(address_steps(mode));
            }
        }
    }
}
