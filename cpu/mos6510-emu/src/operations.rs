//! Operation handlers. Each runs inside the micro-step that completes its instruction, with the
//! operand already on the data bus (reads), the effective address latched (writes), or the
//! unmodified value in DL (read-modify-writes).

use crate::microcode::{MicroOp, StackSource, StackTarget};
use crate::opcodes::Operation;
use crate::registers::StatusRegister;
use crate::{IRQ_VECTOR, Mos6510};
use mos_common::num::{GetBit, U16Ext};

fn add(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    if flags.decimal() {
        return add_decimal(accumulator, value, flags);
    }

    let existing_carry = flags.carry();

    let (result, carry1) = accumulator.overflowing_add(value);
    let (result, carry2) = result.overflowing_add(existing_carry.into());
    let new_carry = carry1 || carry2;

    let bit_6_carry = (accumulator & 0x7F) + (value & 0x7F) + u8::from(existing_carry) >= 0x80;
    let overflow = new_carry ^ bit_6_carry;

    flags.set_nz(result).set_overflow(overflow).set_carry(new_carry);

    result
}

// NMOS decimal add: Z comes from the binary sum, N and V from the intermediate result before the
// high nibble is adjusted
fn add_decimal(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let carry = u16::from(flags.carry());
    let a = u16::from(accumulator);
    let v = u16::from(value);

    let mut result = (a & 0x0F) + (v & 0x0F) + carry;
    if result > 0x09 {
        result += 0x06;
    }
    result = if result <= 0x0F {
        (result & 0x0F) + (a & 0xF0) + (v & 0xF0)
    } else {
        (result & 0x0F) + (a & 0xF0) + (v & 0xF0) + 0x10
    };

    flags
        .set_zero((a + v + carry) & 0xFF == 0)
        .set_negative(result.bit(7))
        .set_overflow((a ^ result) & 0x80 != 0 && (a ^ v) & 0x80 == 0);

    if result & 0x1F0 > 0x90 {
        result += 0x60;
    }
    flags.set_carry(result & 0xFF0 > 0xF0);

    result as u8
}

fn subtract(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    // Carry flag is inverted in subtraction
    let existing_borrow = u8::from(!flags.carry());

    let (result, borrowed1) = accumulator.overflowing_sub(value);
    let (result, borrowed2) = result.overflowing_sub(existing_borrow);
    let borrowed = borrowed1 || borrowed2;

    let bit_6_borrowed = accumulator & 0x7F < (value & 0x7F) + existing_borrow;
    let overflow = borrowed ^ bit_6_borrowed;

    flags.set_nz(result).set_overflow(overflow).set_carry(!borrowed);

    if flags.decimal() { subtract_decimal_result(accumulator, value, existing_borrow) } else { result }
}

// NMOS decimal subtract: flags are identical to binary mode, only the result is adjusted
fn subtract_decimal_result(accumulator: u8, value: u8, borrow: u8) -> u8 {
    let a = u16::from(accumulator);
    let v = u16::from(value);
    let borrow = u16::from(borrow);

    let low = (a & 0x0F).wrapping_sub(v & 0x0F).wrapping_sub(borrow);
    let mut result = if low & 0x10 != 0 {
        (low.wrapping_sub(0x06) & 0x0F) | (a & 0xF0).wrapping_sub(v & 0xF0).wrapping_sub(0x10)
    } else {
        (low & 0x0F) | (a & 0xF0).wrapping_sub(v & 0xF0)
    };
    if result & 0x100 != 0 {
        result = result.wrapping_sub(0x60);
    }

    result.lsb()
}

fn and(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator & value;
    flags.set_nz(result);
    result
}

fn or(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator | value;
    flags.set_nz(result);
    result
}

fn xor(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator ^ value;
    flags.set_nz(result);
    result
}

fn bit_test(accumulator: u8, value: u8, flags: &mut StatusRegister) {
    flags.set_negative(value.bit(7)).set_overflow(value.bit(6)).set_zero(accumulator & value == 0);
}

fn compare(register: u8, value: u8, flags: &mut StatusRegister) {
    flags.set_nz(register.wrapping_sub(value)).set_carry(register >= value);
}

fn load(value: u8, flags: &mut StatusRegister) -> u8 {
    flags.set_nz(value);
    value
}

fn shift_left(value: u8, flags: &mut StatusRegister) -> u8 {
    let shifted = value << 1;
    flags.set_carry(value.bit(7)).set_nz(shifted);
    shifted
}

fn logical_shift_right(value: u8, flags: &mut StatusRegister) -> u8 {
    let shifted = value >> 1;
    flags.set_carry(value.bit(0)).set_nz(shifted);
    shifted
}

fn rotate_left(value: u8, flags: &mut StatusRegister) -> u8 {
    let rotated = (value << 1) | u8::from(flags.carry());
    flags.set_carry(value.bit(7)).set_nz(rotated);
    rotated
}

fn rotate_right(value: u8, flags: &mut StatusRegister) -> u8 {
    let rotated = (value >> 1) | (u8::from(flags.carry()) << 7);
    flags.set_carry(value.bit(0)).set_nz(rotated);
    rotated
}

fn increment(value: u8, flags: &mut StatusRegister) -> u8 {
    let result = value.wrapping_add(1);
    flags.set_nz(result);
    result
}

fn decrement(value: u8, flags: &mut StatusRegister) -> u8 {
    let result = value.wrapping_sub(1);
    flags.set_nz(result);
    result
}

// ARR: AND, then ROR through carry, with C and V taken from bits 6 and 5 of the result. Decimal mode
// applies a BCD fixup to each nibble of the rotated value
fn and_rotate_right(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let anded = accumulator & value;
    let rotated = (anded >> 1) | (u8::from(flags.carry()) << 7);

    if !flags.decimal() {
        flags
            .set_nz(rotated)
            .set_carry(rotated.bit(6))
            .set_overflow(rotated.bit(6) ^ rotated.bit(5));
        return rotated;
    }

    flags.set_nz(rotated).set_overflow((anded ^ rotated).bit(6));

    let mut result = rotated;
    if (anded & 0x0F) + (anded & 0x01) > 0x05 {
        result = (result & 0xF0) | (result.wrapping_add(0x06) & 0x0F);
    }
    let high_fixup = u16::from(anded & 0xF0) + u16::from(anded & 0x10) > 0x50;
    if high_fixup {
        result = (result & 0x0F) | (result.wrapping_add(0x60) & 0xF0);
    }
    flags.set_carry(high_fixup);

    result
}

impl Mos6510 {
    /// Read-class operations, called with the operand value.
    pub(crate) fn execute_read(&mut self, value: u8) {
        let operation = self.operation();
        let registers = &mut self.registers;
        let flags = &mut registers.status;

        match operation {
            Operation::Adc => registers.accumulator = add(registers.accumulator, value, flags),
            Operation::Sbc => registers.accumulator = subtract(registers.accumulator, value, flags),
            Operation::And => registers.accumulator = and(registers.accumulator, value, flags),
            Operation::Ora => registers.accumulator = or(registers.accumulator, value, flags),
            Operation::Eor => registers.accumulator = xor(registers.accumulator, value, flags),
            Operation::Bit => bit_test(registers.accumulator, value, flags),
            Operation::Cmp => compare(registers.accumulator, value, flags),
            Operation::Cpx => compare(registers.x, value, flags),
            Operation::Cpy => compare(registers.y, value, flags),
            Operation::Lda => registers.accumulator = load(value, flags),
            Operation::Ldx => registers.x = load(value, flags),
            Operation::Ldy => registers.y = load(value, flags),
            Operation::Lax => {
                registers.accumulator = load(value, flags);
                registers.x = value;
            }
            Operation::Anc => {
                registers.accumulator = and(registers.accumulator, value, flags);
                flags.set_carry(registers.accumulator.bit(7));
            }
            Operation::Alr => {
                let anded = registers.accumulator & value;
                registers.accumulator = logical_shift_right(anded, flags);
            }
            Operation::Arr => {
                registers.accumulator = and_rotate_right(registers.accumulator, value, flags);
            }
            Operation::Ane => {
                let result = (registers.accumulator | self.config.ane_magic) & registers.x & value;
                registers.accumulator = load(result, flags);
            }
            Operation::Lxa => {
                let result = (registers.accumulator | self.config.lxa_magic) & value;
                registers.accumulator = load(result, flags);
                registers.x = result;
            }
            Operation::Sbx => {
                let anded = registers.accumulator & registers.x;
                compare(anded, value, flags);
                registers.x = anded.wrapping_sub(value);
            }
            Operation::Las => {
                let result = registers.sp & value;
                registers.accumulator = load(result, flags);
                registers.x = result;
                registers.sp = result;
            }
            Operation::Nop => {}
            _ => unreachable!("{operation:?} is not a read operation"),
        }
    }

    /// Write-class operations: returns the address and value to store. SHA/SHX/SHY/TAS AND the
    /// stored value with the base high byte + 1, and on a page crossing that value also replaces the
    /// high byte of the written address.
    pub(crate) fn store(&mut self) -> (u16, u8) {
        let operation = self.operation();
        let registers = &mut self.registers;
        let high_plus_one = self.latches.data.wrapping_add(1);

        let (value, unstable) = match operation {
            Operation::Sta => (registers.accumulator, false),
            Operation::Stx => (registers.x, false),
            Operation::Sty => (registers.y, false),
            Operation::Sax => (registers.accumulator & registers.x, false),
            Operation::Sha => (registers.accumulator & registers.x & high_plus_one, true),
            Operation::Shx => (registers.x & high_plus_one, true),
            Operation::Shy => (registers.y & high_plus_one, true),
            Operation::Tas => {
                registers.sp = registers.accumulator & registers.x;
                (registers.sp & high_plus_one, true)
            }
            _ => unreachable!("{operation:?} is not a write operation"),
        };

        if unstable && self.crossed_page() {
            self.latches.adh = value;
        }

        (self.latches.address(), value)
    }

    /// Read-modify-write operations: returns the value to write back. Also used for the
    /// accumulator forms of the shifts and rotates.
    pub(crate) fn modify(&mut self, value: u8) -> u8 {
        let operation = self.operation();
        let registers = &mut self.registers;
        let flags = &mut registers.status;

        match operation {
            Operation::Asl => shift_left(value, flags),
            Operation::Lsr => logical_shift_right(value, flags),
            Operation::Rol => rotate_left(value, flags),
            Operation::Ror => rotate_right(value, flags),
            Operation::Inc => increment(value, flags),
            Operation::Dec => decrement(value, flags),
            Operation::Slo => {
                let shifted = shift_left(value, flags);
                registers.accumulator = or(registers.accumulator, shifted, flags);
                shifted
            }
            Operation::Rla => {
                let rotated = rotate_left(value, flags);
                registers.accumulator = and(registers.accumulator, rotated, flags);
                rotated
            }
            Operation::Sre => {
                let shifted = logical_shift_right(value, flags);
                registers.accumulator = xor(registers.accumulator, shifted, flags);
                shifted
            }
            Operation::Rra => {
                let rotated = rotate_right(value, flags);
                registers.accumulator = add(registers.accumulator, rotated, flags);
                rotated
            }
            Operation::Dcp => {
                let decremented = value.wrapping_sub(1);
                compare(registers.accumulator, decremented, flags);
                decremented
            }
            Operation::Isc => {
                let incremented = value.wrapping_add(1);
                registers.accumulator = subtract(registers.accumulator, incremented, flags);
                incremented
            }
            _ => unreachable!("{operation:?} is not a read-modify-write operation"),
        }
    }

    /// Implied-mode operations, run after the dummy read at PC. Stack and vector operations queue
    /// their remaining bus cycles here.
    pub(crate) fn execute_internal(&mut self) {
        use MicroOp::*;

        let operation = self.operation();
        let registers = &mut self.registers;
        let flags = &mut registers.status;

        match operation {
            Operation::Clc => {
                flags.set_carry(false);
            }
            Operation::Cld => {
                flags.set_decimal(false);
            }
            Operation::Cli => {
                flags.set_interrupt_disable(false);
            }
            Operation::Clv => {
                flags.set_overflow(false);
            }
            Operation::Sec => {
                flags.set_carry(true);
            }
            Operation::Sed => {
                flags.set_decimal(true);
            }
            Operation::Sei => {
                flags.set_interrupt_disable(true);
            }
            Operation::Inx => registers.x = increment(registers.x, flags),
            Operation::Iny => registers.y = increment(registers.y, flags),
            Operation::Dex => registers.x = decrement(registers.x, flags),
            Operation::Dey => registers.y = decrement(registers.y, flags),
            Operation::Tax => registers.x = load(registers.accumulator, flags),
            Operation::Tay => registers.y = load(registers.accumulator, flags),
            Operation::Txa => registers.accumulator = load(registers.x, flags),
            Operation::Tya => registers.accumulator = load(registers.y, flags),
            Operation::Tsx => registers.x = load(registers.sp, flags),
            Operation::Txs => registers.sp = registers.x,
            Operation::Pha => self.enqueue(&[Push(StackSource::Accumulator)]),
            Operation::Php => self.enqueue(&[Push(StackSource::Status)]),
            Operation::Pla => self.enqueue(&[ReadStack, Pull(StackTarget::Accumulator)]),
            Operation::Plp => self.enqueue(&[ReadStack, Pull(StackTarget::Status)]),
            Operation::Rts => self.enqueue(&[
                ReadStack,
                Pull(StackTarget::Pcl),
                Pull(StackTarget::Pch),
                ReadPcIncrement,
            ]),
            Operation::Rti => self.enqueue(&[
                ReadStack,
                Pull(StackTarget::Status),
                Pull(StackTarget::Pcl),
                Pull(StackTarget::Pch),
            ]),
            Operation::Brk => {
                // The padding byte after BRK is skipped
                registers.increment_pc();
                self.enqueue(&[
                    Push(StackSource::Pch),
                    Push(StackSource::Pcl),
                    Push(StackSource::Status),
                    VectorLow(IRQ_VECTOR),
                    VectorHigh(IRQ_VECTOR),
                ]);
            }
            Operation::Jam => {
                log::debug!(
                    "CPU jammed by opcode {:02X} at {:04X}",
                    self.latches.instruction,
                    self.registers.pc().wrapping_sub(1)
                );
                self.enqueue(&[Jam]);
            }
            // Implied NOPs
            Operation::Nop => {}
            _ => unreachable!("{operation:?} is not an implied operation"),
        }
    }

    /// Runs in the offset fetch step; a taken branch queues its extra cycle(s).
    pub(crate) fn execute_branch(&mut self) {
        let flags = self.registers.status;

        let taken = match self.operation() {
            Operation::Bcc => !flags.carry(),
            Operation::Bcs => flags.carry(),
            Operation::Bne => !flags.zero(),
            Operation::Beq => flags.zero(),
            Operation::Bpl => !flags.negative(),
            Operation::Bmi => flags.negative(),
            Operation::Bvc => !flags.overflow(),
            Operation::Bvs => flags.overflow(),
            operation => unreachable!("{operation:?} is not a branch operation"),
        };

        if taken {
            self.enqueue(&[MicroOp::BranchTaken]);
        }
    }
}
