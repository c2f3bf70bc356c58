use bincode::{Decode, Encode};
use mos_common::num::{GetBit, SetBit, U16Ext};

const CARRY_BIT: u8 = 0;
const ZERO_BIT: u8 = 1;
const INTERRUPT_DISABLE_BIT: u8 = 2;
const DECIMAL_BIT: u8 = 3;
const BREAK_BIT: u8 = 4;
const UNUSED_BIT: u8 = 5;
const OVERFLOW_BIT: u8 = 6;
const NEGATIVE_BIT: u8 = 7;

/// Processor status register (P). Flags are bit accessors into the raw byte.
///
/// Bit 5 has no storage in the CPU; it is always clear here and only appears (set) in bytes pushed
/// to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct StatusRegister(u8);

macro_rules! impl_flag_accessors {
    ($($getter:ident / $setter:ident => $bit:expr),* $(,)?) => {
        $(
            #[inline]
            #[must_use]
            pub fn $getter(self) -> bool {
                self.0.bit($bit)
            }

            #[inline]
            pub fn $setter(&mut self, value: bool) -> &mut Self {
                self.0.set_bit($bit, value);
                self
            }
        )*
    };
}

impl StatusRegister {
    /// Only the I flag is set at power-up / reset.
    pub const POWER_ON: u8 = 0b0000_0100;

    #[must_use]
    pub fn new() -> Self {
        Self(Self::POWER_ON)
    }

    #[inline]
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self(byte.with_bit(UNUSED_BIT, false))
    }

    #[inline]
    #[must_use]
    pub fn to_byte(self) -> u8 {
        self.0
    }

    impl_flag_accessors!(
        carry / set_carry => CARRY_BIT,
        zero / set_zero => ZERO_BIT,
        interrupt_disable / set_interrupt_disable => INTERRUPT_DISABLE_BIT,
        decimal / set_decimal => DECIMAL_BIT,
        break_flag / set_break_flag => BREAK_BIT,
        overflow / set_overflow => OVERFLOW_BIT,
        negative / set_negative => NEGATIVE_BIT,
    );

    /// Set N and Z from a result byte.
    #[inline]
    pub fn set_nz(&mut self, value: u8) -> &mut Self {
        self.set_negative(value.bit(7)).set_zero(value == 0)
    }

    /// Value written to the stack by PHP/BRK (`software`) or by a hardware interrupt sequence.
    /// Bit 5 always reads as 1 on the stack; B is 1 only for software pushes.
    #[inline]
    #[must_use]
    pub fn pushed_byte(self, software: bool) -> u8 {
        self.0.with_bit(UNUSED_BIT, true).with_bit(BREAK_BIT, software)
    }

    /// Apply a status byte pulled by PLP/RTI. B is not a stored flag on the stack, so the current B
    /// value is kept; bit 5 is dropped.
    #[inline]
    pub fn restore_pulled(&mut self, byte: u8) {
        let break_flag = self.break_flag();
        self.0 = byte.with_bit(UNUSED_BIT, false).with_bit(BREAK_BIT, break_flag);
    }

    /// Render as `NV-BDIZC`, uppercase for set flags.
    #[must_use]
    pub fn flags_string(self) -> String {
        const NAMES: [char; 8] = ['c', 'z', 'i', 'd', 'b', '-', 'v', 'n'];

        (0..8)
            .rev()
            .map(|i| {
                let name = NAMES[i as usize];
                if self.0.bit(i) { name.to_ascii_uppercase() } else { name }
            })
            .collect()
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

/// Architectural registers. The program counter is held as separate low/high halves because
/// several micro-steps (branch page fixups, vector and stack pulls) update only one half.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CpuRegisters {
    pcl: u8,
    pch: u8,
    pub status: StatusRegister,
    pub sp: u8,
    pub accumulator: u8,
    pub x: u8,
    pub y: u8,
}

impl CpuRegisters {
    pub const RESET_PC: u16 = 0xFFFC;

    /// Power-up register values; identical to the values `reset()` restores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pcl: Self::RESET_PC.lsb(),
            pch: Self::RESET_PC.msb(),
            status: StatusRegister::new(),
            sp: 0,
            accumulator: 0,
            x: 0,
            y: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn pc(&self) -> u16 {
        u16::from_halves(self.pcl, self.pch)
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pcl = pc.lsb();
        self.pch = pc.msb();
    }

    #[inline]
    #[must_use]
    pub fn pcl(&self) -> u8 {
        self.pcl
    }

    #[inline]
    #[must_use]
    pub fn pch(&self) -> u8 {
        self.pch
    }

    #[inline]
    pub fn set_pcl(&mut self, pcl: u8) {
        self.pcl = pcl;
    }

    #[inline]
    pub fn set_pch(&mut self, pch: u8) {
        self.pch = pch;
    }

    #[inline]
    pub(crate) fn increment_pc(&mut self) {
        self.set_pc(self.pc().wrapping_add(1));
    }

    #[inline]
    pub(crate) fn stack_address(&self) -> u16 {
        u16::from_be_bytes([0x01, self.sp])
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline latches that carry values between the micro-steps of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct InternalLatches {
    /// Instruction register: the opcode currently executing.
    pub instruction: u8,
    /// Address-data latch, low half.
    pub adl: u8,
    /// Address-data latch, high half.
    pub adh: u8,
    /// Internal data-bus latch.
    pub data: u8,
}

impl InternalLatches {
    #[inline]
    #[must_use]
    pub fn address(self) -> u16 {
        u16::from_halves(self.adl, self.adh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct BusPins {
    pub address: u16,
    pub data: u8,
}
