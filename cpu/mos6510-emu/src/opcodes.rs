//! Opcode dispatch tables.
//!
//! Every opcode maps to exactly one addressing mode and one operation. Both tables are fixed-size
//! arrays indexed by the opcode, so an incomplete table is a compile error rather than a runtime
//! lookup failure.

use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    #[must_use]
    pub fn operand_len(self) -> u16 {
        match self {
            Self::Implied | Self::Accumulator => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }
}

/// How an operation touches its operand, which decides the bus cycles that follow address
/// calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    ReadModifyWrite,
    /// Register-only and stack/vector operations; always Implied mode.
    Internal,
    Branch,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Operation {
    // Documented
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented
    Slo,
    Rla,
    Sre,
    Rra,
    Sax,
    Lax,
    Dcp,
    Isc,
    Anc,
    Alr,
    Arr,
    Ane,
    Lxa,
    Sbx,
    Sha,
    Shx,
    Shy,
    Tas,
    Las,
    Jam,
}

impl Operation {
    #[must_use]
    pub fn access_kind(self) -> AccessKind {
        match self {
            Self::Adc
            | Self::And
            | Self::Bit
            | Self::Cmp
            | Self::Cpx
            | Self::Cpy
            | Self::Eor
            | Self::Lda
            | Self::Ldx
            | Self::Ldy
            | Self::Nop
            | Self::Ora
            | Self::Sbc
            | Self::Lax
            | Self::Anc
            | Self::Alr
            | Self::Arr
            | Self::Ane
            | Self::Lxa
            | Self::Sbx
            | Self::Las => AccessKind::Read,
            Self::Sta
            | Self::Stx
            | Self::Sty
            | Self::Sax
            | Self::Sha
            | Self::Shx
            | Self::Shy
            | Self::Tas => AccessKind::Write,
            Self::Asl
            | Self::Dec
            | Self::Inc
            | Self::Lsr
            | Self::Rol
            | Self::Ror
            | Self::Slo
            | Self::Rla
            | Self::Sre
            | Self::Rra
            | Self::Dcp
            | Self::Isc => AccessKind::ReadModifyWrite,
            Self::Bcc
            | Self::Bcs
            | Self::Beq
            | Self::Bmi
            | Self::Bne
            | Self::Bpl
            | Self::Bvc
            | Self::Bvs => AccessKind::Branch,
            Self::Jmp | Self::Jsr => AccessKind::Jump,
            Self::Brk
            | Self::Clc
            | Self::Cld
            | Self::Cli
            | Self::Clv
            | Self::Dex
            | Self::Dey
            | Self::Inx
            | Self::Iny
            | Self::Pha
            | Self::Php
            | Self::Pla
            | Self::Plp
            | Self::Rti
            | Self::Rts
            | Self::Sec
            | Self::Sed
            | Self::Sei
            | Self::Tax
            | Self::Tay
            | Self::Tsx
            | Self::Txa
            | Self::Txs
            | Self::Tya
            | Self::Jam => AccessKind::Internal,
        }
    }

    #[must_use]
    pub fn is_documented(self) -> bool {
        !matches!(
            self,
            Self::Slo
                | Self::Rla
                | Self::Sre
                | Self::Rra
                | Self::Sax
                | Self::Lax
                | Self::Dcp
                | Self::Isc
                | Self::Anc
                | Self::Alr
                | Self::Arr
                | Self::Ane
                | Self::Lxa
                | Self::Sbx
                | Self::Sha
                | Self::Shx
                | Self::Shy
                | Self::Tas
                | Self::Las
                | Self::Jam
        )
    }

    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Slo => "SLO",
            Self::Rla => "RLA",
            Self::Sre => "SRE",
            Self::Rra => "RRA",
            Self::Sax => "SAX",
            Self::Lax => "LAX",
            Self::Dcp => "DCP",
            Self::Isc => "ISC",
            Self::Anc => "ANC",
            Self::Alr => "ALR",
            Self::Arr => "ARR",
            Self::Ane => "ANE",
            Self::Lxa => "LXA",
            Self::Sbx => "SBX",
            Self::Sha => "SHA",
            Self::Shx => "SHX",
            Self::Shy => "SHY",
            Self::Tas => "TAS",
            Self::Las => "LAS",
            Self::Jam => "JAM",
        }
    }
}

const IMP: AddressingMode = AddressingMode::Implied;
const ACC: AddressingMode = AddressingMode::Accumulator;
const IMM: AddressingMode = AddressingMode::Immediate;
const ZPG: AddressingMode = AddressingMode::ZeroPage;
const ZPX: AddressingMode = AddressingMode::ZeroPageX;
const ZPY: AddressingMode = AddressingMode::ZeroPageY;
const ABS: AddressingMode = AddressingMode::Absolute;
const ABX: AddressingMode = AddressingMode::AbsoluteX;
const ABY: AddressingMode = AddressingMode::AbsoluteY;
const IND: AddressingMode = AddressingMode::Indirect;
const IZX: AddressingMode = AddressingMode::IndexedIndirect;
const IZY: AddressingMode = AddressingMode::IndirectIndexed;
const REL: AddressingMode = AddressingMode::Relative;

#[rustfmt::skip]
pub const ADDRESSING_MODES: [AddressingMode; 256] = [
    //  x0   x1   x2   x3   x4   x5   x6   x7   x8   x9   xA   xB   xC   xD   xE   xF
    IMP, IZX, IMP, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, ACC, IMM, ABS, ABS, ABS, ABS, // 0x
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // 1x
    ABS, IZX, IMP, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, ACC, IMM, ABS, ABS, ABS, ABS, // 2x
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // 3x
    IMP, IZX, IMP, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, ACC, IMM, ABS, ABS, ABS, ABS, // 4x
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // 5x
    IMP, IZX, IMP, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, ACC, IMM, IND, ABS, ABS, ABS, // 6x
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // 7x
    IMM, IZX, IMM, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, IMP, IMM, ABS, ABS, ABS, ABS, // 8x
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPY, ZPY, IMP, ABY, IMP, ABY, ABX, ABX, ABY, ABY, // 9x
    IMM, IZX, IMM, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, IMP, IMM, ABS, ABS, ABS, ABS, // Ax
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPY, ZPY, IMP, ABY, IMP, ABY, ABX, ABX, ABY, ABY, // Bx
    IMM, IZX, IMM, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, IMP, IMM, ABS, ABS, ABS, ABS, // Cx
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // Dx
    IMM, IZX, IMM, IZX, ZPG, ZPG, ZPG, ZPG, IMP, IMM, IMP, IMM, ABS, ABS, ABS, ABS, // Ex
    REL, IZY, IMP, IZY, ZPX, ZPX, ZPX, ZPX, IMP, ABY, IMP, ABY, ABX, ABX, ABX, ABX, // Fx
];

#[rustfmt::skip]
pub const OPERATIONS: [Operation; 256] = {
    use Operation::*;

    [
        // x0 x1   x2   x3   x4   x5   x6   x7   x8   x9   xA   xB   xC   xD   xE   xF
        Brk, Ora, Jam, Slo, Nop, Ora, Asl, Slo, Php, Ora, Asl, Anc, Nop, Ora, Asl, Slo, // 0x
        Bpl, Ora, Jam, Slo, Nop, Ora, Asl, Slo, Clc, Ora, Nop, Slo, Nop, Ora, Asl, Slo, // 1x
        Jsr, And, Jam, Rla, Bit, And, Rol, Rla, Plp, And, Rol, Anc, Bit, And, Rol, Rla, // 2x
        Bmi, And, Jam, Rla, Nop, And, Rol, Rla, Sec, And, Nop, Rla, Nop, And, Rol, Rla, // 3x
        Rti, Eor, Jam, Sre, Nop, Eor, Lsr, Sre, Pha, Eor, Lsr, Alr, Jmp, Eor, Lsr, Sre, // 4x
        Bvc, Eor, Jam, Sre, Nop, Eor, Lsr, Sre, Cli, Eor, Nop, Sre, Nop, Eor, Lsr, Sre, // 5x
        Rts, Adc, Jam, Rra, Nop, Adc, Ror, Rra, Pla, Adc, Ror, Arr, Jmp, Adc, Ror, Rra, // 6x
        Bvs, Adc, Jam, Rra, Nop, Adc, Ror, Rra, Sei, Adc, Nop, Rra, Nop, Adc, Ror, Rra, // 7x
        Nop, Sta, Nop, Sax, Sty, Sta, Stx, Sax, Dey, Nop, Txa, Ane, Sty, Sta, Stx, Sax, // 8x
        Bcc, Sta, Jam, Sha, Sty, Sta, Stx, Sax, Tya, Sta, Txs, Tas, Shy, Sta, Shx, Sha, // 9x
        Ldy, Lda, Ldx, Lax, Ldy, Lda, Ldx, Lax, Tay, Lda, Tax, Lxa, Ldy, Lda, Ldx, Lax, // Ax
        Bcs, Lda, Jam, Lax, Ldy, Lda, Ldx, Lax, Clv, Lda, Tsx, Las, Ldy, Lda, Ldx, Lax, // Bx
        Cpy, Cmp, Nop, Dcp, Cpy, Cmp, Dec, Dcp, Iny, Cmp, Dex, Sbx, Cpy, Cmp, Dec, Dcp, // Cx
        Bne, Cmp, Jam, Dcp, Nop, Cmp, Dec, Dcp, Cld, Cmp, Nop, Dcp, Nop, Cmp, Dec, Dcp, // Dx
        Cpx, Sbc, Nop, Isc, Cpx, Sbc, Inc, Isc, Inx, Sbc, Nop, Sbc, Cpx, Sbc, Inc, Isc, // Ex
        Beq, Sbc, Jam, Isc, Nop, Sbc, Inc, Isc, Sed, Sbc, Nop, Isc, Nop, Sbc, Inc, Isc, // Fx
    ]
};

#[inline]
#[must_use]
pub fn decode(opcode: u8) -> (AddressingMode, Operation) {
    (ADDRESSING_MODES[opcode as usize], OPERATIONS[opcode as usize])
}
