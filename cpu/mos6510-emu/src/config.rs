use bincode::{Decode, Encode};

/// Constants for the unstable undocumented opcodes whose results depend on analog effects in
/// real silicon. $EE matches the value most commonly observed on C64 hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Mos6510Config {
    /// ANE ($8B): `A = (A | ane_magic) & X & imm`
    pub ane_magic: u8,
    /// LXA ($AB): `A = X = (A | lxa_magic) & imm`
    pub lxa_magic: u8,
}

impl Mos6510Config {
    pub const DEFAULT_MAGIC: u8 = 0xEE;
}

impl Default for Mos6510Config {
    fn default() -> Self {
        Self { ane_magic: Self::DEFAULT_MAGIC, lxa_magic: Self::DEFAULT_MAGIC }
    }
}
