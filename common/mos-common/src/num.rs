pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;
}

pub trait SetBit: Sized {
    #[must_use]
    fn with_bit(self, i: u8, value: bool) -> Self;

    fn set_bit(&mut self, i: u8, value: bool);
}

macro_rules! impl_bit_traits {
    ($t:ty) => {
        impl GetBit for $t {
            #[inline]
            fn bit(self, i: u8) -> bool {
                debug_assert!(i < (<$t>::BITS as u8));
                self & (1 << i) != 0
            }
        }

        impl SetBit for $t {
            #[inline]
            fn with_bit(self, i: u8, value: bool) -> Self {
                debug_assert!(i < (<$t>::BITS as u8));
                if value { self | (1 << i) } else { self & !(1 << i) }
            }

            #[inline]
            fn set_bit(&mut self, i: u8, value: bool) {
                *self = self.with_bit(i, value);
            }
        }
    };
}

impl_bit_traits!(u8);
impl_bit_traits!(u16);

/// Low/high byte access for 16-bit addresses and register pairs.
pub trait U16Ext {
    fn lsb(self) -> u8;

    fn msb(self) -> u8;

    fn from_halves(lsb: u8, msb: u8) -> Self;
}

impl U16Ext for u16 {
    #[inline(always)]
    fn lsb(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    fn msb(self) -> u8 {
        (self >> 8) as u8
    }

    #[inline(always)]
    fn from_halves(lsb: u8, msb: u8) -> Self {
        u16::from_le_bytes([lsb, msb])
    }
}
