//! Byte and word primitives shared by the CPU crates.

pub mod num;
