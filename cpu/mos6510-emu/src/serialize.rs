//! Save states: the complete CPU state, including any instruction in flight, encoded with bincode.

use crate::Mos6510;
use bincode::config::{Configuration, Fixint, LittleEndian};
use bincode::error::{DecodeError, EncodeError};
use std::io;
use std::io::{BufReader, BufWriter, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error saving state: {source}")]
    Serialization {
        #[from]
        source: EncodeError,
    },
    #[error("error loading state: {source}")]
    Deserialization {
        #[from]
        source: DecodeError,
    },
    #[error("save state has queued steps that do not match opcode {opcode:02X}")]
    InconsistentQueue { opcode: u8 },
    #[error("I/O error writing state: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_little_endian().with_fixed_int_encoding();

/// # Errors
///
/// Returns an error if encoding fails or the writer returns an I/O error.
pub fn save_state<W>(cpu: &Mos6510, writer: W) -> Result<(), SaveStateError>
where
    W: io::Write,
{
    let mut writer = BufWriter::new(writer);

    bincode::encode_into_std_write(cpu, &mut writer, BINCODE_CONFIG)?;
    writer.flush()?;

    Ok(())
}

/// # Errors
///
/// Returns an error if the reader fails, the data is not a valid encoded CPU state, or the
/// in-flight micro-steps could not have been queued for the latched opcode.
pub fn load_state<R>(reader: R) -> Result<Mos6510, SaveStateError>
where
    R: io::Read,
{
    let mut reader = BufReader::new(reader);

    let cpu: Mos6510 = bincode::decode_from_std_read(&mut reader, BINCODE_CONFIG)?;
    if !cpu.queue_matches_instruction() {
        return Err(SaveStateError::InconsistentQueue { opcode: cpu.latches.instruction });
    }

    Ok(cpu)
}
