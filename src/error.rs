use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a font or program into the Emulator
#[derive(Debug, Error)]
pub enum InitError {
    #[error("program file {} could not be read: {source}", path.display())]
    ProgramNotFound { path: PathBuf, source: io::Error },

    #[error("font file {} could not be read: {source}", path.display())]
    FontNotFound { path: PathBuf, source: io::Error },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("font must be exactly 80 bytes, got {len}")]
    InvalidFont { len: usize },
}

/// Errors raised by `Emulator::step`. The Emulator's state is left untouched
/// whenever one of these is returned, so the same instruction will fail again
/// if `step` is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("illegal instruction {opcode:#06X} at {pc:#05X}")]
    IllegalInstruction { pc: u16, opcode: u16 },

    #[error("memory access out of bounds at address {addr:#06X} (pc {pc:#05X})")]
    MemoryFault { pc: u16, addr: usize },

    #[error("stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with an empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("register holds {key:#04X}, which is not a key (pc {pc:#05X})")]
    InvalidKey { pc: u16, key: u8 },
}

impl RuntimeError {
    /// The program counter of the instruction that failed
    pub fn pc(&self) -> u16 {
        match *self {
            RuntimeError::IllegalInstruction { pc, .. }
            | RuntimeError::MemoryFault { pc, .. }
            | RuntimeError::StackOverflow { pc }
            | RuntimeError::StackUnderflow { pc }
            | RuntimeError::InvalidKey { pc, .. } => pc,
        }
    }
}

/// Errors raised while reading a `Config` or building the logger it describes
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} could not be read: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("could not build logger: {0}")]
    Logger(#[from] sloggers::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_reports_pc() {
        let err = RuntimeError::IllegalInstruction {
            pc: 0x200,
            opcode: 0x0123,
        };
        assert_eq!(err.pc(), 0x200);
        assert_eq!(err.to_string(), "illegal instruction 0x0123 at 0x200");

        let err = RuntimeError::MemoryFault {
            pc: 0x2AE,
            addr: 0x1000,
        };
        assert_eq!(err.pc(), 0x2AE);
    }
}
