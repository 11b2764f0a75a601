// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use m7::memory::MEM_SIZE;
use std::error::Error;
use std::fmt;

// Exit codes used throughout the application. These exit codes has specific
// meanings and are used when no OS error codes are available.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID_IMAGE: i32 = 2; // Unreadable or oversized image.
pub const EXIT_INVALID_OPTIONS: i32 = 3;
pub const EXIT_DEBUGGER_FAILURE: i32 = 4;
pub const EXIT_RUNTIME_FAILURE: i32 = 101;

/// Faults that stop the machine. Every variant raised during execution
/// carries the address of the opcode byte of the faulting instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuError {
    /// The seven opcode bits don't name an instruction.
    IllegalInstruction { pc: u16, opcode: u8 },
    /// A DIV, DIVC or DIVA had a zero divisor.
    DivisionByZero { pc: u16 },
    /// A register operand byte was outside 0 through 7.
    InvalidRegister { pc: u16, index: u8 },
    /// A program image does not fit in memory.
    ImageTooLarge { len: usize },
}

impl CpuError {
    /// Exit code the front end reports for this fault.
    pub fn exit_code(&self) -> i32 {
        match *self {
            CpuError::ImageTooLarge { .. } => EXIT_INVALID_IMAGE,
            _ => EXIT_RUNTIME_FAILURE,
        }
    }
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CpuError::IllegalInstruction { pc, opcode } =>
                write!(f, "illegal instruction {:#04X} at {:#06X}", opcode, pc),
            CpuError::DivisionByZero { pc } =>
                write!(f, "division by zero at {:#06X}", pc),
            CpuError::InvalidRegister { pc, index } =>
                write!(f, "invalid register index {} at {:#06X}", index, pc),
            CpuError::ImageTooLarge { len } =>
                write!(f, "image of {} bytes does not fit in {} bytes of memory", len, MEM_SIZE),
        }
    }
}

impl Error for CpuError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_faults_share_exit_code() {
        assert_eq!(CpuError::DivisionByZero { pc: 0 }.exit_code(), EXIT_RUNTIME_FAILURE);
        assert_eq!(CpuError::IllegalInstruction { pc: 0, opcode: 0x14 }.exit_code(), EXIT_RUNTIME_FAILURE);
        assert_eq!(CpuError::ImageTooLarge { len: 0x10001 }.exit_code(), EXIT_INVALID_IMAGE);
    }

    #[test]
    fn messages_name_the_faulting_address() {
        let err = CpuError::InvalidRegister { pc: 0x0010, index: 9 };
        assert_eq!(err.to_string(), "invalid register index 9 at 0x0010");
        let err = CpuError::IllegalInstruction { pc: 0x0002, opcode: 0x14 };
        assert_eq!(err.to_string(), "illegal instruction 0x14 at 0x0002");
    }
}
