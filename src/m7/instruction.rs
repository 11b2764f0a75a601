// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use m7::cpu::CPU;
use m7::opcode::{self, Opcode, Width};

/// A decoded instruction byte. Operands are not part of the instruction
/// because handlers fetch them from the instruction stream one at a time,
/// paying a cycle for every byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub raw: u8,
    pub opcode: Opcode,
    pub width: Width,
}

impl Instruction {
    /// Splits an instruction byte into its opcode and width modifier. Returns
    /// None for opcodes outside the instruction table.
    pub fn decode(raw: u8) -> Option<Instruction> {
        opcode::decode_opcode(raw).map(|opcode| Instruction {
            raw: raw,
            opcode: opcode,
            width: Width::from_instruction_byte(raw),
        })
    }

    /// Mnemonic with a `.b` suffix for the byte form of width-sensitive
    /// opcodes.
    pub fn mnemonic(&self) -> String {
        if self.width == Width::Byte && opcode::width_sensitive(self.opcode) {
            format!("{:?}.b", self.opcode)
        } else {
            format!("{:?}", self.opcode)
        }
    }

    /// Formats a trace line for this instruction, fetched from `pc`, along
    /// with the CPU state before it executes.
    pub fn log(&self, pc: u16, cpu: &CPU) -> String {
        let r = &cpu.registers;
        format!("{:04X}  {:02X}  {:8}  R0:{:04X} R1:{:04X} R2:{:04X} R3:{:04X} R4:{:04X} R5:{:04X} SP:{:04X} ST:{:02X} CYC:{}",
                pc, self.raw, self.mnemonic(), r.read(0), r.read(1), r.read(2),
                r.read(3), r.read(4), r.read(5), r.sp(), r.status, cpu.cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use m7::machine::{PushMode, RuntimeOptions};

    #[test]
    fn decode_splits_width_bit() {
        let instr = Instruction::decode(0xB1).unwrap();
        assert_eq!(instr.opcode, Opcode::LDC);
        assert_eq!(instr.width, Width::Byte);
        assert_eq!(instr.raw, 0xB1);

        assert!(Instruction::decode(0x14).is_none());
    }

    #[test]
    fn byte_suffix_only_where_width_matters() {
        assert_eq!(Instruction::decode(0xB1).unwrap().mnemonic(), "LDC.b");
        assert_eq!(Instruction::decode(0x31).unwrap().mnemonic(), "LDC");
        assert_eq!(Instruction::decode(0xE0).unwrap().mnemonic(), "PUSH");
    }

    #[test]
    fn trace_line_layout() {
        let cpu = CPU::new(RuntimeOptions::new(PushMode::Faithful));
        let line = Instruction::decode(0x7F).unwrap().log(0x0000, &cpu);
        assert!(line.starts_with("0000  7F  HALT"));
        assert!(line.contains("SP:FFFF"));
        assert!(line.ends_with("ST:00 CYC:0"));
    }
}
