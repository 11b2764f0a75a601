// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use enum_primitive::FromPrimitive;

// The top bit of every instruction byte is the width modifier, the remaining
// seven bits are the opcode.
pub const WIDTH_BITMASK : u8 = 0x80;
pub const OPCODE_BITMASK: u8 = 0x7F;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Opcode {
        NOP   = 0x00,

        ADD   = 0x01,
        ADDC  = 0x02,
        ADDA  = 0x03,
        SUB   = 0x04,
        SUBC  = 0x05,
        SUBA  = 0x06,
        MUL   = 0x07,
        MULC  = 0x08,
        MULA  = 0x09,
        DIV   = 0x0A,
        DIVC  = 0x0B,
        DIVA  = 0x0C,

        CMP   = 0x0E,
        CMPA  = 0x0F,

        INC   = 0x10,
        INCM  = 0x11,
        DEC   = 0x12,
        DECM  = 0x13,

        UXT   = 0x20,

        LDR   = 0x30,
        LDC   = 0x31,
        LDM   = 0x32,
        STRM  = 0x33,
        STCM  = 0x35,

        JSR   = 0x40,
        RTN   = 0x41,
        JMP   = 0x42,
        JRZ   = 0x43,
        JRE   = 0x44,
        JRN   = 0x45,
        JRG   = 0x46,
        JRL   = 0x47,
        JRLE  = 0x48,
        JRGE  = 0x49,
        JREM  = 0x4A,
        JRNM  = 0x4B,
        JRGM  = 0x4C,
        JRLM  = 0x4D,
        JRLEM = 0x4E,
        JRGEM = 0x4F,

        PUSH  = 0x60,
        PUSHM = 0x61,
        PUSHC = 0x62,
        POP   = 0x63,
        POPM  = 0x64,
        PUSHS = 0x65,
        POPS  = 0x66,

        RESET = 0x7E,
        HALT  = 0x7F,
    }
}

/// Operand width selected by the top bit of the instruction byte. A set bit
/// selects the byte form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    #[inline(always)]
    pub fn from_instruction_byte(byte: u8) -> Width {
        if byte & WIDTH_BITMASK == WIDTH_BITMASK {
            Width::Byte
        } else {
            Width::Word
        }
    }
}

/// Decodes the opcode half of an instruction byte. Returns None when the seven
/// opcode bits name nothing in the instruction table.
pub fn decode_opcode(byte: u8) -> Option<Opcode> {
    Opcode::from_u8(byte & OPCODE_BITMASK)
}

/// Whether an opcode honours the width modifier. Opcodes that don't simply
/// ignore it.
pub fn width_sensitive(opcode: Opcode) -> bool {
    use self::Opcode::*;

    match opcode {
        ADDC | ADDA | SUBC | SUBA | MULC | MULA | DIVC | DIVA |
        CMPA | INCM | DECM |
        LDC | LDM | STRM | STCM |
        JRE | JRN | JRG | JRL | JRLE | JRGE |
        JREM | JRNM | JRGM | JRLM | JRLEM | JRGEM |
        PUSHM | PUSHC | POP | POPM => true,
        _ => false,
    }
}
