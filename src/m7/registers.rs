// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use utils::arithmetic;

// Flag constants that allow easy bitwise getting and setting of flag values.
// Bit 5 is unused but is preserved across status pushes and pops.
pub const CARRY_FLAG       : u8 = 0x1;
pub const ZERO_FLAG        : u8 = 0x2;
pub const INTERRUPT_DISABLE: u8 = 0x4;
pub const DECIMAL_MODE     : u8 = 0x8;
pub const BREAK_COMMAND    : u8 = 0x10;
pub const OVERFLOW_FLAG    : u8 = 0x40;
pub const NEGATIVE_FLAG    : u8 = 0x80;

// Register slot indices. Slots 0 through 5 are general purpose.
pub const REGISTER_COUNT: usize = 8;
pub const GENERAL_PURPOSE_COUNT: usize = 6;
pub const PC: usize = 6;
pub const SP: usize = 7;

/// Initial stack pointer. The stack grows downwards from the top of memory.
pub const STACK_TOP: u16 = 0xFFFF;

/// The register file. Eight 16-bit slots addressed by index, where slot 6 is
/// the program counter and slot 7 is the stack pointer. Any instruction that
/// takes a register operand may name the PC or SP, in which case the write
/// changes control flow or stack state immediately.
///
/// The status byte sits beside the slots and is not reachable through a
/// register index.
#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    slots: [u16; REGISTER_COUNT],
    pub status: u8,
}

impl Registers {
    pub fn new() -> Registers {
        let mut slots = [0; REGISTER_COUNT];
        slots[SP] = STACK_TOP;

        Registers {
            slots: slots,
            status: 0,
        }
    }

    /// Returns true if the index names one of the eight slots.
    #[inline(always)]
    pub fn is_valid(index: u8) -> bool {
        (index as usize) < REGISTER_COUNT
    }

    /// Reads a slot. The caller is expected to have validated the index.
    #[inline(always)]
    pub fn read(&self, index: usize) -> u16 {
        self.slots[index]
    }

    /// Writes a slot. The caller is expected to have validated the index.
    #[inline(always)]
    pub fn write(&mut self, index: usize, value: u16) {
        self.slots[index] = value;
    }

    #[inline(always)]
    pub fn pc(&self) -> u16 {
        self.slots[PC]
    }

    #[inline(always)]
    pub fn set_pc(&mut self, value: u16) {
        self.slots[PC] = value;
    }

    #[inline(always)]
    pub fn sp(&self) -> u16 {
        self.slots[SP]
    }

    #[inline(always)]
    pub fn set_sp(&mut self, value: u16) {
        self.slots[SP] = value;
    }

    /// Zeroes R0 through R5 and the status byte, then points the PC at the
    /// start of memory and the SP at the top of the stack.
    pub fn reset(&mut self) {
        for slot in self.slots[..GENERAL_PURPOSE_COUNT].iter_mut() {
            *slot = 0;
        }
        self.status = 0;
        self.slots[PC] = 0;
        self.slots[SP] = STACK_TOP;
    }

    /// Returns true if every bit of `flag` is set in the status byte.
    #[inline(always)]
    pub fn flag_set(&self, flag: u8) -> bool {
        self.status & flag == flag
    }

    /// Sets or unsets a flag in the status byte.
    #[inline(always)]
    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    /// Sets the zero flag if the value passed is zero, otherwise it's unset.
    #[inline(always)]
    pub fn toggle_zero_flag(&mut self, value: u16) {
        self.set_flag(ZERO_FLAG, value == 0);
    }

    /// Sets the negative flag if the value passed would be negative as a
    /// signed word, otherwise it's unset.
    #[inline(always)]
    pub fn toggle_negative_flag(&mut self, value: u16) {
        self.set_flag(NEGATIVE_FLAG, arithmetic::is_negative(value));
    }

    /// Returns "SET" if the passed flag is set, otherwise "UNSET".
    fn fmt_flag(&self, flag: u8) -> &'static str {
        if self.flag_set(flag) { "SET" } else { "UNSET" }
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..GENERAL_PURPOSE_COUNT {
            writeln!(f, "    R{}:              {:#06X}", i, self.slots[i])?;
        }
        writeln!(f, "    Program Counter: {:#06X}", self.pc())?;
        writeln!(f, "    Stack Pointer:   {:#06X}", self.sp())?;
        writeln!(f)?;
        writeln!(f, "Status Register: {:#04X}", self.status)?;
        writeln!(f, "    Negative Flag:     {}", self.fmt_flag(NEGATIVE_FLAG))?;
        writeln!(f, "    Overflow Flag:     {}", self.fmt_flag(OVERFLOW_FLAG))?;
        writeln!(f, "    Break Command:     {}", self.fmt_flag(BREAK_COMMAND))?;
        writeln!(f, "    Decimal Mode:      {}", self.fmt_flag(DECIMAL_MODE))?;
        writeln!(f, "    Interrupt Disable: {}", self.fmt_flag(INTERRUPT_DISABLE))?;
        writeln!(f, "    Zero Flag:         {}", self.fmt_flag(ZERO_FLAG))?;
        write!(f, "    Carry Flag:        {}", self.fmt_flag(CARRY_FLAG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let registers = Registers::new();
        for i in 0..GENERAL_PURPOSE_COUNT {
            assert_eq!(registers.read(i), 0);
        }
        assert_eq!(registers.pc(), 0);
        assert_eq!(registers.sp(), 0xFFFF);
        assert_eq!(registers.status, 0);
    }

    #[test]
    fn pc_and_sp_are_slots_six_and_seven() {
        let mut registers = Registers::new();
        registers.write(6, 0x1234);
        registers.write(7, 0x8000);
        assert_eq!(registers.pc(), 0x1234);
        assert_eq!(registers.sp(), 0x8000);

        registers.set_pc(0x0042);
        assert_eq!(registers.read(PC), 0x0042);
    }

    #[test]
    fn register_index_validation() {
        assert!(Registers::is_valid(0));
        assert!(Registers::is_valid(7));
        assert!(!Registers::is_valid(8));
        assert!(!Registers::is_valid(0xFF));
    }

    #[test]
    fn reset_clears_general_purpose_and_status() {
        let mut registers = Registers::new();
        for i in 0..REGISTER_COUNT {
            registers.write(i, 0xAAAA);
        }
        registers.status = 0xFF;
        registers.reset();

        for i in 0..GENERAL_PURPOSE_COUNT {
            assert_eq!(registers.read(i), 0);
        }
        assert_eq!(registers.status, 0);
        assert_eq!(registers.pc(), 0);
        assert_eq!(registers.sp(), STACK_TOP);
    }

    #[test]
    fn flags_pack_into_distinct_bits() {
        let flags = [CARRY_FLAG, ZERO_FLAG, INTERRUPT_DISABLE, DECIMAL_MODE,
                     BREAK_COMMAND, OVERFLOW_FLAG, NEGATIVE_FLAG];
        let mut registers = Registers::new();

        for flag in flags.iter() {
            registers.set_flag(*flag, true);
            assert_eq!(registers.status, *flag);
            assert!(registers.flag_set(*flag));
            registers.set_flag(*flag, false);
            assert_eq!(registers.status, 0);
        }
    }

    #[test]
    fn toggles_follow_value() {
        let mut registers = Registers::new();
        registers.toggle_zero_flag(0);
        registers.toggle_negative_flag(0x8001);
        assert!(registers.flag_set(ZERO_FLAG | NEGATIVE_FLAG));

        registers.toggle_zero_flag(1);
        registers.toggle_negative_flag(0x7FFF);
        assert_eq!(registers.status, 0);
    }
}
