// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::CpuError;
use io::log::{self, Diagnostic, DiagnosticSink};
use m7::instruction::Instruction;
use m7::machine::{PushMode, RuntimeOptions};
use m7::memory::Memory;
use m7::opcode::{Opcode, Width, OPCODE_BITMASK};
use m7::registers::Registers;
use std::fmt;
use utils::arithmetic::{self, AluOp};

/// Comparison performed by the conditional register jumps. All comparisons
/// are unsigned.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Condition {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Condition {
    #[inline(always)]
    fn holds(self, lhs: u16, rhs: u16) -> bool {
        match self {
            Condition::Equal          => lhs == rhs,
            Condition::NotEqual       => lhs != rhs,
            Condition::Greater        => lhs > rhs,
            Condition::GreaterOrEqual => lhs >= rhs,
            Condition::Less           => lhs < rhs,
            Condition::LessOrEqual    => lhs <= rhs,
        }
    }
}

/// A small 16-bit CPU with six general purpose registers, a program counter,
/// a stack pointer and a status byte.
///
/// Execution is budgeted in cycles rather than clocked. Every byte moved
/// between the CPU and memory costs exactly one cycle, whether it is an
/// opcode, an operand, a data access or a stack slot. Nothing else costs
/// anything. An instruction always runs to completion, so the last one of a
/// run may overdraw the budget.
pub struct CPU {
    pub registers: Registers,

    // Set by HALT. While set no further instructions are fetched. Only an
    // external reset clears it, the RESET instruction leaves it alone.
    pub halted: bool,

    // Cycles left in the current budget. Goes negative when the final
    // instruction of a run overdraws it.
    pub cycles: i64,

    // Options passed from the host that may influence how the CPU behaves.
    runtime_options: RuntimeOptions,
}

impl CPU {
    pub fn new(runtime_options: RuntimeOptions) -> CPU {
        CPU {
            registers: Registers::new(),
            halted: false,
            cycles: 0,
            runtime_options: runtime_options,
        }
    }

    /// Clears memory and puts the registers back in their power-on state. The
    /// halted flag is untouched.
    pub fn reset(&mut self, memory: &mut Memory) {
        memory.clear();
        self.registers.reset();
    }

    #[inline(always)]
    fn charge(&mut self, cycles: i64) {
        self.cycles -= cycles;
    }

    // Instruction stream access.

    /// Reads the byte under the program counter and advances it.
    pub fn fetch_u8(&mut self, memory: &Memory) -> u8 {
        let pc = self.registers.pc();
        self.registers.set_pc(pc.wrapping_add(1));
        self.charge(1);
        memory.read_u8(pc)
    }

    /// Reads the little-endian word under the program counter and advances it
    /// past both bytes.
    pub fn fetch_u16(&mut self, memory: &Memory) -> u16 {
        let pc = self.registers.pc();
        self.registers.set_pc(pc.wrapping_add(2));
        self.charge(2);
        memory.read_u16(pc)
    }

    // Data access.

    pub fn read_u8(&mut self, memory: &Memory, addr: u16) -> u8 {
        self.charge(1);
        memory.read_u8(addr)
    }

    pub fn read_u16(&mut self, memory: &Memory, addr: u16) -> u16 {
        self.charge(2);
        memory.read_u16(addr)
    }

    pub fn write_u8(&mut self, memory: &mut Memory, addr: u16, value: u8) {
        self.charge(1);
        memory.write_u8(addr, value);
    }

    pub fn write_u16(&mut self, memory: &mut Memory, addr: u16, value: u16) {
        self.charge(2);
        memory.write_u16(addr, value);
    }

    // Utility functions for managing the stack. Pushes pre-decrement the stack
    // pointer and pops post-increment it, so SP always addresses the topmost
    // occupied byte.

    /// Pushes an 8-bit number onto the stack.
    pub fn stack_push_u8(&mut self, memory: &mut Memory, value: u8) {
        let sp = self.registers.sp().wrapping_sub(1);
        self.registers.set_sp(sp);
        self.write_u8(memory, sp, value);
    }

    /// Pops an 8-bit number off the stack.
    pub fn stack_pop_u8(&mut self, memory: &Memory) -> u8 {
        let sp = self.registers.sp();
        let value = self.read_u8(memory, sp);
        self.registers.set_sp(sp.wrapping_add(1));
        value
    }

    /// Pushes a 16-bit number (usually an address) onto the stack.
    pub fn stack_push_u16(&mut self, memory: &mut Memory, value: u16) {
        let sp = self.registers.sp().wrapping_sub(2);
        self.registers.set_sp(sp);
        self.write_u16(memory, sp, value);
    }

    /// Pops a 16-bit number (usually an address) off the stack.
    pub fn stack_pop_u16(&mut self, memory: &Memory) -> u16 {
        let sp = self.registers.sp();
        let value = self.read_u16(memory, sp);
        self.registers.set_sp(sp.wrapping_add(2));
        value
    }

    // Width-dependent operand helpers. Byte values are zero-extended.

    /// Fetches a register operand, rejecting indices past the stack pointer.
    fn fetch_register(&mut self, memory: &Memory, pc: u16) -> Result<usize, CpuError> {
        let index = self.fetch_u8(memory);
        if Registers::is_valid(index) {
            Ok(index as usize)
        } else {
            Err(CpuError::InvalidRegister { pc: pc, index: index })
        }
    }

    fn fetch_operand(&mut self, memory: &Memory, width: Width) -> u16 {
        match width {
            Width::Byte => self.fetch_u8(memory) as u16,
            Width::Word => self.fetch_u16(memory),
        }
    }

    fn read_operand(&mut self, memory: &Memory, width: Width, addr: u16) -> u16 {
        match width {
            Width::Byte => self.read_u8(memory, addr) as u16,
            Width::Word => self.read_u16(memory, addr),
        }
    }

    fn write_operand(&mut self, memory: &mut Memory, width: Width, addr: u16, value: u16) {
        match width {
            Width::Byte => self.write_u8(memory, addr, value as u8),
            Width::Word => self.write_u16(memory, addr, value),
        }
    }

    fn pop_operand(&mut self, memory: &Memory, width: Width) -> u16 {
        match width {
            Width::Byte => self.stack_pop_u8(memory) as u16,
            Width::Word => self.stack_pop_u16(memory),
        }
    }

    /// Runs instructions until the budget is spent or a HALT is executed and
    /// returns what is left of the budget. A negative result means the final
    /// instruction overdrew it, which is reported to the sink but is not a
    /// fault.
    pub fn execute(&mut self, memory: &mut Memory, budget: i64, sink: &mut dyn DiagnosticSink) -> Result<i64, CpuError> {
        self.cycles = budget;
        let mut stepped = false;

        while self.cycles > 0 && !self.halted {
            self.step(memory, sink)?;
            stepped = true;
        }

        if stepped && self.cycles < 0 {
            sink.emit(Diagnostic::CycleOverrun { overdrawn: -self.cycles });
        }

        Ok(self.cycles)
    }

    /// Fetches, decodes and executes a single instruction, charging its cycles
    /// against the current budget. Does nothing while halted.
    pub fn step(&mut self, memory: &mut Memory, sink: &mut dyn DiagnosticSink) -> Result<(), CpuError> {
        if self.halted {
            return Ok(());
        }

        let pc = self.registers.pc();
        let raw = self.fetch_u8(memory);
        let instr = match Instruction::decode(raw) {
            Some(instr) => instr,
            None => {
                let opcode = raw & OPCODE_BITMASK;
                sink.emit(Diagnostic::IllegalInstruction { pc: pc, opcode: opcode });
                return Err(CpuError::IllegalInstruction { pc: pc, opcode: opcode });
            },
        };

        if self.runtime_options.verbose {
            log::log("cpu", instr.log(pc, self), &self.runtime_options);
        }

        let width = instr.width;

        match instr.opcode {
            Opcode::NOP => {},

            Opcode::ADD  => self.alu_registers(memory, pc, AluOp::Add)?,
            Opcode::ADDC => self.alu_constant(memory, pc, AluOp::Add, width)?,
            Opcode::ADDA => self.alu_memory(memory, pc, AluOp::Add, width)?,
            Opcode::SUB  => self.alu_registers(memory, pc, AluOp::Sub)?,
            Opcode::SUBC => self.alu_constant(memory, pc, AluOp::Sub, width)?,
            Opcode::SUBA => self.alu_memory(memory, pc, AluOp::Sub, width)?,
            Opcode::MUL  => self.alu_registers(memory, pc, AluOp::Mul)?,
            Opcode::MULC => self.alu_constant(memory, pc, AluOp::Mul, width)?,
            Opcode::MULA => self.alu_memory(memory, pc, AluOp::Mul, width)?,
            Opcode::DIV  => self.alu_registers(memory, pc, AluOp::Div)?,
            Opcode::DIVC => self.alu_constant(memory, pc, AluOp::Div, width)?,
            Opcode::DIVA => self.alu_memory(memory, pc, AluOp::Div, width)?,

            Opcode::CMP => {
                let reg1 = self.fetch_register(memory, pc)?;
                let reg2 = self.fetch_register(memory, pc)?;
                let (lhs, rhs) = (self.registers.read(reg1), self.registers.read(reg2));
                self.compare(lhs, rhs);
            },
            Opcode::CMPA => {
                let reg = self.fetch_register(memory, pc)?;
                let addr = self.fetch_u16(memory);
                let rhs = self.read_operand(memory, width, addr);
                let lhs = self.registers.read(reg);
                self.compare(lhs, rhs);
            },

            Opcode::INC => {
                let reg = self.fetch_register(memory, pc)?;
                let value = arithmetic::increment(self.registers.read(reg));
                self.registers.write(reg, value);
            },
            Opcode::DEC => {
                let reg = self.fetch_register(memory, pc)?;
                let value = arithmetic::decrement(self.registers.read(reg));
                self.registers.write(reg, value);
            },
            Opcode::INCM => {
                let addr = self.fetch_u16(memory);
                self.step_memory(memory, width, addr, true);
            },
            Opcode::DECM => {
                let addr = self.fetch_u16(memory);
                self.step_memory(memory, width, addr, false);
            },

            Opcode::UXT => {
                let reg = self.fetch_register(memory, pc)?;
                let value = self.registers.read(reg) & 0x00FF;
                self.registers.write(reg, value);
            },

            Opcode::LDR => {
                let reg1 = self.fetch_register(memory, pc)?;
                let reg2 = self.fetch_register(memory, pc)?;
                let value = self.registers.read(reg2);
                self.registers.write(reg1, value);
            },
            Opcode::LDC => {
                let reg = self.fetch_register(memory, pc)?;
                let value = self.fetch_operand(memory, width);
                self.registers.write(reg, value);
            },
            Opcode::LDM => {
                let reg = self.fetch_register(memory, pc)?;
                let addr = self.fetch_u16(memory);
                let value = self.read_operand(memory, width, addr);
                self.registers.write(reg, value);
            },
            Opcode::STRM => {
                let reg = self.fetch_register(memory, pc)?;
                let addr = self.fetch_u16(memory);
                let value = self.registers.read(reg);
                self.write_operand(memory, width, addr, value);
            },
            Opcode::STCM => {
                let value = self.fetch_operand(memory, width);
                let addr = self.fetch_u16(memory);
                self.write_operand(memory, width, addr, value);
            },

            Opcode::JSR => {
                let target = self.fetch_u16(memory);
                let ret = self.registers.pc();
                self.stack_push_u16(memory, ret);
                self.registers.set_pc(target);
            },
            Opcode::RTN => {
                let ret = self.stack_pop_u16(memory);
                self.registers.set_pc(ret);
            },
            Opcode::JMP => {
                let target = self.fetch_u16(memory);
                self.registers.set_pc(target);
            },
            Opcode::JRZ => {
                let reg = self.fetch_register(memory, pc)?;
                if self.registers.read(reg) == 0 {
                    let target = self.fetch_u16(memory);
                    self.registers.set_pc(target);
                } else {
                    // Skipped without reading, so the target costs nothing.
                    let next = self.registers.pc().wrapping_add(2);
                    self.registers.set_pc(next);
                }
            },
            Opcode::JRE  => self.jump_constant(memory, pc, width, Condition::Equal)?,
            Opcode::JRN  => self.jump_constant(memory, pc, width, Condition::NotEqual)?,
            Opcode::JRG  => self.jump_constant(memory, pc, width, Condition::Greater)?,
            Opcode::JRL  => self.jump_constant(memory, pc, width, Condition::Less)?,
            Opcode::JRLE => self.jump_constant(memory, pc, width, Condition::LessOrEqual)?,
            Opcode::JRGE => self.jump_constant(memory, pc, width, Condition::GreaterOrEqual)?,
            Opcode::JREM  => self.jump_memory(memory, pc, width, Condition::Equal)?,
            Opcode::JRNM  => self.jump_memory(memory, pc, width, Condition::NotEqual)?,
            Opcode::JRGM  => self.jump_memory(memory, pc, width, Condition::Greater)?,
            Opcode::JRLM  => self.jump_memory(memory, pc, width, Condition::Less)?,
            Opcode::JRLEM => self.jump_memory(memory, pc, width, Condition::LessOrEqual)?,
            Opcode::JRGEM => self.jump_memory(memory, pc, width, Condition::GreaterOrEqual)?,

            // PUSH ignores the width modifier and always pushes a word, while
            // POP honours it.
            Opcode::PUSH => {
                let reg = self.fetch_register(memory, pc)?;
                let value = self.registers.read(reg);
                self.stack_push_u16(memory, value);
            },
            Opcode::PUSHM => {
                let reg = self.fetch_register(memory, pc)?;
                let addr = self.fetch_u16(memory);
                let operand = self.read_operand(memory, width, addr);
                let value = self.push_value(reg, operand);
                self.stack_push_u16(memory, value);
            },
            Opcode::PUSHC => {
                let reg = self.fetch_register(memory, pc)?;
                let operand = self.fetch_operand(memory, width);
                let value = self.push_value(reg, operand);
                self.stack_push_u16(memory, value);
            },
            Opcode::POP => {
                let reg = self.fetch_register(memory, pc)?;
                let value = self.pop_operand(memory, width);
                self.registers.write(reg, value);
            },
            Opcode::POPM => {
                let addr = self.fetch_u16(memory);
                let value = self.pop_operand(memory, width);
                self.write_operand(memory, width, addr, value);
            },
            Opcode::PUSHS => {
                let status = self.registers.status;
                self.stack_push_u8(memory, status);
            },
            Opcode::POPS => {
                self.registers.status = self.stack_pop_u8(memory);
            },

            Opcode::RESET => {
                self.reset(memory);
                sink.emit(Diagnostic::Reset);
            },
            Opcode::HALT => {
                self.halted = true;
                sink.emit(Diagnostic::Halt);
            },
        }

        Ok(())
    }

    // Instruction handlers shared by more than one opcode.

    /// `op reg1, reg2`: R[reg1] <- R[reg1] op R[reg2].
    fn alu_registers(&mut self, memory: &Memory, pc: u16, op: AluOp) -> Result<(), CpuError> {
        let reg1 = self.fetch_register(memory, pc)?;
        let reg2 = self.fetch_register(memory, pc)?;
        let rhs = self.registers.read(reg2);
        self.alu_store(pc, op, Width::Word, reg1, rhs)
    }

    /// `opC reg, imm`: R[reg] <- R[reg] op imm.
    fn alu_constant(&mut self, memory: &Memory, pc: u16, op: AluOp, width: Width) -> Result<(), CpuError> {
        let reg = self.fetch_register(memory, pc)?;
        let rhs = self.fetch_operand(memory, width);
        self.alu_store(pc, op, width, reg, rhs)
    }

    /// `opA reg, addr`: R[reg] <- R[reg] op M[addr].
    fn alu_memory(&mut self, memory: &Memory, pc: u16, op: AluOp, width: Width) -> Result<(), CpuError> {
        let reg = self.fetch_register(memory, pc)?;
        let addr = self.fetch_u16(memory);
        let rhs = self.read_operand(memory, width, addr);
        self.alu_store(pc, op, width, reg, rhs)
    }

    /// The byte form works on the low byte of the register and zero-extends
    /// the result back into it. Flags are left alone.
    fn alu_store(&mut self, pc: u16, op: AluOp, width: Width, reg: usize, rhs: u16) -> Result<(), CpuError> {
        let lhs = self.registers.read(reg);
        let result = match width {
            Width::Byte => arithmetic::apply(op, lhs as u8, rhs as u8).map(|r| r as u16),
            Width::Word => arithmetic::apply(op, lhs, rhs),
        };
        let result = result.ok_or(CpuError::DivisionByZero { pc: pc })?;
        self.registers.write(reg, result);
        Ok(())
    }

    /// Sets N and Z from `lhs - rhs` and discards the difference.
    fn compare(&mut self, lhs: u16, rhs: u16) {
        let difference = lhs.wrapping_sub(rhs);
        self.registers.toggle_negative_flag(difference);
        self.registers.toggle_zero_flag(difference);
    }

    /// Increments or decrements memory in place, wrapping at the operand
    /// width.
    fn step_memory(&mut self, memory: &mut Memory, width: Width, addr: u16, up: bool) {
        match width {
            Width::Byte => {
                let value = self.read_u8(memory, addr);
                let value = if up { arithmetic::increment(value) } else { arithmetic::decrement(value) };
                self.write_u8(memory, addr, value);
            },
            Width::Word => {
                let value = self.read_u16(memory, addr);
                let value = if up { arithmetic::increment(value) } else { arithmetic::decrement(value) };
                self.write_u16(memory, addr, value);
            },
        }
    }

    /// `JRx reg, imm, target`. The target is always fetched.
    fn jump_constant(&mut self, memory: &Memory, pc: u16, width: Width, condition: Condition) -> Result<(), CpuError> {
        let reg = self.fetch_register(memory, pc)?;
        let rhs = self.fetch_operand(memory, width);
        let target = self.fetch_u16(memory);
        self.jump_if(condition, reg, rhs, target);
        Ok(())
    }

    /// `JRxM reg, addr, target`. The memory operand is read before the target
    /// is fetched, and the target is always fetched.
    fn jump_memory(&mut self, memory: &Memory, pc: u16, width: Width, condition: Condition) -> Result<(), CpuError> {
        let reg = self.fetch_register(memory, pc)?;
        let addr = self.fetch_u16(memory);
        let rhs = self.read_operand(memory, width, addr);
        let target = self.fetch_u16(memory);
        self.jump_if(condition, reg, rhs, target);
        Ok(())
    }

    #[inline(always)]
    fn jump_if(&mut self, condition: Condition, reg: usize, rhs: u16, target: u16) {
        if condition.holds(self.registers.read(reg), rhs) {
            self.registers.set_pc(target);
        }
    }

    /// Picks the word PUSHM and PUSHC put on the stack.
    fn push_value(&self, reg: usize, operand: u16) -> u16 {
        match self.runtime_options.push_mode {
            PushMode::Faithful => self.registers.read(reg),
            PushMode::Corrected => operand,
        }
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\nCPU State:")?;
        writeln!(f, "    Halted:          {}", self.halted)?;
        writeln!(f, "    Cycles Left:     {}", self.cycles)?;
        write!(f, "{}", self.registers)
    }
}
