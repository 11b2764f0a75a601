// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::CpuError;
use io::log::{ConsoleSink, DiagnosticSink};
use m7::cpu::CPU;
use m7::memory::{Memory, MEM_SIZE};

/// What PUSHM and PUSHC put on the stack. Both modes fetch the same operands
/// and read the same memory, so they cost the same number of cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushMode {
    /// Push the register operand and throw the memory or immediate value away.
    Faithful,
    /// Push the memory or immediate value, zero-extended to a word.
    Corrected,
}

impl PushMode {
    pub fn parse(mode: &str) -> Option<PushMode> {
        match mode.to_lowercase().as_str() {
            "faithful" => Some(PushMode::Faithful),
            "corrected" => Some(PushMode::Corrected),
            _ => None,
        }
    }
}

/// Options chosen by the host that influence how the machine behaves. The
/// push mode has no default and must be picked by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeOptions {
    pub verbose: bool,
    pub push_mode: PushMode,
}

impl RuntimeOptions {
    pub fn new(push_mode: PushMode) -> RuntimeOptions {
        RuntimeOptions {
            verbose: false,
            push_mode: push_mode,
        }
    }
}

/// A CPU wired to its memory and to the sink that receives its diagnostics.
/// This is the surface hosts embed: load an image, reset, then execute with
/// a cycle budget.
pub struct Machine {
    runtime_options: RuntimeOptions,
    pub cpu: CPU,
    pub memory: Memory,
    sink: Box<dyn DiagnosticSink>,
}

impl Machine {
    /// Creates a machine that reports diagnostics to the console.
    pub fn new(runtime_options: RuntimeOptions) -> Machine {
        Machine::with_sink(runtime_options, Box::new(ConsoleSink::new(runtime_options)))
    }

    pub fn with_sink(runtime_options: RuntimeOptions, sink: Box<dyn DiagnosticSink>) -> Machine {
        Machine {
            runtime_options: runtime_options,
            cpu: CPU::new(runtime_options),
            memory: Memory::new(),
            sink: sink,
        }
    }

    /// Options the machine was built with. The CPU and the console sink hold
    /// their own copies, so these are fixed for the life of the machine.
    pub fn runtime_options(&self) -> &RuntimeOptions {
        &self.runtime_options
    }

    /// External reset. Unlike the RESET instruction this also clears the
    /// halted flag.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.memory);
        self.cpu.halted = false;
    }

    /// Copies a flat program image to address 0, where execution begins.
    pub fn load(&mut self, image: &[u8]) -> Result<(), CpuError> {
        if image.len() > MEM_SIZE {
            return Err(CpuError::ImageTooLarge { len: image.len() });
        }
        self.memory.memdump(0x0000, image);
        Ok(())
    }

    // Host memory access. None of these charge cycles.

    pub fn read_u8(&self, addr: u16) -> u8 {
        self.memory.read_u8(addr)
    }

    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.memory.write_u8(addr, val);
    }

    pub fn read_u16(&self, addr: u16) -> u16 {
        self.memory.read_u16(addr)
    }

    pub fn write_u16(&mut self, addr: u16, val: u16) {
        self.memory.write_u16(addr, val);
    }

    pub fn halted(&self) -> bool {
        self.cpu.halted
    }

    /// Runs until the budget is spent or the CPU halts. Returns the unused
    /// budget, negative if the last instruction overdrew it.
    pub fn execute(&mut self, budget: i64) -> Result<i64, CpuError> {
        self.cpu.execute(&mut self.memory, budget, &mut *self.sink)
    }

    /// Executes a single instruction regardless of any budget and returns the
    /// number of cycles it consumed. Consumes nothing while halted.
    pub fn step(&mut self) -> Result<i64, CpuError> {
        let before = self.cpu.cycles;
        self.cpu.step(&mut self.memory, &mut *self.sink)?;
        Ok(before - self.cpu.cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use io::log::NullSink;

    fn machine() -> Machine {
        Machine::with_sink(RuntimeOptions::new(PushMode::Faithful), Box::new(NullSink))
    }

    #[test]
    fn push_mode_parsing() {
        assert_eq!(PushMode::parse("faithful"), Some(PushMode::Faithful));
        assert_eq!(PushMode::parse("Corrected"), Some(PushMode::Corrected));
        assert_eq!(PushMode::parse("fixed"), None);
    }

    #[test]
    fn options_reach_the_cpu() {
        let mut options = RuntimeOptions::new(PushMode::Corrected);
        options.verbose = true;
        let mut machine = Machine::with_sink(options, Box::new(NullSink));
        assert_eq!(*machine.runtime_options(), options);

        // PUSHC R0, 0x1234; HALT
        machine.load(&[0x62, 0x00, 0x34, 0x12, 0x7F]).unwrap();
        machine.execute(100).unwrap();
        assert_eq!(machine.read_u16(0xFFFD), 0x1234);
    }

    #[test]
    fn external_reset_clears_halted() {
        let mut machine = machine();
        machine.load(&[0x7F]).unwrap();
        machine.execute(10).unwrap();
        assert!(machine.halted());

        machine.reset();
        assert!(!machine.halted());
        assert_eq!(machine.read_u8(0x0000), 0);
        assert_eq!(machine.cpu.registers.sp(), 0xFFFF);
    }

    #[test]
    fn load_rejects_oversized_image() {
        let mut machine = machine();
        let image = vec![0; MEM_SIZE + 1];
        assert_eq!(machine.load(&image), Err(CpuError::ImageTooLarge { len: MEM_SIZE + 1 }));
        assert!(machine.load(&vec![0xAA; MEM_SIZE]).is_ok());
        assert_eq!(machine.read_u8(0xFFFF), 0xAA);
    }

    #[test]
    fn step_reports_cycles_consumed() {
        let mut machine = machine();
        // LDC R0, 0x1234; HALT
        machine.load(&[0x31, 0x00, 0x34, 0x12, 0x7F]).unwrap();
        assert_eq!(machine.step(), Ok(4));
        assert_eq!(machine.step(), Ok(1));
        assert!(machine.halted());
        assert_eq!(machine.step(), Ok(0));
    }

    #[test]
    fn host_writes_cost_nothing() {
        let mut machine = machine();
        machine.write_u16(0x0000, 0x007F);
        assert_eq!(machine.read_u16(0x0000), 0x007F);
        assert_eq!(machine.execute(3), Ok(2));
    }
}
