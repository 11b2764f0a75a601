// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Local};
use m7::machine::RuntimeOptions;
use std::fmt;

/// Logs a message to stdout with a given prefix if the emulator was started
/// with the verbose flag set.
pub fn log<P, T>(prefix: P, text: T, runtime_options: &RuntimeOptions) where P: Into<String>, T: Into<String> {
    if runtime_options.verbose {
        println!("{}", format_line(prefix, text));
    }
}

/// Logs a message to stderr with a given prefix regardless of verbosity.
pub fn warn<P, T>(prefix: P, text: T) where P: Into<String>, T: Into<String> {
    eprintln!("{}", format_line(prefix, text));
}

fn format_line<P, T>(prefix: P, text: T) -> String where P: Into<String>, T: Into<String> {
    let local: DateTime<Local> = Local::now();
    format!("[{}] -- [{}] {}", local, prefix.into(), text.into())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Informational messages the CPU reports to its host while executing.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A RESET instruction was executed.
    Reset,
    /// A HALT instruction was executed.
    Halt,
    /// An undefined opcode was fetched. A fatal fault follows.
    IllegalInstruction { pc: u16, opcode: u8 },
    /// The last instruction of a run drew more cycles than were left.
    CycleOverrun { overdrawn: i64 },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match *self {
            Diagnostic::Reset | Diagnostic::Halt => Severity::Info,
            Diagnostic::IllegalInstruction { .. } => Severity::Error,
            Diagnostic::CycleOverrun { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Diagnostic::Reset =>
                write!(f, "RESET instruction executed"),
            Diagnostic::Halt =>
                write!(f, "HALT instruction executed, the CPU will now stop"),
            Diagnostic::IllegalInstruction { pc, opcode } =>
                write!(f, "illegal instruction {:#04X} at {:#06X}", opcode, pc),
            Diagnostic::CycleOverrun { overdrawn } =>
                write!(f, "CPU used {} additional cycle(s)", overdrawn),
        }
    }
}

/// Receiver for diagnostics emitted by the CPU. Hosts pick where messages go.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Writes diagnostics to the console. Informational messages respect the
/// verbose flag, warnings and errors are always shown.
pub struct ConsoleSink {
    runtime_options: RuntimeOptions,
}

impl ConsoleSink {
    pub fn new(runtime_options: RuntimeOptions) -> ConsoleSink {
        ConsoleSink {
            runtime_options: runtime_options,
        }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => log("info", diagnostic.to_string(), &self.runtime_options),
            Severity::Warning => warn("warning", diagnostic.to_string()),
            Severity::Error => warn("error", diagnostic.to_string()),
        }
    }
}

/// Discards everything.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        assert_eq!(Diagnostic::Halt.severity(), Severity::Info);
        assert_eq!(Diagnostic::Reset.severity(), Severity::Info);
        assert_eq!(Diagnostic::CycleOverrun { overdrawn: 2 }.severity(), Severity::Warning);
        assert_eq!(Diagnostic::IllegalInstruction { pc: 0, opcode: 0x50 }.severity(), Severity::Error);
    }

    #[test]
    fn vec_sink_captures_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::Reset);
        sink.emit(Diagnostic::Halt);
        assert_eq!(sink, vec![Diagnostic::Reset, Diagnostic::Halt]);
    }

    #[test]
    fn overrun_message_counts_cycles() {
        let text = Diagnostic::CycleOverrun { overdrawn: 3 }.to_string();
        assert_eq!(text, "CPU used 3 additional cycle(s)");
    }
}
