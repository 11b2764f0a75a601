// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use debugger::parser;
use io::log;
use m7::machine::Machine;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &'static str = "(m7) ";
const DEFAULT_DUMP_LEN: usize = 64;

const HELP: &'static str = "\
step [n]         (s) execute n instructions, ignoring the budget
run [budget]     (r) execute until the budget is spent or the CPU halts
regs             (x) print registers and flags
dump ADDR [LEN]  (d) hexdump memory
poke ADDR BYTE.. (p) write bytes to memory
reset                external reset, memory is cleared
quit             (q) leave the monitor
help             (h) print this text";

#[derive(Debug, PartialEq)]
enum Command {
    Step,
    Run,
    Regs,
    Dump,
    Poke,
    Reset,
    Quit,
    Help,
}

#[derive(Debug, PartialEq)]
struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// What the monitor loop should do after a command ran.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive monitor. Reads commands with line editing and history and
/// applies them to a machine until the user quits or input ends.
pub struct Debugger {
    editor: DefaultEditor,

    // Budget used by `run` when none is given.
    budget: i64,
}

impl Debugger {
    pub fn new(budget: i64) -> Result<Debugger, ReadlineError> {
        Ok(Debugger {
            editor: DefaultEditor::new()?,
            budget: budget,
        })
    }

    /// Runs the monitor loop. Ctrl-C discards the current line, Ctrl-D quits.
    pub fn run(&mut self, machine: &mut Machine) -> Result<(), ReadlineError> {
        log::log("debugger", "Monitor started, type `help` for commands", machine.runtime_options());

        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e),
            };

            if line.trim().is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(line.as_str());

            match Debugger::interpret(&line) {
                Ok(command) => {
                    if self.execute_command(command, machine) == Flow::Exit {
                        return Ok(());
                    }
                },
                Err(e) => eprintln!("m7-rs: {}", e),
            }
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums.
    fn interpret(input: &str) -> Result<CommandWithArguments, String> {
        let mut args = parser::parse_raw_input(input).map_err(String::from)?;
        if args.is_empty() {
            return Err(String::from("no command specified"));
        }
        let raw_command = args.remove(0);

        // Map command strings to the command enum type.
        let command = match raw_command.to_lowercase().as_str() {
            "step"  | "s" => Command::Step,
            "run"   | "r" => Command::Run,
            "regs"  | "x" => Command::Regs,
            "dump"  | "d" => Command::Dump,
            "poke"  | "p" => Command::Poke,
            "reset"       => Command::Reset,
            "quit"  | "q" => Command::Quit,
            "help"  | "h" => Command::Help,
            _ => return Err(format!("unknown command `{}`", raw_command)),
        };

        Ok(CommandWithArguments {
            command: command,
            args: args,
        })
    }

    /// Executes the correct debugger command based on the enum passed.
    fn execute_command(&mut self, command: CommandWithArguments, machine: &mut Machine) -> Flow {
        let result = match command.command {
            Command::Step => self.execute_step(machine, &command.args),
            Command::Run => self.execute_run(machine, &command.args),
            Command::Regs => {
                println!("{}", machine.cpu);
                Ok(())
            },
            Command::Dump => self.execute_dump(machine, &command.args),
            Command::Poke => self.execute_poke(machine, &command.args),
            Command::Reset => {
                machine.reset();
                log::log("debugger", "Machine reset", machine.runtime_options());
                Ok(())
            },
            Command::Quit => return Flow::Exit,
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            },
        };

        if let Err(e) = result {
            eprintln!("m7-rs: {}", e);
        }
        Flow::Continue
    }

    /// Executes instructions one at a time. Stops early on a fault or halt.
    fn execute_step(&mut self, machine: &mut Machine, args: &[String]) -> Result<(), String> {
        let count = match args.first() {
            Some(arg) => parse_arg(arg)?,
            None => 1,
        };

        let mut cycles = 0;
        for _ in 0..count {
            if machine.halted() {
                break;
            }
            cycles += machine.step().map_err(|e| e.to_string())?;
        }

        println!("pc={:#06X} cycles={} halted={}", machine.cpu.registers.pc(), cycles, machine.halted());
        Ok(())
    }

    fn execute_run(&mut self, machine: &mut Machine, args: &[String]) -> Result<(), String> {
        let budget = match args.first() {
            Some(arg) => parse_arg(arg)? as i64,
            None => self.budget,
        };

        let remaining = machine.execute(budget).map_err(|e| e.to_string())?;
        println!("pc={:#06X} remaining={} halted={}", machine.cpu.registers.pc(), remaining, machine.halted());
        Ok(())
    }

    /// Allows dumping memory or program code at a specified memory address.
    fn execute_dump(&mut self, machine: &mut Machine, args: &[String]) -> Result<(), String> {
        let addr = match args.first() {
            Some(arg) => parse_addr(arg)?,
            None => return Err(String::from("dump needs an address")),
        };
        let len = match args.get(1) {
            Some(arg) => parse_arg(arg)? as usize,
            None => DEFAULT_DUMP_LEN,
        };

        print!("{}", machine.memory.hexdump(addr, len));
        Ok(())
    }

    fn execute_poke(&mut self, machine: &mut Machine, args: &[String]) -> Result<(), String> {
        if args.len() < 2 {
            return Err(String::from("poke needs an address and at least one byte"));
        }
        let addr = parse_addr(&args[0])?;

        let mut bytes = Vec::with_capacity(args.len() - 1);
        for arg in &args[1..] {
            let byte = parse_arg(arg)?;
            if byte > 0xFF {
                return Err(format!("`{}` does not fit in a byte", arg));
            }
            bytes.push(byte as u8);
        }

        machine.memory.memdump(addr, &bytes);
        Ok(())
    }
}

fn parse_arg(arg: &str) -> Result<u32, String> {
    parser::parse_number(arg).map_err(|e| format!("bad number `{}`: {}", arg, e))
}

fn parse_addr(arg: &str) -> Result<u16, String> {
    let value = parse_arg(arg)?;
    if value > 0xFFFF {
        return Err(format!("address `{}` is out of range", arg));
    }
    Ok(value as u16)
}
