// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

extern crate getopts;
extern crate m7_rs;

use getopts::Options;
use m7_rs::debugger::debugger::Debugger;
use m7_rs::io::binutils;
use m7_rs::io::errors::*;
use m7_rs::io::log;
use m7_rs::m7::machine::{Machine, PushMode, RuntimeOptions};
use std::env;

const DEFAULT_BUDGET: i64 = 1_000_000;

/// Prints usage information for the emulator's command-line.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] IMAGE", program);
    print!("{}", opts.usage(&brief));
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| String::from("m7-rs"));

    let mut opts = Options::new();
    opts.optopt("p", "push-mode", "what PUSHM/PUSHC push: faithful or corrected", "MODE");
    opts.optopt("c", "cycles", "cycle budget for the run (default 1000000)", "N");
    opts.optflag("d", "debug", "start the interactive monitor");
    opts.optflag("v", "verbose", "display timestamped logs and an instruction trace");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("m7-rs: {}", e);
            return EXIT_INVALID_OPTIONS;
        },
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return EXIT_SUCCESS;
    }

    // There is no default push mode.
    let push_mode = match matches.opt_str("p") {
        Some(mode) => match PushMode::parse(&mode) {
            Some(push_mode) => push_mode,
            None => {
                eprintln!("m7-rs: unknown push mode `{}`, expected faithful or corrected", mode);
                return EXIT_INVALID_OPTIONS;
            },
        },
        None => {
            eprintln!("m7-rs: --push-mode is required (faithful or corrected)");
            return EXIT_INVALID_OPTIONS;
        },
    };

    let budget = match matches.opt_str("c") {
        Some(cycles) => match cycles.parse::<i64>() {
            Ok(budget) if budget > 0 => budget,
            _ => {
                eprintln!("m7-rs: invalid cycle budget `{}`", cycles);
                return EXIT_INVALID_OPTIONS;
            },
        },
        None => DEFAULT_BUDGET,
    };

    let image_path = match matches.free.first() {
        Some(path) => path.clone(),
        None => {
            print_usage(&program, &opts);
            return EXIT_INVALID_OPTIONS;
        },
    };

    let mut runtime_options = RuntimeOptions::new(push_mode);
    runtime_options.verbose = matches.opt_present("v");

    let image = match binutils::read_bin(&image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("m7-rs: {}: {}", image_path, e);
            return EXIT_INVALID_IMAGE;
        },
    };

    let mut machine = Machine::new(runtime_options);
    machine.reset();
    if let Err(e) = machine.load(&image) {
        eprintln!("m7-rs: {}", e);
        return e.exit_code();
    }
    log::log("main", format!("Loaded {} bytes from {}", image.len(), image_path), &runtime_options);

    if matches.opt_present("d") {
        let mut debugger = match Debugger::new(budget) {
            Ok(debugger) => debugger,
            Err(e) => {
                eprintln!("m7-rs: unable to start monitor: {}", e);
                return EXIT_DEBUGGER_FAILURE;
            },
        };
        return match debugger.run(&mut machine) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("m7-rs: {}", e);
                EXIT_DEBUGGER_FAILURE
            },
        };
    }

    match machine.execute(budget) {
        Ok(remaining) => {
            println!("Used {} of {} cycles, remaining {}", budget - remaining, budget, remaining);
            println!("{}", machine.cpu);
            EXIT_SUCCESS
        },
        Err(e) => {
            log::warn("error", format!("FATAL: {}", e));
            eprintln!("{}", machine.cpu);
            e.exit_code()
        },
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}
