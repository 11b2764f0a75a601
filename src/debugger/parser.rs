// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::num::ParseIntError;

enum ParseState {
    ScanningForArguments,
    ScanningArgument,
    ScanningQuotedArgument,
}

/// Returns true if the character passed is a whitespace character. Both spaces
/// and tabs are considered whitespace characters.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if the character passed is a quote.
fn is_quote(c: char) -> bool {
    c == '"'
}

/// Parses raw monitor input into a list of separate arguments. Arguments
/// are separated by whitespace, can be quoted, and can have escaped characters
/// inside of them.
pub fn parse_raw_input(input: &str) -> Result<Vec<String>, &'static str> {
    let mut state = ParseState::ScanningForArguments;
    let mut args: Vec<String> = Vec::new();
    let mut arg = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match state {
            ParseState::ScanningForArguments => {
                if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if c == '\\' {
                    arg.push(chars.next().ok_or("dangling escape")?);
                    state = ParseState::ScanningArgument;
                } else if !is_whitespace(c) {
                    arg.push(c);
                    state = ParseState::ScanningArgument;
                }
            },
            ParseState::ScanningArgument => {
                if is_whitespace(c) {
                    args.push(arg.split_off(0));
                    state = ParseState::ScanningForArguments;
                } else if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if c == '\\' {
                    arg.push(chars.next().ok_or("dangling escape")?);
                } else {
                    arg.push(c);
                }
            },
            ParseState::ScanningQuotedArgument => {
                if is_quote(c) {
                    state = ParseState::ScanningArgument;
                } else if c == '\\' {
                    arg.push(chars.next().ok_or("dangling escape")?);
                } else {
                    arg.push(c);
                }
            },
        }
    }

    match state {
        ParseState::ScanningQuotedArgument => Err("quoted arg does not close"),
        ParseState::ScanningArgument => {
            args.push(arg);
            Ok(args)
        },
        ParseState::ScanningForArguments => Ok(args),
    }
}

/// Parses a number given to a monitor command. Hex is accepted with a `0x` or
/// `$` prefix, anything else is decimal.
pub fn parse_number(arg: &str) -> Result<u32, ParseIntError> {
    if arg.starts_with("0x") || arg.starts_with("0X") {
        u32::from_str_radix(&arg[2..], 16)
    } else if arg.starts_with('$') {
        u32::from_str_radix(&arg[1..], 16)
    } else {
        arg.parse::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(parse_raw_input("dump  0x100\t16").unwrap(),
                   vec!["dump", "0x100", "16"]);
    }

    #[test]
    fn blank_input_has_no_arguments() {
        assert!(parse_raw_input("").unwrap().is_empty());
        assert!(parse_raw_input("   ").unwrap().is_empty());
    }

    #[test]
    fn quoted_arguments_keep_whitespace() {
        assert_eq!(parse_raw_input("load \"my image.bin\" now").unwrap(),
                   vec!["load", "my image.bin", "now"]);
        assert_eq!(parse_raw_input("\"\"").unwrap(), vec![""]);
    }

    #[test]
    fn escapes_are_literal() {
        assert_eq!(parse_raw_input(r#"a\ b "c\"d""#).unwrap(), vec!["a b", "c\"d"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(parse_raw_input("dump \"0x100").is_err());
        assert!(parse_raw_input("dump \\").is_err());
    }

    #[test]
    fn number_formats() {
        assert_eq!(parse_number("0x1F"), Ok(0x1F));
        assert_eq!(parse_number("$FF"), Ok(0xFF));
        assert_eq!(parse_number("42"), Ok(42));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("-1").is_err());
    }
}
