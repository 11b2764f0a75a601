// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use num::traits::{CheckedDiv, One, WrappingAdd, WrappingMul, WrappingSub};

const SIGN_BITMASK: u16 = 0b1000_0000_0000_0000;

/// The four arithmetic families of the instruction set. Every family comes in
/// a register, constant and memory flavour which all end up here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Checks if an unsigned word would be negative if it was signed. This is
/// done by checking if the 15th bit is set.
#[inline(always)]
pub fn is_negative(arg: u16) -> bool {
    arg & SIGN_BITMASK == SIGN_BITMASK
}

/// Applies an arithmetic operation to two operands of the same width. Overflow
/// wraps silently at the width of `T`. Returns None only when dividing by
/// zero.
#[inline(always)]
pub fn apply<T>(op: AluOp, lhs: T, rhs: T) -> Option<T>
    where T: WrappingAdd + WrappingSub + WrappingMul + CheckedDiv {
    match op {
        AluOp::Add => Some(lhs.wrapping_add(&rhs)),
        AluOp::Sub => Some(lhs.wrapping_sub(&rhs)),
        AluOp::Mul => Some(lhs.wrapping_mul(&rhs)),
        AluOp::Div => lhs.checked_div(&rhs),
    }
}

/// Adds one to a value, wrapping at the width of `T`.
#[inline(always)]
pub fn increment<T: WrappingAdd + One>(value: T) -> T {
    value.wrapping_add(&T::one())
}

/// Subtracts one from a value, wrapping at the width of `T`.
#[inline(always)]
pub fn decrement<T: WrappingSub + One>(value: T) -> T {
    value.wrapping_sub(&T::one())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_bit_is_bit_fifteen() {
        assert!(is_negative(0x8000));
        assert!(is_negative(0xFFFF));
        assert!(!is_negative(0x7FFF));
        assert!(!is_negative(0x0080));
    }

    #[test]
    fn word_arithmetic_wraps() {
        assert_eq!(apply(AluOp::Add, 0xFFFFu16, 2), Some(1));
        assert_eq!(apply(AluOp::Sub, 0u16, 1), Some(0xFFFF));
        assert_eq!(apply(AluOp::Mul, 0x100u16, 0x100), Some(0));
        assert_eq!(apply(AluOp::Div, 7u16, 2), Some(3));
    }

    #[test]
    fn byte_arithmetic_wraps_at_eight_bits() {
        assert_eq!(apply(AluOp::Add, 0xFFu8, 1), Some(0));
        assert_eq!(increment(0xFFu8), 0);
        assert_eq!(decrement(0u8), 0xFF);
        assert_eq!(increment(0xFFu16), 0x100);
    }

    #[test]
    fn division_by_zero_yields_none() {
        assert_eq!(apply(AluOp::Div, 1u16, 0), None);
        assert_eq!(apply(AluOp::Div, 0u8, 0), None);
    }
}
