// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt::Write;

/// Number of addressable bytes. Every 16-bit address maps to a cell, so the
/// word at 0xFFFE is fully backed and no access can fall outside the block.
pub const MEM_SIZE: usize = 0x10000;

/// Flat byte-addressable memory shared by program code, data and the stack.
/// Program images are placed at address 0 and the stack grows downwards from
/// the top of the address space.
///
/// Memory itself never charges cycles. Cycle accounting is the job of the CPU,
/// which wraps every access it performs on behalf of an instruction.
pub struct Memory {
    // Boxed so a machine can live on small stacks.
    data: Box<[u8]>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            data: vec![0; MEM_SIZE].into_boxed_slice(),
        }
    }

    /// Reads an unsigned 8-bit byte value located at the given address.
    #[inline(always)]
    pub fn read_u8(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    /// Writes an unsigned 8-bit byte value to the given address.
    #[inline(always)]
    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.data[addr as usize] = val;
    }

    /// Reads an unsigned 16-bit value at the given address (little-endian).
    /// The high byte is read from the next address, wrapping from 0xFFFF to
    /// 0x0000.
    #[inline(always)]
    pub fn read_u16(&self, addr: u16) -> u16 {
        let bytes = [self.read_u8(addr), self.read_u8(addr.wrapping_add(1))];
        LittleEndian::read_u16(&bytes)
    }

    /// Writes an unsigned 16-bit value to the given address (little-endian).
    #[inline(always)]
    pub fn write_u16(&mut self, addr: u16, val: u16) {
        let mut bytes = [0; 2];
        LittleEndian::write_u16(&mut bytes, val);
        self.write_u8(addr, bytes[0]);
        self.write_u8(addr.wrapping_add(1), bytes[1]);
    }

    /// Sets every cell to zero.
    pub fn clear(&mut self) {
        for cell in self.data.iter_mut() {
            *cell = 0;
        }
    }

    /// Dumps the contents of a slice starting at a given address. Bytes that
    /// run past 0xFFFF wrap around to the bottom of memory.
    pub fn memdump(&mut self, addr: u16, buf: &[u8]) {
        for (i, byte) in buf.iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u16), *byte);
        }
    }

    /// Formats `len` bytes starting at `addr` as rows of 16 hex bytes followed
    /// by their printable ASCII characters.
    pub fn hexdump(&self, addr: u16, len: usize) -> String {
        let mut result = String::new();
        let mut offset = 0;

        while offset < len {
            let row_addr = addr.wrapping_add(offset as u16);
            let row_len = (len - offset).min(16);
            let mut hex = String::new();
            let mut ascii = String::new();

            for i in 0..row_len {
                let byte = self.read_u8(row_addr.wrapping_add(i as u16));
                let _ = write!(hex, "{:02X} ", byte);
                ascii.push(match byte {
                    0x20..=0x7E => byte as char,
                    _ => '.',
                });
            }

            let _ = writeln!(result, "{:04X}  {:48} {}", row_addr, hex, ascii);
            offset += row_len;
        }

        result
    }
}
