// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use m7::memory::MEM_SIZE;
use std::fs::File;
use std::io::{Error, ErrorKind, Read};
use std::path::Path;
use std::result::Result;

/// Reads a flat program image at a given path and stores it in a vector of
/// bytes. Images have no header, so the only check possible is that the file
/// fits in the address space.
pub fn read_bin<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut file = File::open(path)?;
    file.read_to_end(&mut buffer)?;

    if buffer.len() > MEM_SIZE {
        return Err(Error::new(ErrorKind::InvalidData,
                              format!("image is {} bytes, memory holds {}", buffer.len(), MEM_SIZE)));
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn temp_path(name: &str) -> ::std::path::PathBuf {
        env::temp_dir().join(format!("m7-rs-{}-{}", name, ::std::process::id()))
    }

    #[test]
    fn reads_whole_file() {
        let path = temp_path("image");
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(&[0x10, 0x00, 0x7F]).unwrap();
        }
        let image = read_bin(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(image, vec![0x10, 0x00, 0x7F]);
    }

    #[test]
    fn rejects_oversized_image() {
        let path = temp_path("oversized");
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(&vec![0; MEM_SIZE + 1]).unwrap();
        }
        let result = read_bin(&path);
        fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_bin(temp_path("does-not-exist")).is_err());
    }
}
