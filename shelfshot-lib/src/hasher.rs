use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

pub use shelfshot_core::util::sha256_hex;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// SHA-256 of a reader's full contents, lowercase hex.
pub fn sha256_reader(reader: &mut dyn Read) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of a file, streamed in 64 KB chunks.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    sha256_reader(&mut file)
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
