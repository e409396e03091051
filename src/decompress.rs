use std::io::{self, Read};

use flate2::read::MultiGzDecoder;

use crate::error::RuntimeError;

/// Decompress a gzip payload, including archives made of several members.
///
/// The whole payload is decoded or nothing is returned.
pub fn gunzip(payload: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    if payload.is_empty() {
        return Err(RuntimeError::Decompression(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "empty gzip payload",
        )));
    }

    let mut decoder = MultiGzDecoder::new(payload);
    let mut content = Vec::new();
    decoder
        .read_to_end(&mut content)
        .map_err(RuntimeError::Decompression)?;

    Ok(content)
}
