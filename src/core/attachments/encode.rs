//! Attachment encoders
//!
//! Two paths turn report bytes into base64 attachment content:
//!
//! - [`encode_chunked`] streams the object in fixed-size chunks and encodes
//!   each one independently. Concatenated chunk encodings equal the encoding
//!   of the whole object only when every chunk but the last holds a multiple
//!   of 3 bytes, so chunk sizes are validated by [`Base64ChunkSize`] and each
//!   chunk is filled completely before it is encoded.
//! - [`compress_and_encode`] deflates the whole object into a single-entry
//!   zip archive at maximum compression and encodes the archive.

use crate::domain::{Result, StorageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::{Cursor, Write};
use tokio::io::{AsyncRead, AsyncReadExt};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Deflate level used for oversized reports
pub const MAX_COMPRESSION_LEVEL: i32 = 9;

/// Chunk size for the streaming encoder, always a positive multiple of 3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base64ChunkSize(usize);

impl Base64ChunkSize {
    /// Largest multiple of 3 not above 1 MiB
    pub const DEFAULT: Base64ChunkSize = Base64ChunkSize(1_048_575);

    pub fn new(bytes: usize) -> std::result::Result<Self, String> {
        if bytes == 0 || bytes % 3 != 0 {
            return Err(format!(
                "chunk size must be a positive multiple of 3, got {bytes}"
            ));
        }
        Ok(Self(bytes))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for Base64ChunkSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Base64-encode a stream chunk by chunk
///
/// Peak memory is one chunk plus the growing encoded output.
pub async fn encode_chunked<R>(reader: &mut R, chunk_size: Base64ChunkSize) -> Result<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; chunk_size.get()];
    let mut encoded = String::new();

    loop {
        let filled = fill_chunk(reader, &mut buffer).await?;
        if filled == 0 {
            break;
        }
        STANDARD.encode_string(&buffer[..filled], &mut encoded);
        if filled < buffer.len() {
            break;
        }
    }

    Ok(encoded)
}

/// Read until `buffer` is full or the stream ends
async fn fill_chunk<R>(reader: &mut R, buffer: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader
            .read(&mut buffer[filled..])
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("stream read failed: {e}")))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Zip `data` as a single entry named `entry_name` and base64-encode the archive
pub fn compress_and_encode(entry_name: &str, data: &[u8]) -> Result<String> {
    let archive = zip_single_entry(entry_name, data)
        .map_err(|e| StorageError::Compression(format!("{entry_name}: {e}")))?;
    Ok(STANDARD.encode(archive))
}

fn zip_single_entry(entry_name: &str, data: &[u8]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(MAX_COMPRESSION_LEVEL))
        .unix_permissions(0o644);

    zip.start_file(entry_name, options)?;
    zip.write_all(data)?;
    Ok(zip.finish()?.into_inner())
}
