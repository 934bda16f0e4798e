use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use zstd::bulk::Compressor;
use zstd::stream::raw::{Decoder, InBuffer, Operation, OutBuffer};

use crate::error::{InfbkError, Result};

/// zstd's own default level.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Maximum decompressed output size (256 MiB).
/// Bounds memory use when an authenticated archive still carries a
/// decompression bomb.
pub const DEFAULT_MAX_DECOMPRESSED: u64 = 256 * 1024 * 1024;

/// Decoded output is drained in slices of this size.
const DECODE_CHUNK: usize = 128 * 1024;

/// zstd codec for archive bodies.
///
/// The compression and decompression contexts are created on first use and
/// reused by every later call. Build one at startup and share it as
/// `Arc<Codec>`; concurrent backups and restores take turns on each context.
pub struct Codec {
    level: i32,
    max_decompressed: u64,
    compressor: Mutex<Option<Compressor<'static>>>,
    decoder: Mutex<Option<Decoder<'static>>>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("level", &self.level)
            .field("max_decompressed", &self.max_decompressed)
            .finish_non_exhaustive()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::with_settings(DEFAULT_ZSTD_LEVEL, DEFAULT_MAX_DECOMPRESSED)
    }
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    // Contexts are reset at the start of each call.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Codec {
    pub fn new(level: i32, max_decompressed: u64) -> Result<Self> {
        let range = zstd::compression_level_range();
        if !range.contains(&level) {
            return Err(InfbkError::Config(format!(
                "zstd level must be in [{}, {}], got {level}",
                range.start(),
                range.end()
            )));
        }
        if max_decompressed == 0 {
            return Err(InfbkError::Config(
                "decompression limit must be greater than zero".into(),
            ));
        }
        Ok(Self::with_settings(level, max_decompressed))
    }

    fn with_settings(level: i32, max_decompressed: u64) -> Self {
        Self {
            level,
            max_decompressed,
            compressor: Mutex::new(None),
            decoder: Mutex::new(None),
        }
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut slot = lock(&self.compressor);
        let mut cx = match slot.take() {
            Some(cx) => cx,
            None => Compressor::new(self.level)
                .map_err(|e| InfbkError::Other(format!("zstd init: {e}")))?,
        };
        let result = cx
            .compress(data)
            .map_err(|e| InfbkError::Other(format!("zstd compress: {e}")));
        *slot = Some(cx);
        result
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(InfbkError::Decompression("empty data".into()));
        }
        let mut slot = lock(&self.decoder);
        let mut decoder = match slot.take() {
            Some(decoder) => decoder,
            None => Decoder::new()
                .map_err(|e| InfbkError::Decompression(format!("zstd init: {e}")))?,
        };
        let result = self.decode_bounded(&mut decoder, data);
        *slot = Some(decoder);
        result
    }

    fn decode_bounded(&self, decoder: &mut Decoder<'static>, data: &[u8]) -> Result<Vec<u8>> {
        decoder
            .reinit()
            .map_err(|e| InfbkError::Decompression(format!("zstd reset: {e}")))?;

        let hinted_capacity = data
            .len()
            .saturating_mul(4)
            .min(self.max_decompressed as usize);
        let mut output = Vec::with_capacity(hinted_capacity);
        let mut chunk = vec![0u8; DECODE_CHUNK];
        let mut input = InBuffer::around(data);

        loop {
            let (frame_remaining, written) = {
                let mut out = OutBuffer::around(chunk.as_mut_slice());
                let hint = decoder
                    .run(&mut input, &mut out)
                    .map_err(|e| InfbkError::Decompression(format!("zstd: {e}")))?;
                (hint, out.pos())
            };
            output.extend_from_slice(&chunk[..written]);
            if output.len() as u64 > self.max_decompressed {
                return Err(InfbkError::Decompression(format!(
                    "decompressed size exceeds limit of {} bytes",
                    self.max_decompressed
                )));
            }

            let consumed = input.pos() == data.len();
            if consumed && frame_remaining == 0 {
                return Ok(output);
            }
            if consumed && written == 0 {
                return Err(InfbkError::Decompression("zstd: truncated frame".into()));
            }
        }
    }
}
