//! Raw chunk decompression.
//!
//! Used for chunks the tiff decoder refuses to expand itself (palette
//! images) and by the class-raster writer for LZW encoding.

use std::io::Read;

use crate::error::{RasterError, RasterResult};

/// TIFF compression codes.
pub mod compression {
    pub const NONE: u16 = 1;
    pub const LZW: u16 = 5;
    pub const DEFLATE: u16 = 8;
    pub const ADOBE_DEFLATE: u16 = 32946;
}

/// TIFF predictor codes.
pub mod predictor {
    pub const NONE: u16 = 1;
    pub const HORIZONTAL: u16 = 2;
}

/// Decompress one chunk.
pub fn decompress_chunk(data: &[u8], compression_code: u16, expected_size: usize) -> RasterResult<Vec<u8>> {
    match compression_code {
        compression::NONE => Ok(data.to_vec()),
        compression::DEFLATE | compression::ADOBE_DEFLATE => {
            // zlib stream first, raw deflate as fallback
            let mut out = Vec::with_capacity(expected_size);
            let mut decoder = flate2::read::ZlibDecoder::new(data);
            match decoder.read_to_end(&mut out) {
                Ok(_) => Ok(out),
                Err(_) => {
                    out.clear();
                    flate2::read::DeflateDecoder::new(data)
                        .read_to_end(&mut out)
                        .map_err(|e| RasterError::Decompress {
                            method: "DEFLATE",
                            message: e.to_string(),
                        })?;
                    Ok(out)
                }
            }
        }
        compression::LZW => weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .decode(data)
            .map_err(|e| RasterError::Decompress {
                method: "LZW",
                message: e.to_string(),
            }),
        other => Err(RasterError::Unsupported(format!(
            "compression method {}",
            other
        ))),
    }
}

/// LZW-encode one chunk the way TIFF expects it.
pub fn lzw_compress(data: &[u8]) -> RasterResult<Vec<u8>> {
    weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
        .encode(data)
        .map_err(|e| RasterError::Decompress {
            method: "LZW",
            message: e.to_string(),
        })
}

/// Undo horizontal differencing of 8-bit samples in place.
pub fn undo_horizontal_predictor_u8(data: &mut [u8], row_len: usize, samples_per_pixel: usize) {
    if row_len == 0 {
        return;
    }
    for row in data.chunks_mut(row_len) {
        for i in samples_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
        }
    }
}
