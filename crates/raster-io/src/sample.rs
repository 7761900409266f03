//! Pixel sample types.

use std::fmt;

use tiff::decoder::DecodingResult;

use crate::error::{RasterError, RasterResult};

/// TIFF `SampleFormat` values.
const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_IEEEFP: u16 = 3;

/// Storage type of one band sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
}

impl SampleType {
    /// Derive the type from the `BitsPerSample` and `SampleFormat` tags.
    pub fn from_tags(bits_per_sample: u16, sample_format: u16) -> RasterResult<Self> {
        let sample_type = match (sample_format, bits_per_sample) {
            (SAMPLE_FORMAT_UINT, 8) => SampleType::U8,
            (SAMPLE_FORMAT_UINT, 16) => SampleType::U16,
            (SAMPLE_FORMAT_UINT, 32) => SampleType::U32,
            (SAMPLE_FORMAT_UINT, 64) => SampleType::U64,
            (SAMPLE_FORMAT_INT, 8) => SampleType::I8,
            (SAMPLE_FORMAT_INT, 16) => SampleType::I16,
            (SAMPLE_FORMAT_INT, 32) => SampleType::I32,
            (SAMPLE_FORMAT_INT, 64) => SampleType::I64,
            (SAMPLE_FORMAT_IEEEFP, 16) => SampleType::F16,
            (SAMPLE_FORMAT_IEEEFP, 32) => SampleType::F32,
            (SAMPLE_FORMAT_IEEEFP, 64) => SampleType::F64,
            _ => {
                return Err(RasterError::Unsupported(format!(
                    "{} bits per sample with sample format {}",
                    bits_per_sample, sample_format
                )))
            }
        };
        Ok(sample_type)
    }

    pub fn bits(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::I8 => 8,
            SampleType::U16 | SampleType::I16 | SampleType::F16 => 16,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 32,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 64,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "Byte",
            SampleType::I8 => "Int8",
            SampleType::U16 => "UInt16",
            SampleType::I16 => "Int16",
            SampleType::U32 => "UInt32",
            SampleType::I32 => "Int32",
            SampleType::U64 => "UInt64",
            SampleType::I64 => "Int64",
            SampleType::F16 => "Float16",
            SampleType::F32 => "Float32",
            SampleType::F64 => "Float64",
        };
        f.write_str(name)
    }
}

/// Sample `index` of a decoded chunk as `f64`.
pub(crate) fn sample_as_f64(data: &DecodingResult, index: usize) -> Option<f64> {
    let value = match data {
        DecodingResult::U8(v) => f64::from(*v.get(index)?),
        DecodingResult::U16(v) => f64::from(*v.get(index)?),
        DecodingResult::U32(v) => f64::from(*v.get(index)?),
        DecodingResult::U64(v) => *v.get(index)? as f64,
        DecodingResult::F16(v) => v.get(index)?.to_f64(),
        DecodingResult::F32(v) => f64::from(*v.get(index)?),
        DecodingResult::F64(v) => *v.get(index)?,
        DecodingResult::I8(v) => f64::from(*v.get(index)?),
        DecodingResult::I16(v) => f64::from(*v.get(index)?),
        DecodingResult::I32(v) => f64::from(*v.get(index)?),
        DecodingResult::I64(v) => *v.get(index)? as f64,
    };
    Some(value)
}
