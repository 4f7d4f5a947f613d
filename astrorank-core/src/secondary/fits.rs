///! Primary-HDU FITS decoding
///!
///! Header: 80-character keyword records up to `END`, padded to a 2880-byte
///! block. Data: big-endian samples, NAXIS1 varying fastest, scaled by
///! `BZERO + BSCALE * raw`.
use ndarray::Array3;
use std::collections::HashMap;

use crate::error::{AstroError, Result};

const BLOCK_SIZE: usize = 2880;
const RECORD_SIZE: usize = 80;

/// Numeric header keywords of the primary HDU
#[derive(Debug, Clone, Default)]
pub struct FitsHeader {
    values: HashMap<String, f64>,
}

impl FitsHeader {
    pub fn get(&self, keyword: &str) -> Option<f64> {
        self.values.get(keyword).copied()
    }

    fn get_int(&self, keyword: &str) -> Result<i64> {
        self.get(keyword)
            .map(|v| v as i64)
            .ok_or_else(|| AstroError::Format(format!("missing {} keyword", keyword)))
    }
}

/// Decode the primary HDU into a `(layers, height, width)` raster.
///
/// Two-dimensional images become a single layer. Any other dimensionality is
/// a `Format` error.
pub fn parse_fits(bytes: &[u8]) -> Result<Array3<f32>> {
    let (header, data_offset) = read_header(bytes)?;

    let bitpix = header.get_int("BITPIX")?;
    let naxis = header.get_int("NAXIS")?;
    let (layers, height, width) = match naxis {
        2 => (1, axis(&header, 2)?, axis(&header, 1)?),
        3 => (axis(&header, 3)?, axis(&header, 2)?, axis(&header, 1)?),
        n => {
            return Err(AstroError::Format(format!(
                "expected a 2-D or 3-D image, got NAXIS = {}",
                n
            )))
        }
    };

    let sample_size = match bitpix {
        8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => return Err(AstroError::Format(format!("unsupported BITPIX {}", other))),
    };

    let oversized = || AstroError::Format(format!("image {}x{}x{} is too large", layers, height, width));
    let count = layers
        .checked_mul(height)
        .and_then(|n| n.checked_mul(width))
        .ok_or_else(oversized)?;
    if count == 0 {
        return Err(AstroError::Format("image has an empty axis".to_string()));
    }
    let data_len = count.checked_mul(sample_size).ok_or_else(oversized)?;
    let data_end = data_offset.checked_add(data_len).ok_or_else(oversized)?;
    let data = bytes
        .get(data_offset..data_end)
        .ok_or_else(|| {
            AstroError::Format(format!(
                "truncated data: need {} bytes after header, have {}",
                data_len,
                bytes.len().saturating_sub(data_offset)
            ))
        })?;

    let bscale = header.get("BSCALE").unwrap_or(1.0);
    let bzero = header.get("BZERO").unwrap_or(0.0);

    let raw: Vec<f64> = match bitpix {
        8 => data.iter().map(|&b| b as f64).collect(),
        16 => data
            .chunks_exact(2)
            .map(|c| i16::from_be_bytes([c[0], c[1]]) as f64)
            .collect(),
        32 => data
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64)
            .collect(),
        64 => data
            .chunks_exact(8)
            .map(|c| i64::from_be_bytes(be8(c)) as f64)
            .collect(),
        -32 => data
            .chunks_exact(4)
            .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64)
            .collect(),
        _ => data
            .chunks_exact(8)
            .map(|c| f64::from_be_bytes(be8(c)))
            .collect(),
    };

    let pixels: Vec<f32> = raw
        .into_iter()
        .map(|v| (bzero + bscale * v) as f32)
        .collect();

    Array3::from_shape_vec((layers, height, width), pixels)
        .map_err(|e| AstroError::Format(format!("raster shape: {}", e)))
}

fn be8(c: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(c);
    buf
}

fn axis(header: &FitsHeader, n: usize) -> Result<usize> {
    let len = header.get_int(&format!("NAXIS{}", n))?;
    usize::try_from(len)
        .map_err(|_| AstroError::Format(format!("negative NAXIS{} = {}", n, len)))
}

/// Parse header records; returns the header and the offset of the data unit
fn read_header(bytes: &[u8]) -> Result<(FitsHeader, usize)> {
    let mut header = FitsHeader::default();

    if !bytes.starts_with(b"SIMPLE") {
        return Err(AstroError::Format("not a FITS file (no SIMPLE card)".to_string()));
    }

    for (index, record) in bytes.chunks(RECORD_SIZE).enumerate() {
        if record.len() < RECORD_SIZE {
            break;
        }
        let keyword = String::from_utf8_lossy(&record[..8]);
        let keyword = keyword.trim();

        if keyword == "END" {
            let header_len = (index + 1) * RECORD_SIZE;
            let data_offset = header_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
            return Ok((header, data_offset));
        }

        if keyword.is_empty() || &record[8..10] != b"= " {
            continue;
        }

        let value = String::from_utf8_lossy(&record[10..]);
        let value = value.split('/').next().unwrap_or_default().trim();
        if let Ok(v) = value.replace(['D', 'd'], "E").parse::<f64>() {
            header.values.insert(keyword.to_string(), v);
        }
    }

    Err(AstroError::Format("header has no END card".to_string()))
}
