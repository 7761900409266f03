//! GeoTIFF georeferencing tags.
//!
//! Reads ModelPixelScale + ModelTiepoint or ModelTransformation into a
//! [`GeoTransform`] and the GeoKeyDirectory into a [`Crs`]; writes the
//! same tags back for class rasters.

use std::io::{Read, Seek, Write};

use sits_common::{Crs, GeoTransform};
use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffKind};
use tiff::tags::Tag;

use crate::error::RasterResult;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// One GeoKeyDirectory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GeoKey {
    id: u16,
    location: u16,
    count: u16,
    value: u16,
}

fn parse_key_directory(directory: &[u16]) -> Vec<GeoKey> {
    if directory.len() < 4 {
        return Vec::new();
    }
    let n_keys = directory[3] as usize;
    directory[4..]
        .chunks_exact(4)
        .take(n_keys)
        .map(|k| GeoKey {
            id: k[0],
            location: k[1],
            count: k[2],
            value: k[3],
        })
        .collect()
}

fn read_geo_keys<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Vec<GeoKey>> {
    match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => Ok(parse_key_directory(&value.into_u16_vec()?)),
        None => Ok(Vec::new()),
    }
}

fn is_pixel_is_point(keys: &[GeoKey]) -> bool {
    keys.iter()
        .any(|k| k.id == GT_RASTER_TYPE_GEO_KEY && k.location == 0 && k.value == RASTER_PIXEL_IS_POINT)
}

/// Geotransform from the model tags, `None` when the raster has none.
///
/// The returned origin is always the outer corner of the first pixel: a
/// PixelIsPoint raster has its origin moved back by half a pixel.
pub fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<GeoTransform>> {
    let Some(mut geotransform) = read_model_transform(decoder)? else {
        return Ok(None);
    };
    if is_pixel_is_point(&read_geo_keys(decoder)?) {
        geotransform.origin_x -= 0.5 * (geotransform.pixel_width + geotransform.row_rotation);
        geotransform.origin_y -= 0.5 * (geotransform.col_rotation + geotransform.pixel_height);
    }
    Ok(Some(geotransform))
}

fn read_model_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<GeoTransform>> {
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        let scale = scale.into_f64_vec()?;
        let tiepoint = tiepoint.into_f64_vec()?;
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Ok(Some(GeoTransform::north_up(origin_x, origin_y, scale[0], -scale[1])));
        }
    }

    if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let t = matrix.into_f64_vec()?;
        if t.len() >= 16 {
            // row-major 4x4; the first two rows carry the affine part
            return Ok(Some(GeoTransform::from_gdal([t[3], t[0], t[1], t[7], t[4], t[5]])));
        }
    }

    Ok(None)
}

/// Reference system from the GeoKeyDirectory.
///
/// EPSG codes come from the projected or geographic type keys; a
/// user-defined system is recognised when its citation holds a PROJ string.
pub fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<Crs>> {
    let keys = read_geo_keys(decoder)?;
    if keys.is_empty() {
        return Ok(None);
    }

    for wanted in [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY] {
        if let Some(key) = keys.iter().find(|k| k.id == wanted && k.location == 0) {
            if key.value > 0 && key.value != USER_DEFINED {
                return Ok(Some(Crs::Epsg(u32::from(key.value))));
            }
        }
    }

    let citation = keys
        .iter()
        .find(|k| k.id == GT_CITATION_GEO_KEY && k.location == Tag::GeoAsciiParamsTag.to_u16());
    if let Some(key) = citation {
        if let Some(ascii) = decoder.find_tag(Tag::GeoAsciiParamsTag)? {
            let ascii = ascii.into_string()?;
            let start = key.value as usize;
            let end = (start + key.count as usize).min(ascii.len());
            let text = ascii.get(start..end).unwrap_or_default().trim_end_matches('|').trim();
            if text.starts_with("+proj") {
                return Ok(Some(Crs::Proj(text.to_string())));
            }
        }
    }

    Ok(None)
}

/// Write the model tags and GeoKeys for a grid.
pub fn write_georeference<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    geotransform: &GeoTransform,
    crs: &Crs,
) -> RasterResult<()> {
    if geotransform.is_north_up() {
        let scale = [geotransform.pixel_width, -geotransform.pixel_height, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, geotransform.origin_x, geotransform.origin_y, 0.0];
        dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
        dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    } else {
        let g = geotransform;
        let matrix = [
            g.pixel_width, g.row_rotation, 0.0, g.origin_x,
            g.col_rotation, g.pixel_height, 0.0, g.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::ModelTransformationTag, &matrix[..])?;
    }

    let model_type = if crs.is_geographic() {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };
    let mut keys = vec![
        GeoKey { id: GT_MODEL_TYPE_GEO_KEY, location: 0, count: 1, value: model_type },
        GeoKey { id: GT_RASTER_TYPE_GEO_KEY, location: 0, count: 1, value: RASTER_PIXEL_IS_AREA },
    ];
    let mut ascii = None;

    match crs {
        Crs::Epsg(code) if *code <= u32::from(u16::MAX) && *code as u16 != USER_DEFINED => {
            let id = if crs.is_geographic() {
                GEOGRAPHIC_TYPE_GEO_KEY
            } else {
                PROJECTED_CS_TYPE_GEO_KEY
            };
            keys.push(GeoKey { id, location: 0, count: 1, value: *code as u16 });
        }
        other => {
            let text = match other {
                Crs::Proj(text) => text.clone(),
                Crs::Epsg(code) => format!("EPSG:{}", code),
            };
            let citation = format!("{}|", text);
            keys.insert(
                2,
                GeoKey {
                    id: GT_CITATION_GEO_KEY,
                    location: Tag::GeoAsciiParamsTag.to_u16(),
                    count: citation.len() as u16,
                    value: 0,
                },
            );
            ascii = Some(citation);
        }
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    for key in &keys {
        directory.extend_from_slice(&[key.id, key.location, key.count, key.value]);
    }
    dir.write_tag(Tag::GeoKeyDirectoryTag, &directory[..])?;
    if let Some(ascii) = ascii {
        dir.write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_directory() {
        let dir = [1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32633, 9999, 0, 1, 1];
        let keys = parse_key_directory(&dir);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].id, PROJECTED_CS_TYPE_GEO_KEY);
        assert_eq!(keys[1].value, 32633);
    }

    #[test]
    fn test_pixel_is_point_key() {
        let point = parse_key_directory(&[1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 2]);
        let area = parse_key_directory(&[1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1]);
        assert!(is_pixel_is_point(&point));
        assert!(!is_pixel_is_point(&area));
        assert!(!is_pixel_is_point(&[]));
    }

    #[test]
    fn test_parse_truncated_directory() {
        assert!(parse_key_directory(&[1, 1]).is_empty());
        assert_eq!(parse_key_directory(&[1, 1, 0, 3, 1024, 0, 1, 2]).len(), 1);
    }
}
