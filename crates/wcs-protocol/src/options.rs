//! GeoTIFF encoding options of the WCS GeoTIFF extension.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WcsError, WcsResult};

/// Compression schemes accepted by `geotiff:compression`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeoTiffCompression {
    #[default]
    None,
    PackBits,
    Deflate,
    #[serde(rename = "LZW")]
    Lzw,
    #[serde(rename = "JPEG")]
    Jpeg,
}

impl fmt::Display for GeoTiffCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeoTiffCompression::None => "None",
            GeoTiffCompression::PackBits => "PackBits",
            GeoTiffCompression::Deflate => "Deflate",
            GeoTiffCompression::Lzw => "LZW",
            GeoTiffCompression::Jpeg => "JPEG",
        })
    }
}

/// Validated GeoTIFF output options.
///
/// Tile sizes only exist for tiled output and must be positive multiples
/// of 16, as required by the TIFF specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoTiffOptions {
    compression: GeoTiffCompression,
    tiles: Option<(u32, u32)>,
}

impl GeoTiffOptions {
    /// Internally tiled output.
    pub fn tiled(compression: GeoTiffCompression, tile_width: u32, tile_height: u32) -> WcsResult<Self> {
        for (option, value) in [("geotiff:tilewidth", tile_width), ("geotiff:tileheight", tile_height)] {
            if value == 0 || value % 16 != 0 {
                return Err(WcsError::InvalidOption {
                    option: option.to_string(),
                    message: format!("{} is not a positive multiple of 16", value),
                });
            }
        }
        Ok(Self {
            compression,
            tiles: Some((tile_width, tile_height)),
        })
    }

    /// Strip-organised output.
    pub fn striped(compression: GeoTiffCompression) -> Self {
        Self {
            compression,
            tiles: None,
        }
    }

    /// The layout every SITS download uses: uncompressed 256x256 tiles.
    pub fn sits_default() -> Self {
        Self {
            compression: GeoTiffCompression::None,
            tiles: Some((256, 256)),
        }
    }

    pub fn compression(&self) -> GeoTiffCompression {
        self.compression
    }

    pub fn tile_size(&self) -> Option<(u32, u32)> {
        self.tiles
    }

    /// `geotiff:` KVP terms in a fixed order.
    pub fn to_kvp_terms(&self) -> Vec<String> {
        let mut terms = vec![
            format!("geotiff:compression={}", self.compression),
            format!("geotiff:tiling={}", self.tiles.is_some()),
        ];
        if let Some((width, height)) = self.tiles {
            terms.push(format!("geotiff:tilewidth={}", width));
            terms.push(format!("geotiff:tileheight={}", height));
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sits_default_terms() {
        assert_eq!(
            GeoTiffOptions::sits_default().to_kvp_terms(),
            vec![
                "geotiff:compression=None",
                "geotiff:tiling=true",
                "geotiff:tilewidth=256",
                "geotiff:tileheight=256",
            ]
        );
    }

    #[test]
    fn test_striped_omits_tile_size() {
        let terms = GeoTiffOptions::striped(GeoTiffCompression::Lzw).to_kvp_terms();
        assert_eq!(terms, vec!["geotiff:compression=LZW", "geotiff:tiling=false"]);
    }

    #[test]
    fn test_invalid_tile_sizes_rejected() {
        assert!(GeoTiffOptions::tiled(GeoTiffCompression::None, 0, 256).is_err());
        assert!(GeoTiffOptions::tiled(GeoTiffCompression::None, 256, 100).is_err());
        let ok = GeoTiffOptions::tiled(GeoTiffCompression::Deflate, 512, 128).unwrap();
        assert_eq!(ok.tile_size(), Some((512, 128)));
    }
}
