//! Palette class-raster writer.
//!
//! Class rasters are single-band 8-bit GeoTIFFs cut into 256x256 LZW tiles,
//! carrying a colour map and the template grid's georeference.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use sits_common::{Crs, GeoTransform};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::info;

use crate::decompress::{compression, lzw_compress};
use crate::error::{RasterError, RasterResult};
use crate::geokeys::write_georeference;

/// Tile edge length of written class rasters.
pub const CLASS_TILE_SIZE: u32 = 256;

const PHOTOMETRIC_PALETTE: u16 = 3;

/// RGBA colour of one palette entry.
pub type Rgba = (u8, u8, u8, u8);

/// 256-entry colour table of a class raster.
///
/// Entries 0..=254 start transparent black, entry 255 opaque black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: [Rgba; 256],
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut entries = [(0, 0, 0, 0); 256];
        entries[255] = (0, 0, 0, 255);
        Self { entries }
    }
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: u8, colour: Rgba) {
        self.entries[index as usize] = colour;
    }

    pub fn get(&self, index: u8) -> Rgba {
        self.entries[index as usize]
    }

    /// TIFF `ColorMap` layout: all reds, then greens, then blues, 16 bits each.
    /// Alpha has no TIFF representation and is dropped.
    fn to_color_map(&self) -> Vec<u16> {
        let mut map = vec![0u16; 3 * 256];
        for (i, &(r, g, b, _)) in self.entries.iter().enumerate() {
            map[i] = u16::from(r) * 257;
            map[256 + i] = u16::from(g) * 257;
            map[512 + i] = u16::from(b) * 257;
        }
        map
    }
}

/// Grid a class raster is written on.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassGrid {
    pub width: u32,
    pub height: u32,
    pub geotransform: GeoTransform,
    pub crs: Crs,
}

/// Write `data` (row-major, `width * height` class indices) as a tiled
/// LZW palette GeoTIFF. An existing file at `path` is replaced.
pub fn write_class_raster(
    path: &Path,
    grid: &ClassGrid,
    data: &[u8],
    colors: &ColorTable,
) -> RasterResult<()> {
    let (width, height) = (grid.width, grid.height);
    if data.len() != width as usize * height as usize {
        return Err(RasterError::InvalidData(format!(
            "{} class values for a {}x{} grid",
            data.len(),
            width,
            height
        )));
    }
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidData("empty class grid".to_string()));
    }

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut dir = encoder.image_directory()?;

    let tile = CLASS_TILE_SIZE as usize;
    let tiles_across = width.div_ceil(CLASS_TILE_SIZE);
    let tiles_down = height.div_ceil(CLASS_TILE_SIZE);
    let mut offsets = Vec::with_capacity((tiles_across * tiles_down) as usize);
    let mut byte_counts = Vec::with_capacity(offsets.capacity());
    let mut buffer = vec![0u8; tile * tile];

    for tile_row in 0..tiles_down {
        for tile_col in 0..tiles_across {
            buffer.fill(0);
            let x0 = (tile_col * CLASS_TILE_SIZE) as usize;
            let y0 = (tile_row * CLASS_TILE_SIZE) as usize;
            let cols = tile.min(width as usize - x0);
            let rows = tile.min(height as usize - y0);
            for r in 0..rows {
                let src = (y0 + r) * width as usize + x0;
                buffer[r * tile..r * tile + cols].copy_from_slice(&data[src..src + cols]);
            }

            let packed = lzw_compress(&buffer)?;
            let offset = dir.write_data(&packed[..])?;
            offsets.push(u32::try_from(offset).map_err(|_| {
                RasterError::Unsupported("class raster larger than 4 GiB".to_string())
            })?);
            byte_counts.push(packed.len() as u32);
        }
    }

    dir.write_tag(Tag::ImageWidth, width)?;
    dir.write_tag(Tag::ImageLength, height)?;
    dir.write_tag(Tag::BitsPerSample, 8u16)?;
    dir.write_tag(Tag::Compression, compression::LZW)?;
    dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_PALETTE)?;
    dir.write_tag(Tag::SamplesPerPixel, 1u16)?;
    dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
    dir.write_tag(Tag::SampleFormat, 1u16)?;
    dir.write_tag(Tag::TileWidth, CLASS_TILE_SIZE)?;
    dir.write_tag(Tag::TileLength, CLASS_TILE_SIZE)?;
    dir.write_tag(Tag::TileOffsets, &offsets[..])?;
    dir.write_tag(Tag::TileByteCounts, &byte_counts[..])?;
    dir.write_tag(Tag::ColorMap, &colors.to_color_map()[..])?;
    write_georeference(&mut dir, &grid.geotransform, &grid.crs)?;
    dir.finish()?;

    info!(
        path = %path.display(),
        width = width,
        height = height,
        tiles = offsets.len(),
        "Wrote class raster"
    );
    Ok(())
}
