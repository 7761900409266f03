//! GeoTIFF dataset reader.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use sits_common::{BoundingBox, Crs, GeoTransform};
use tiff::decoder::{ChunkType, Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::decompress::{decompress_chunk, predictor, undo_horizontal_predictor_u8};
use crate::error::{RasterError, RasterResult};
use crate::geokeys;
use crate::sample::{sample_as_f64, SampleType};

/// `PhotometricInterpretation` of palette images.
const PHOTOMETRIC_PALETTE: u16 = 3;
/// `PlanarConfiguration` of band-sequential images.
const PLANAR_SEPARATE: u16 = 2;
/// Decoded chunks kept in memory at most.
const CACHE_BUDGET_BYTES: usize = 64 * 1024 * 1024;

/// Pixel window of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct ChunkLayout {
    chunk_type: ChunkType,
    chunk_width: u32,
    chunk_height: u32,
    chunks_across: u32,
    chunk_count: u32,
    planar: bool,
    /// Palette images are expanded here instead of by the tiff decoder.
    raw: Option<RawChunks>,
}

#[derive(Debug, Clone)]
struct RawChunks {
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
    compression: u16,
    predictor: u16,
}

struct DecodedChunk {
    cols: u32,
    rows: u32,
    data: DecodingResult,
}

/// Small FIFO cache so strip-organised files are not re-decoded for
/// every window that crosses the same strip.
struct ChunkCache {
    chunks: HashMap<u32, DecodedChunk>,
    order: VecDeque<u32>,
    capacity: usize,
}

impl ChunkCache {
    fn new(capacity: usize) -> Self {
        Self {
            chunks: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, index: u32, chunk: DecodedChunk) {
        while self.order.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.chunks.remove(&old);
            }
        }
        self.order.push_back(index);
        self.chunks.insert(index, chunk);
    }
}

/// An open GeoTIFF file.
pub struct RasterDataset {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    width: u32,
    height: u32,
    bands: usize,
    sample_type: SampleType,
    geotransform: Option<GeoTransform>,
    crs: Option<Crs>,
    nodata: Option<f64>,
    color_map: Option<Vec<[u8; 3]>>,
    layout: ChunkLayout,
    cache: ChunkCache,
}

impl std::fmt::Debug for RasterDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterDataset")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bands", &self.bands)
            .field("sample_type", &self.sample_type)
            .field("crs", &self.crs)
            .finish()
    }
}

impl RasterDataset {
    pub fn open(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |message: String| RasterError::Open {
            path: path.clone(),
            message,
        };

        let file = File::open(&path).map_err(|e| open_error(e.to_string()))?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| open_error(e.to_string()))?;

        let (width, height) = decoder.dimensions()?;
        let bands = decoder
            .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
            .unwrap_or(1) as usize;
        let bits = decoder
            .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
            .and_then(|v| v.first().copied())
            .unwrap_or(1);
        let sample_format = decoder
            .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
            .and_then(|v| v.first().copied())
            .unwrap_or(1);
        let sample_type = SampleType::from_tags(bits, sample_format)?;

        let photometric = decoder
            .find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)?
            .unwrap_or(1);
        let planar = decoder
            .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
            .unwrap_or(1)
            == PLANAR_SEPARATE;

        let chunk_type = decoder.get_chunk_type();
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let chunk_count = match chunk_type {
            ChunkType::Strip => decoder.strip_count()?,
            ChunkType::Tile => decoder.tile_count()?,
        };
        let chunks_across = match chunk_type {
            ChunkType::Strip => 1,
            ChunkType::Tile => width.div_ceil(chunk_width.max(1)),
        };

        let raw = if photometric == PHOTOMETRIC_PALETTE {
            if sample_type != SampleType::U8 || bands != 1 {
                return Err(RasterError::Unsupported(format!(
                    "palette image with {} bands of {}",
                    bands, sample_type
                )));
            }
            let (offsets_tag, counts_tag) = match chunk_type {
                ChunkType::Strip => (Tag::StripOffsets, Tag::StripByteCounts),
                ChunkType::Tile => (Tag::TileOffsets, Tag::TileByteCounts),
            };
            Some(RawChunks {
                offsets: decoder.get_tag_u64_vec(offsets_tag)?,
                byte_counts: decoder.get_tag_u64_vec(counts_tag)?,
                compression: decoder.find_tag_unsigned::<u16>(Tag::Compression)?.unwrap_or(1),
                predictor: decoder
                    .find_tag_unsigned::<u16>(Tag::Predictor)?
                    .unwrap_or(predictor::NONE),
            })
        } else {
            None
        };

        let color_map = match decoder.find_tag(Tag::ColorMap)? {
            Some(value) => {
                let values = value.into_u16_vec()?;
                let n = values.len() / 3;
                Some(
                    (0..n)
                        .map(|i| {
                            [
                                (values[i] >> 8) as u8,
                                (values[n + i] >> 8) as u8,
                                (values[2 * n + i] >> 8) as u8,
                            ]
                        })
                        .collect(),
                )
            }
            None => None,
        };

        let nodata = match decoder.find_tag(Tag::GdalNodata)? {
            Some(value) => value
                .into_string()
                .ok()
                .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok()),
            None => None,
        };

        let geotransform = geokeys::read_geotransform(&mut decoder)?;
        let crs = geokeys::read_crs(&mut decoder)?;

        let chunk_bytes = (chunk_width as usize * chunk_height as usize * bands)
            .saturating_mul(usize::from(sample_type.bits() / 8).max(1))
            .max(1);

        debug!(
            path = %path.display(),
            width = width,
            height = height,
            bands = bands,
            sample_type = %sample_type,
            chunk_width = chunk_width,
            chunk_height = chunk_height,
            palette = raw.is_some(),
            "Opened raster"
        );

        Ok(Self {
            path,
            decoder,
            width,
            height,
            bands,
            sample_type,
            geotransform,
            crs,
            nodata,
            color_map,
            layout: ChunkLayout {
                chunk_type,
                chunk_width,
                chunk_height,
                chunks_across,
                chunk_count,
                planar,
                raw,
            },
            cache: ChunkCache::new(CACHE_BUDGET_BYTES / chunk_bytes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (width, height) in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> usize {
        self.bands
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Palette entries as RGB, for palette images.
    pub fn color_map(&self) -> Option<&[[u8; 3]]> {
        self.color_map.as_deref()
    }

    pub fn geotransform(&self) -> RasterResult<GeoTransform> {
        self.geotransform.ok_or_else(|| {
            RasterError::MissingGeoreference(format!("{} has no geotransform", self.path.display()))
        })
    }

    pub fn crs(&self) -> RasterResult<&Crs> {
        self.crs.as_ref().ok_or_else(|| {
            RasterError::MissingGeoreference(format!(
                "{} has no reference system",
                self.path.display()
            ))
        })
    }

    /// EPSG code of the raster's reference system, if it has one.
    pub fn srid(&self) -> Option<u32> {
        self.crs.as_ref().and_then(Crs::epsg)
    }

    /// Extent in the raster's own reference system.
    pub fn bounding_box(&self) -> RasterResult<BoundingBox> {
        let corners = self.geotransform()?.corners(self.width, self.height);
        BoundingBox::from_points(corners)
            .ok_or_else(|| RasterError::InvalidData("empty raster extent".to_string()))
    }

    fn chunk_origin(&self, index: u32) -> (u32, u32) {
        let layout = &self.layout;
        match layout.chunk_type {
            ChunkType::Strip => (0, index * layout.chunk_height),
            ChunkType::Tile => (
                (index % layout.chunks_across) * layout.chunk_width,
                (index / layout.chunks_across) * layout.chunk_height,
            ),
        }
    }

    fn chunk_index(&self, chunk_col: u32, chunk_row: u32) -> u32 {
        match self.layout.chunk_type {
            ChunkType::Strip => chunk_row,
            ChunkType::Tile => chunk_row * self.layout.chunks_across + chunk_col,
        }
    }

    fn decode_chunk(&mut self, index: u32) -> RasterResult<DecodedChunk> {
        if index >= self.layout.chunk_count {
            return Err(RasterError::InvalidData(format!(
                "chunk {} of {} requested",
                index, self.layout.chunk_count
            )));
        }
        let (cols, rows) = self.decoder.chunk_data_dimensions(index);

        let raw = match &self.layout.raw {
            Some(raw) => raw.clone(),
            None => {
                let data = self.decoder.read_chunk(index)?;
                return Ok(DecodedChunk { cols, rows, data });
            }
        };

        let i = index as usize;
        let (offset, count) = match (raw.offsets.get(i), raw.byte_counts.get(i)) {
            (Some(&o), Some(&c)) => (o, c),
            _ => {
                return Err(RasterError::InvalidData(format!(
                    "missing offset for chunk {}",
                    index
                )))
            }
        };

        let mut packed = vec![0u8; count as usize];
        let reader = self.decoder.inner();
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut packed)?;

        let stored_width = match self.layout.chunk_type {
            ChunkType::Strip => self.width,
            ChunkType::Tile => self.layout.chunk_width,
        } as usize;
        let mut expanded = decompress_chunk(&packed, raw.compression, stored_width * rows as usize)?;
        if raw.predictor == predictor::HORIZONTAL {
            undo_horizontal_predictor_u8(&mut expanded, stored_width, 1);
        }

        let needed = (stored_width * rows as usize).saturating_sub(stored_width - cols as usize);
        if expanded.len() < needed {
            return Err(RasterError::InvalidData(format!(
                "chunk {} holds {} bytes, expected at least {}",
                index,
                expanded.len(),
                needed
            )));
        }

        let data = if stored_width == cols as usize {
            expanded.truncate(cols as usize * rows as usize);
            expanded
        } else {
            let mut cropped = Vec::with_capacity(cols as usize * rows as usize);
            for r in 0..rows as usize {
                let start = r * stored_width;
                cropped.extend_from_slice(&expanded[start..start + cols as usize]);
            }
            cropped
        };

        Ok(DecodedChunk {
            cols,
            rows,
            data: DecodingResult::U8(data),
        })
    }

    fn chunk(&mut self, index: u32) -> RasterResult<&DecodedChunk> {
        if !self.cache.chunks.contains_key(&index) {
            let decoded = self.decode_chunk(index)?;
            self.cache.insert(index, decoded);
        }
        self.cache
            .chunks
            .get(&index)
            .ok_or_else(|| RasterError::InvalidData(format!("chunk {} not cached", index)))
    }

    fn check_window(&self, window: &Window) -> RasterResult<()> {
        let fits_x = window.x.checked_add(window.width).is_some_and(|e| e <= self.width);
        let fits_y = window.y.checked_add(window.height).is_some_and(|e| e <= self.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(RasterError::WindowOutOfBounds {
                x: window.x,
                y: window.y,
                width: window.width,
                height: window.height,
                raster_width: self.width,
                raster_height: self.height,
            })
        }
    }

    /// Read one band of an 8-bit raster over a window, row-major.
    pub fn read_window_u8(&mut self, band: usize, window: Window) -> RasterResult<Vec<u8>> {
        if self.sample_type != SampleType::U8 {
            return Err(RasterError::Unsupported(format!(
                "8-bit read of a {} raster",
                self.sample_type
            )));
        }
        if band >= self.bands || (self.layout.planar && band > 0) {
            return Err(RasterError::Unsupported(format!(
                "band {} of a {}-band raster",
                band + 1,
                self.bands
            )));
        }
        self.check_window(&window)?;

        let mut out = vec![0u8; window.len()];
        if window.is_empty() {
            return Ok(out);
        }

        let bands = if self.layout.planar { 1 } else { self.bands };
        let (cw, ch) = (self.layout.chunk_width, self.layout.chunk_height);
        let first_col = window.x / cw;
        let last_col = (window.x + window.width - 1) / cw;
        let first_row = window.y / ch;
        let last_row = (window.y + window.height - 1) / ch;
        let (col_range, row_range) = match self.layout.chunk_type {
            ChunkType::Strip => (0..=0, first_row..=last_row),
            ChunkType::Tile => (first_col..=last_col, first_row..=last_row),
        };

        for chunk_row in row_range {
            for chunk_col in col_range.clone() {
                let index = self.chunk_index(chunk_col, chunk_row);
                let (origin_x, origin_y) = self.chunk_origin(index);
                let chunk = self.chunk(index)?;
                let samples = match &chunk.data {
                    DecodingResult::U8(v) => v,
                    _ => {
                        return Err(RasterError::InvalidData(
                            "decoded chunk is not 8-bit".to_string(),
                        ))
                    }
                };

                let x0 = window.x.max(origin_x);
                let x1 = (window.x + window.width).min(origin_x + chunk.cols);
                let y0 = window.y.max(origin_y);
                let y1 = (window.y + window.height).min(origin_y + chunk.rows);
                if x0 >= x1 || y0 >= y1 {
                    continue;
                }

                for y in y0..y1 {
                    let src_row = (y - origin_y) as usize * chunk.cols as usize;
                    let dst_row = (y - window.y) as usize * window.width as usize;
                    for x in x0..x1 {
                        let src = (src_row + (x - origin_x) as usize) * bands + band;
                        let dst = dst_row + (x - window.x) as usize;
                        out[dst] = samples.get(src).copied().ok_or_else(|| {
                            RasterError::InvalidData(format!("chunk {} is truncated", index))
                        })?;
                    }
                }
            }
        }

        Ok(out)
    }

    /// All band values of one pixel.
    pub fn read_pixel(&mut self, col: u32, row: u32) -> RasterResult<Vec<f64>> {
        self.check_window(&Window::new(col, row, 1, 1))?;
        if self.layout.planar && self.bands > 1 {
            return Err(RasterError::Unsupported(
                "pixel read of a band-sequential multi-band raster".to_string(),
            ));
        }

        let (chunk_col, chunk_row) = match self.layout.chunk_type {
            ChunkType::Strip => (0, row / self.layout.chunk_height),
            ChunkType::Tile => (col / self.layout.chunk_width, row / self.layout.chunk_height),
        };
        let index = self.chunk_index(chunk_col, chunk_row);
        let (origin_x, origin_y) = self.chunk_origin(index);
        let bands = self.bands;
        let chunk = self.chunk(index)?;

        let base = ((row - origin_y) as usize * chunk.cols as usize + (col - origin_x) as usize) * bands;
        (0..bands)
            .map(|b| {
                sample_as_f64(&chunk.data, base + b).ok_or_else(|| {
                    RasterError::InvalidData(format!("chunk {} is truncated", index))
                })
            })
            .collect()
    }
}
