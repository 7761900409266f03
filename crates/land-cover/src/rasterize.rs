//! Burning land-cover polygons onto a template raster grid.

use std::path::Path;

use geo::{Coord, Geometry, MapCoords, Polygon};
use projection::{CrsTransform, ProjectionError};
use raster_io::{write_class_raster, ClassGrid, RasterDataset};
use sits_common::{BoundingBox, SitsError, SitsResult};
use tracing::{debug, info, instrument};

use crate::classes::ClassTable;
use crate::vector::VectorDataset;

/// Extra margin around the template extent when selecting features.
const SELECTION_EXPANSION: f64 = 0.2;

/// Counts reported by [`rasterize_shapes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterizeSummary {
    /// Features intersecting the template extent
    pub selected: usize,
    /// Features with a matching class, burned in order
    pub burned: usize,
}

/// Rasterize the features of `layer_name` in `source` onto the grid of
/// `template`, writing a palette class raster to `output`.
///
/// Each feature is looked up by its `attrib` value in `classes`; features
/// without a matching class are dropped. Later features overwrite earlier
/// ones.
#[instrument(skip(classes), fields(classes = classes.name()))]
pub fn rasterize_shapes(
    template: &Path,
    output: &Path,
    source: &Path,
    layer_name: &str,
    classes: &ClassTable,
    attrib: &str,
) -> SitsResult<RasterizeSummary> {
    let dataset = VectorDataset::open(source)?;
    let layer = dataset.layer(layer_name)?;

    let template = RasterDataset::open(template)?;
    let (width, height) = template.size();
    let geotransform = template.geotransform()?;
    let raster_crs = template.crs()?.clone();

    let to_layer = CrsTransform::new(&raster_crs, &layer.crs)?;
    let mut corners = geotransform.corners(width, height);
    to_layer.transform_points(&mut corners)?;
    let selection = BoundingBox::from_points(corners)
        .ok_or_else(|| SitsError::Raster("template has no extent".to_string()))?
        .expand(SELECTION_EXPANSION);

    let lookup = classes.lookup(attrib);
    let mut summary = RasterizeSummary::default();
    let shapes: Vec<(&Geometry<f64>, u8)> = layer
        .features_in(&selection)
        .inspect(|_| summary.selected += 1)
        .filter_map(|feature| {
            let class = lookup.get(feature.attribute(attrib)?)?;
            Some((feature.geometry.as_ref()?, class.index))
        })
        .collect();
    summary.burned = shapes.len();

    debug!(
        layer = %layer.name,
        layer_crs = %layer.crs,
        raster_crs = %raster_crs,
        selected = summary.selected,
        matched = summary.burned,
        "Selected features for rasterization"
    );

    let to_raster = CrsTransform::new(&layer.crs, &raster_crs)?;
    let to_pixel = geotransform.inverse()?;
    let project = |c: Coord<f64>| -> Result<Coord<f64>, ProjectionError> {
        let (x, y) = to_raster.transform_point(c.x, c.y)?;
        let (col, row) = to_pixel.apply(x, y);
        Ok(Coord { x: col, y: row })
    };

    let mut grid = ClassRaster::new(width, height);
    for (geometry, index) in shapes {
        let pixels = geometry.try_map_coords(project)?;
        grid.burn_geometry(&pixels, index);
    }

    write_class_raster(
        output,
        &ClassGrid {
            width,
            height,
            geotransform,
            crs: raster_crs,
        },
        &grid.data,
        &classes.color_table(),
    )?;

    info!(
        output = %output.display(),
        burned = summary.burned,
        "Rasterized land cover"
    );
    Ok(summary)
}

/// In-memory single-band class raster being burned.
struct ClassRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ClassRaster {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// `geometry` is in pixel coordinates.
    fn burn_geometry(&mut self, geometry: &Geometry<f64>, value: u8) {
        match geometry {
            Geometry::Polygon(polygon) => self.burn_polygon(polygon, value),
            Geometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    self.burn_polygon(polygon, value);
                }
            }
            Geometry::Rect(rect) => self.burn_polygon(&rect.to_polygon(), value),
            Geometry::Triangle(triangle) => self.burn_polygon(&triangle.to_polygon(), value),
            Geometry::GeometryCollection(collection) => {
                for member in collection {
                    self.burn_geometry(member, value);
                }
            }
            other => debug!(kind = geometry_kind(other), "Skipping non-areal geometry"),
        }
    }

    /// Fill pixels whose centres lie inside the polygon, even-odd over the
    /// exterior and all interior rings.
    fn burn_polygon(&mut self, polygon: &Polygon<f64>, value: u8) {
        let edges: Vec<(Coord<f64>, Coord<f64>)> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.lines().map(|l| (l.start, l.end)))
            .collect();
        if edges.is_empty() {
            return;
        }

        let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a.y).min(b.y), hi.max(a.y).max(b.y))
        });
        let first_row = (min_y - 0.5).ceil().max(0.0);
        let end_row = (max_y - 0.5).ceil().min(f64::from(self.height));
        if first_row >= end_row {
            return;
        }

        let mut crossings = Vec::new();
        for row in first_row as u32..end_row as u32 {
            let yc = f64::from(row) + 0.5;
            crossings.clear();
            for (a, b) in &edges {
                if (a.y > yc) != (b.y > yc) {
                    crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(|p, q| p.total_cmp(q));

            let row_offset = row as usize * self.width as usize;
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0);
                let end = (span[1] - 0.5).ceil().min(f64::from(self.width));
                if start < end {
                    self.data[row_offset + start as usize..row_offset + end as usize].fill(value);
                }
            }
        }
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}
