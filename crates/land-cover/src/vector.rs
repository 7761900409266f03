//! GeoJSON vector datasets.
//!
//! A dataset is either one GeoJSON file (a single layer) or a directory of
//! `*.geojson` / `*.json` files, one layer per file. Layer names come from
//! the top-level `name` member, falling back to the file stem; the layer
//! CRS from the legacy `crs` member, EPSG:4326 when absent.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use geo::{BoundingRect, Geometry};
use geojson::{GeoJson, JsonObject, JsonValue};
use sits_common::{BoundingBox, Crs, SitsError, SitsResult};
use tracing::{debug, warn};

/// A feature with string-rendered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub geometry: Option<Geometry<f64>>,
    pub attributes: HashMap<String, String>,
}

impl VectorFeature {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Bounding rectangle of the geometry, `None` for empty geometries.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let rect = self.geometry.as_ref()?.bounding_rect()?;
        Some(BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub name: String,
    pub crs: Crs,
    pub features: Vec<VectorFeature>,
}

impl VectorLayer {
    /// Features whose bounding rectangle intersects `bbox`.
    pub fn features_in<'a>(&'a self, bbox: &'a BoundingBox) -> impl Iterator<Item = &'a VectorFeature> + 'a {
        self.features
            .iter()
            .filter(move |f| f.bounds().is_some_and(|b| b.intersects(bbox)))
    }
}

#[derive(Debug, Clone)]
pub struct VectorDataset {
    path: PathBuf,
    layers: Vec<VectorLayer>,
}

impl VectorDataset {
    pub fn open(path: impl AsRef<Path>) -> SitsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let layers = if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && matches!(
                            p.extension().and_then(|e| e.to_str()),
                            Some("geojson") | Some("json")
                        )
                })
                .collect();
            files.sort();
            files.iter().map(|f| read_layer(f)).collect::<SitsResult<Vec<_>>>()?
        } else {
            vec![read_layer(&path)?]
        };

        debug!(
            path = %path.display(),
            layers = layers.len(),
            "Opened vector dataset"
        );
        Ok(Self { path, layers })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layers(&self) -> &[VectorLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> SitsResult<&VectorLayer> {
        self.layers.iter().find(|l| l.name == name).ok_or_else(|| {
            SitsError::LayerNotFound(format!(
                "Invalid layer name '{}' in {}",
                name,
                self.path.display()
            ))
        })
    }
}

fn read_layer(path: &Path) -> SitsResult<VectorLayer> {
    let text = fs::read_to_string(path)?;
    let document = GeoJson::from_str(&text)
        .map_err(|e| SitsError::Vector(format!("{}: {}", path.display(), e)))?;

    let (features, foreign) = match document {
        GeoJson::FeatureCollection(collection) => (collection.features, collection.foreign_members),
        GeoJson::Feature(feature) => (vec![feature], None),
        GeoJson::Geometry(geometry) => (
            vec![geojson::Feature {
                geometry: Some(geometry),
                ..Default::default()
            }],
            None,
        ),
    };

    let name = foreign
        .as_ref()
        .and_then(|m| m.get("name"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_default();
    let crs = match foreign.as_ref() {
        Some(members) => layer_crs(members)
            .map_err(|message| SitsError::Vector(format!("{}: {}", path.display(), message)))?,
        None => Crs::WGS84,
    };

    let features = features
        .into_iter()
        .map(|feature| {
            let geometry = match feature.geometry {
                Some(g) => match Geometry::<f64>::try_from(g) {
                    Ok(geometry) => Some(geometry),
                    Err(e) => {
                        warn!(layer = %name, error = %e, "Skipping unconvertible geometry");
                        None
                    }
                },
                None => None,
            };
            VectorFeature {
                geometry,
                attributes: feature.properties.as_ref().map(render_properties).unwrap_or_default(),
            }
        })
        .collect();

    Ok(VectorLayer { name, crs, features })
}

/// CRS from a legacy `{"type": "name", "properties": {"name": ...}}` member.
fn layer_crs(members: &JsonObject) -> Result<Crs, String> {
    let Some(crs) = members.get("crs") else {
        return Ok(Crs::WGS84);
    };
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "crs member without a name".to_string())?;
    Crs::from_user_string(name).map_err(|e| e.to_string())
}

fn render_properties(properties: &JsonObject) -> HashMap<String, String> {
    properties
        .iter()
        .filter_map(|(key, value)| render_value(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Attribute values compare as strings; integral numbers drop the fraction.
fn render_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}
