//! Point transforms between two reference systems.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::debug;

use sits_common::Crs;

use crate::epsg;

/// Errors raised while resolving or applying a CRS transform.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Unknown EPSG code: {0}")]
    UnknownEpsg(u32),

    #[error("Invalid projection definition '{definition}': {message}")]
    InvalidDefinition { definition: String, message: String },

    #[error("Transform from {src} to {dst} failed: {message}")]
    TransformFailed {
        src: String,
        dst: String,
        message: String,
    },
}

impl From<ProjectionError> for sits_common::SitsError {
    fn from(err: ProjectionError) -> Self {
        sits_common::SitsError::Projection(err.to_string())
    }
}

/// Resolve a [`Crs`] into a proj4rs projection object.
pub fn resolve(crs: &Crs) -> Result<Proj, ProjectionError> {
    let definition = match crs {
        Crs::Epsg(code) => epsg::proj_string(*code)
            .ok_or(ProjectionError::UnknownEpsg(*code))?
            .to_string(),
        Crs::Proj(text) => text.clone(),
    };
    Proj::from_proj_string(&definition).map_err(|e| ProjectionError::InvalidDefinition {
        definition: definition.clone(),
        message: e.to_string(),
    })
}

/// A resolved transform from one CRS to another.
///
/// Geographic coordinates are degrees in (longitude, latitude) order on both
/// sides; the conversion to the radians proj4rs works in happens inside.
pub struct CrsTransform {
    src_crs: Crs,
    dst_crs: Crs,
    projs: Option<(Proj, Proj)>,
}

impl CrsTransform {
    /// Create a transform between two systems. Identical systems yield an
    /// identity transform that never touches proj4rs.
    pub fn new(src: &Crs, dst: &Crs) -> Result<Self, ProjectionError> {
        let projs = if src == dst {
            None
        } else {
            Some((resolve(src)?, resolve(dst)?))
        };
        debug!(src = %src, dst = %dst, identity = projs.is_none(), "Resolved CRS transform");
        Ok(Self {
            src_crs: src.clone(),
            dst_crs: dst.clone(),
            projs,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    pub fn source(&self) -> &Crs {
        &self.src_crs
    }

    pub fn target(&self) -> &Crs {
        &self.dst_crs
    }

    /// Transform a single point.
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let Some((src, dst)) = &self.projs else {
            return Ok((x, y));
        };

        let mut point = if src.is_latlong() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(src, dst, &mut point).map_err(|e| ProjectionError::TransformFailed {
            src: self.src_crs.to_string(),
            dst: self.dst_crs.to_string(),
            message: e.to_string(),
        })?;

        if dst.is_latlong() {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }

    /// Transform a sequence of points in place.
    pub fn transform_points(&self, points: &mut [(f64, f64)]) -> Result<(), ProjectionError> {
        if self.is_identity() {
            return Ok(());
        }
        for point in points.iter_mut() {
            *point = self.transform_point(point.0, point.1)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CrsTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransform")
            .field("src", &self.src_crs)
            .field("dst", &self.dst_crs)
            .field("identity", &self.is_identity())
            .finish()
    }
}
