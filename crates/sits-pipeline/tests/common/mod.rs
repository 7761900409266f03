//! Fake coverage service and algorithm for pipeline tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use raster_io::{write_class_raster, ClassGrid, ColorTable, RasterDataset, Window};
use sits_common::{Aoi, Selection, SitsError, SitsResult, Toi};
use sits_pipeline::{Algorithm, AlgorithmOutputs, AlgorithmParams, CoverageService, ProgressSink};
use tempfile::TempDir;
use test_utils::{temp_test_dir, write_class_geotiff, TestGrid};
use wcs_protocol::{CoverageDescription, GetCoverageRequest, Scale, Subset};

/// Upper-left corner of the fake master coverage, in UTM 33N.
pub const MASTER_ORIGIN: (f64, f64) = (600000.0, 5300000.0);
/// Full-resolution size and pixel size of the fake master coverage.
pub const MASTER_SIZE: u32 = 100;
pub const MASTER_PIXEL: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Describe(String),
    GetCoverage(String, GetCoverageRequest),
}

/// Service answering every coverage with a synthetic GeoTIFF.
///
/// Master requests (with a scale factor) get a `MASTER_SIZE` grid scaled by
/// the factor; requests with an explicit size get exactly that size over
/// the requested subset.
pub struct FakeCoverageService {
    srid: Option<u32>,
    scratch: TempDir,
    fail_on: Option<String>,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeCoverageService {
    pub fn new(srid: Option<u32>) -> Self {
        Self {
            srid,
            scratch: temp_test_dir(),
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn utm33() -> Self {
        Self::new(Some(32633))
    }

    /// Answer requests for `coverage_id` with an OWS exception.
    pub fn failing_on(mut self, coverage_id: &str) -> Self {
        self.fail_on = Some(coverage_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn coverage_requests(&self) -> Vec<(String, GetCoverageRequest)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetCoverage(id, request) => Some((id, request)),
                Call::Describe(_) => None,
            })
            .collect()
    }

    fn grid_for(&self, request: &GetCoverageRequest) -> TestGrid {
        let epsg = request.output_srid.unwrap_or(4326) as u16;
        if request.size.len() == 2 {
            let (x0, x1) = trim(request, "x");
            let (y0, y1) = trim(request, "y");
            let (w, h) = (request.size[0].1, request.size[1].1);
            return TestGrid::new(
                w,
                h,
                (x0, y1),
                ((x1 - x0) / w as f64, (y1 - y0) / h as f64),
                epsg,
            );
        }
        let factor = match request.scale {
            Some(Scale::Factor(f)) => f,
            _ => 1.0,
        };
        let size = (MASTER_SIZE as f64 * factor).round() as u32;
        let pixel = MASTER_PIXEL / factor;
        TestGrid::new(size, size, MASTER_ORIGIN, (pixel, pixel), epsg)
    }
}

fn trim(request: &GetCoverageRequest, axis_name: &str) -> (f64, f64) {
    request
        .subsets
        .iter()
        .find_map(|subset| match subset {
            Subset::Trim { axis, min, max } if axis == axis_name => Some((*min, *max)),
            _ => None,
        })
        .expect("request without trim subset")
}

impl CoverageService for FakeCoverageService {
    fn describe_coverage(&self, coverage_id: &str) -> SitsResult<CoverageDescription> {
        self.calls.borrow_mut().push(Call::Describe(coverage_id.to_string()));
        Ok(CoverageDescription {
            coverage_id: Some(coverage_id.to_string()),
            srid: self.srid,
            axis_labels: vec!["x".to_string(), "y".to_string()],
            uom_labels: vec!["m".to_string(), "m".to_string()],
            dimension: 2,
            envelope: vec![600000.0, 5290000.0, 610000.0, 5300000.0],
        })
    }

    fn get_coverage(
        &self,
        coverage_id: &str,
        params: &GetCoverageRequest,
    ) -> SitsResult<Box<dyn Read + '_>> {
        self.calls
            .borrow_mut()
            .push(Call::GetCoverage(coverage_id.to_string(), params.clone()));

        if self.fail_on.as_deref() == Some(coverage_id) {
            return Err(SitsError::Ows {
                code: "NoSuchCoverage".to_string(),
                locator: coverage_id.to_string(),
                text: format!("No such Coverage '{}'.", coverage_id),
            });
        }

        let grid = self.grid_for(params);
        let path = self.scratch.path().join(format!("{}.body", coverage_id));
        let data = vec![1u8; grid.width as usize * grid.height as usize];
        write_class_geotiff(&path, &grid, &data);
        Ok(Box::new(Cursor::new(std::fs::read(&path)?)))
    }
}

/// Selection over 10..11 E, 45..46 N in 2015.
pub fn selection() -> Selection {
    Selection {
        aoi: Aoi {
            left: 10.0,
            right: 11.0,
            bottom: 45.0,
            top: 46.0,
        },
        toi: Toi {
            start: "2015-01-01T00:00:00Z".parse().unwrap(),
            end: "2015-12-31T23:59:59Z".parse().unwrap(),
        },
    }
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Classifier putting the left half of the grid into class 1 and the
/// right half into class 0.
pub struct HalfSplitAlgorithm {
    pub output_dir: PathBuf,
    pub named: bool,
}

impl Algorithm for HalfSplitAlgorithm {
    fn name(&self) -> &str {
        "half-split"
    }

    fn run(
        &self,
        inputs: &[PathBuf],
        _params: &AlgorithmParams,
        progress: &mut dyn ProgressSink,
    ) -> SitsResult<AlgorithmOutputs> {
        let mut template = RasterDataset::open(&inputs[0])?;
        let (width, height) = template.size();
        template.read_window_u8(0, Window::new(0, 0, width, height))?;
        progress.update(50, "Clustering.");

        let data: Vec<u8> = (0..height)
            .flat_map(|_| (0..width).map(move |col| u8::from(col < width / 2)))
            .collect();
        let output = self.output_dir.join("classes.tif");
        write_class_raster(
            &output,
            &ClassGrid {
                width,
                height,
                geotransform: template.geotransform()?,
                crs: template.crs()?.clone(),
            },
            &data,
            &ColorTable::new(),
        )?;

        if self.named {
            let mut outputs = BTreeMap::new();
            outputs.insert("classes".to_string(), output);
            Ok(AlgorithmOutputs::Named(outputs))
        } else {
            Ok(AlgorithmOutputs::Single(output))
        }
    }
}

/// GeoJSON layer in UTM 33N with one rectangle per `(l, b, r, t, code)`.
pub fn utm_layer(name: &str, features: &[(f64, f64, f64, f64, &str)]) -> String {
    let header = format!(
        r#"{{"type":"FeatureCollection","name":"{}","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::32633"}}}},"#,
        name
    );
    test_utils::geojson::land_cover_rectangles(features).replacen(
        r#"{"type":"FeatureCollection","#,
        &header,
        1,
    )
}

pub fn read_all(path: &Path) -> Vec<u8> {
    let mut dataset = RasterDataset::open(path).unwrap();
    let (w, h) = dataset.size();
    dataset.read_window_u8(0, Window::new(0, 0, w, h)).unwrap()
}
