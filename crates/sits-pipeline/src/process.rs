//! End-to-end SITS processes.
//!
//! Each process works inside one workspace directory, reports progress
//! through its [`ProcessContext`] and returns the local paths it produced.
//! Publishing those files is up to the caller.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use class_stats::{write_class_statistics, ConfusionMatrix};
use land_cover::{rasterize_shapes, ClassTable, RasterizeSummary};
use serde::{Deserialize, Serialize};
use sits_common::{Selection, SitsError, SitsResult};
use tracing::{info, instrument};

use crate::algorithm::{Algorithm, AlgorithmOutputs, AlgorithmParams, ProgressSink};
use crate::download::{download_coverages, DownloadOptions};
use crate::service::CoverageService;

/// Directory, relative to the workspace, the SITS is downloaded into.
pub const SITS_DIR: &str = "sits";

const LINE_END: &str = "\r\n";

/// Workspace, identity and progress reporting of one process run.
pub struct ProcessContext<'a> {
    workspace: PathBuf,
    identifier: String,
    progress: &'a mut dyn ProgressSink,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        workspace: impl Into<PathBuf>,
        identifier: impl Into<String>,
        progress: &'a mut dyn ProgressSink,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            identifier: identifier.into(),
            progress,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// `<workspace>/<identifier><suffix>`
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.workspace.join(format!("{}{}", self.identifier, suffix))
    }

    pub fn sits_dir(&self) -> PathBuf {
        self.workspace.join(SITS_DIR)
    }

    pub fn update_progress(&mut self, percent: u8, message: &str) {
        info!(process = %self.identifier, percent = percent, "{}", message);
        self.progress.update(percent, message);
    }

    fn progress_sink(&mut self) -> &mut dyn ProgressSink {
        &mut *self.progress
    }
}

/// A reference land-cover vector dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverDataset {
    /// Human readable name
    pub title: String,
    /// Short name used in output file names
    pub identifier: String,
    /// GeoJSON file or directory of GeoJSON files
    pub path: PathBuf,
    pub layer: String,
    /// Name of the class table
    #[serde(default = "default_class_table")]
    pub classes: String,
    /// Feature attribute holding the class code
    #[serde(default = "default_attrib")]
    pub attrib: String,
}

fn default_class_table() -> String {
    "clc2012".to_string()
}

fn default_attrib() -> String {
    land_cover::CLC2012_ATTRIBUTE.to_string()
}

impl LandCoverDataset {
    pub fn class_table(&self) -> SitsResult<ClassTable> {
        ClassTable::by_name(&self.classes).ok_or_else(|| {
            SitsError::UnresolvedReference(format!("unknown class table '{}'", self.classes))
        })
    }

    fn rasterize(&self, template: &Path, output: &Path, classes: &ClassTable) -> SitsResult<RasterizeSummary> {
        rasterize_shapes(template, output, &self.path, &self.layer, classes, &self.attrib)
    }
}

/// Files written by [`export_sits`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutputs {
    pub images: Vec<PathBuf>,
    pub manifest: PathBuf,
}

/// Download the SITS and write a manifest listing every image.
///
/// `publish` maps each downloaded image to its `(file name, URL)` pair.
#[instrument(skip_all, fields(process = %ctx.identifier(), count = coverages.len()))]
pub fn export_sits<S, P>(
    ctx: &mut ProcessContext<'_>,
    service: &S,
    coverages: &[String],
    selection: &Selection,
    options: &DownloadOptions,
    mut publish: P,
) -> SitsResult<ExportOutputs>
where
    S: CoverageService + ?Sized,
    P: FnMut(&Path) -> SitsResult<(String, String)>,
{
    ctx.update_progress(0, "Publishing the data subsets.");
    let images = download_coverages(
        service,
        coverages,
        selection,
        &ctx.sits_dir(),
        options,
        |_, _, _| {},
    )?;

    let manifest = ctx.output_path("_index.tsv");
    let mut out = BufWriter::new(File::create(&manifest)?);
    write!(out, "coverageIdentifier\tlocalFilename\tdownloadURL{}", LINE_END)?;
    for (coverage, image) in coverages.iter().zip(&images) {
        let (filename, url) = publish(image)?;
        write!(out, "{}\t{}\t{}{}", coverage, filename, url, LINE_END)?;
    }
    out.flush()?;

    info!(manifest = %manifest.display(), images = images.len(), "Exported SITS");
    Ok(ExportOutputs { images, manifest })
}

/// Rasterize `dataset` onto the grid of the first coverage of the SITS.
///
/// Returns `<workspace>/<process>_<dataset>.tif`.
#[instrument(skip_all, fields(process = %ctx.identifier(), dataset = %dataset.identifier))]
pub fn rasterize_land_cover<S>(
    ctx: &mut ProcessContext<'_>,
    service: &S,
    coverages: &[String],
    selection: &Selection,
    options: &DownloadOptions,
    dataset: &LandCoverDataset,
) -> SitsResult<PathBuf>
where
    S: CoverageService + ?Sized,
{
    let classes = dataset.class_table()?;
    let template = &coverages[..coverages.len().min(1)];

    ctx.update_progress(0, "Retrieving the template raster.");
    let images = download_coverages(service, template, selection, &ctx.sits_dir(), options, |_, _, _| {})?;
    let template = images.first().ok_or(SitsError::EmptySits)?;

    ctx.update_progress(20, "Vector dataset rasterization.");
    let output = ctx.output_path(&format!("_{}.tif", dataset.identifier));
    dataset.rasterize(template, &output, &classes)?;
    Ok(output)
}

/// Files written by [`classify_and_validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutputs {
    pub images: Vec<PathBuf>,
    pub algorithm: AlgorithmOutputs,
    pub land_cover: PathBuf,
    pub statistics: PathBuf,
    pub matrix: ConfusionMatrix,
}

/// Run `algorithm` over the aligned SITS and compare its class raster with
/// the rasterized reference land cover.
#[instrument(skip_all, fields(
    process = %ctx.identifier(),
    algorithm = algorithm.name(),
    dataset = %dataset.identifier,
))]
#[allow(clippy::too_many_arguments)]
pub fn classify_and_validate<S, A>(
    ctx: &mut ProcessContext<'_>,
    service: &S,
    coverages: &[String],
    selection: &Selection,
    options: &DownloadOptions,
    algorithm: &A,
    params: &AlgorithmParams,
    dataset: &LandCoverDataset,
) -> SitsResult<ClassificationOutputs>
where
    S: CoverageService + ?Sized,
    A: Algorithm + ?Sized,
{
    let classes = dataset.class_table()?;

    ctx.update_progress(0, "Preparing the inputs data subsets.");
    let total = coverages.len();
    let sits_dir = ctx.sits_dir();
    let images = download_coverages(service, coverages, selection, &sits_dir, options, |idx, coverage, _| {
        let percent = (5 * (idx + 1) / (total + 1)) as u8;
        ctx.update_progress(percent, &format!("Downloaded {} ({} of {}).", coverage, idx + 1, total));
    })?;

    ctx.update_progress(5, "Executing the algorithm.");
    let outputs = algorithm.run(&images, params, ctx.progress_sink())?;
    let class_image = outputs.classes()?.to_path_buf();

    ctx.update_progress(95, "Rasterizing the reference land cover.");
    let land_cover = ctx.output_path(&format!("_{}.tif", dataset.identifier));
    dataset.rasterize(&images[0], &land_cover, &classes)?;

    ctx.update_progress(98, "Calculating statistics.");
    let statistics = ctx.output_path(&format!("_{}_statistics.tsv", dataset.identifier));
    let matrix = write_class_statistics(
        &statistics,
        &class_image,
        &land_cover,
        params.n_classes as usize,
        &classes,
    )?;

    Ok(ClassificationOutputs {
        images,
        algorithm: outputs,
        land_cover,
        statistics,
        matrix,
    })
}
