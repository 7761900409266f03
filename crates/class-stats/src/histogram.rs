//! Two-dimensional class histograms.

use std::path::Path;

use raster_io::{RasterDataset, SampleType, Window};
use sits_common::{SitsError, SitsResult};
use tracing::{debug, instrument};

/// Edge length of the windows both rasters are read in.
pub const HISTOGRAM_TILE_SIZE: u32 = 256;

/// Pixel counts of (class, reference class) pairs.
///
/// Rows are classes `0..=n_class`, columns reference classes
/// `0..=n_class_ref`; values above either bound land in the last row or
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n_class: usize,
    n_class_ref: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    pub fn new(n_class: usize, n_class_ref: usize) -> Self {
        Self {
            n_class,
            n_class_ref,
            counts: vec![0; (n_class + 1) * (n_class_ref + 1)],
        }
    }

    pub fn n_class(&self) -> usize {
        self.n_class
    }

    pub fn n_class_ref(&self) -> usize {
        self.n_class_ref
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_class + 1, self.n_class_ref + 1)
    }

    pub fn get(&self, class: usize, class_ref: usize) -> u64 {
        self.counts[class * (self.n_class_ref + 1) + class_ref]
    }

    /// Count each `(class[i], class_ref[i])` pair.
    pub fn add_pairs(&mut self, class: &[u8], class_ref: &[u8]) {
        let stride = self.n_class_ref + 1;
        for (&c, &r) in class.iter().zip(class_ref) {
            let row = (c as usize).min(self.n_class);
            let col = (r as usize).min(self.n_class_ref);
            self.counts[row * stride + col] += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn row_sums(&self) -> Vec<u64> {
        self.counts
            .chunks_exact(self.n_class_ref + 1)
            .map(|row| row.iter().sum())
            .collect()
    }

    pub fn column_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_class_ref + 1];
        for row in self.counts.chunks_exact(self.n_class_ref + 1) {
            for (sum, v) in sums.iter_mut().zip(row) {
                *sum += v;
            }
        }
        sums
    }

    /// The matrix bordered with its marginals and transposed, so each row
    /// is one reference class: `[0][0]` is the grand total, row 0 holds the
    /// per-class totals and column 0 the per-reference-class totals.
    pub fn extended_transposed(&self) -> Vec<Vec<u64>> {
        let row_sums = self.row_sums();
        let column_sums = self.column_sums();

        let mut extended = Vec::with_capacity(self.n_class_ref + 2);
        let mut header = Vec::with_capacity(self.n_class + 2);
        header.push(self.total());
        header.extend_from_slice(&row_sums);
        extended.push(header);

        for (r, column_sum) in column_sums.iter().enumerate() {
            let mut row = Vec::with_capacity(self.n_class + 2);
            row.push(*column_sum);
            row.extend((0..=self.n_class).map(|c| self.get(c, r)));
            extended.push(row);
        }
        extended
    }
}

/// Confusion matrix of two equally sized single-band 8-bit rasters.
#[instrument(skip_all, fields(img_class = %img_class.display(), img_class_ref = %img_class_ref.display()))]
pub fn calculate_2d_class_histogram(
    img_class: &Path,
    img_class_ref: &Path,
    n_class: usize,
    n_class_ref: usize,
) -> SitsResult<ConfusionMatrix> {
    let mut class = RasterDataset::open(img_class)?;
    let mut class_ref = RasterDataset::open(img_class_ref)?;

    if class.size() != class_ref.size() {
        return Err(SitsError::ShapeMismatch("Image size mismatch!".to_string()));
    }
    if class.band_count() != 1 || class_ref.band_count() != 1 {
        return Err(SitsError::ShapeMismatch("Band count mismatch!".to_string()));
    }
    if class.sample_type() != SampleType::U8 || class_ref.sample_type() != SampleType::U8 {
        return Err(SitsError::ShapeMismatch(
            "Unexpected image datatype!".to_string(),
        ));
    }

    let (width, height) = class.size();
    let mut matrix = ConfusionMatrix::new(n_class, n_class_ref);
    let tile = HISTOGRAM_TILE_SIZE;

    for y in (0..height).step_by(tile as usize) {
        for x in (0..width).step_by(tile as usize) {
            let window = Window::new(x, y, tile.min(width - x), tile.min(height - y));
            let a = class.read_window_u8(0, window)?;
            let b = class_ref.read_window_u8(0, window)?;
            matrix.add_pairs(&a, &b);
        }
    }

    debug!(
        width = width,
        height = height,
        n_class = n_class,
        n_class_ref = n_class_ref,
        total = matrix.total(),
        "Calculated class histogram"
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_pairs_clips() {
        let mut m = ConfusionMatrix::new(2, 3);
        m.add_pairs(&[0, 1, 2, 9, 200], &[0, 3, 7, 1, 255]);
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.get(0, 0), 1);
        assert_eq!(m.get(1, 3), 1);
        assert_eq!(m.get(2, 3), 2);
        assert_eq!(m.get(2, 1), 1);
        assert_eq!(m.total(), 5);
    }

    #[test]
    fn test_marginals() {
        let mut m = ConfusionMatrix::new(1, 2);
        m.add_pairs(&[0, 0, 1, 1, 1], &[0, 2, 1, 1, 2]);
        assert_eq!(m.row_sums(), vec![2, 3]);
        assert_eq!(m.column_sums(), vec![1, 2, 2]);

        let ext = m.extended_transposed();
        assert_eq!(ext.len(), 4);
        assert_eq!(ext[0], vec![5, 2, 3]);
        assert_eq!(ext[1], vec![1, 1, 0]);
        assert_eq!(ext[2], vec![2, 0, 2]);
        assert_eq!(ext[3], vec![2, 1, 1]);
    }
}
