//! Generators for synthetic class rasters.
//!
//! The patterns are predictable so statistics over them can be checked by
//! hand.

/// Creates a class grid with predictable values.
///
/// Each cell value is `(col + row) % n_classes`.
///
/// # Example
///
/// ```
/// use test_utils::create_diagonal_class_grid;
///
/// let grid = create_diagonal_class_grid(4, 2, 3);
/// assert_eq!(grid, vec![0, 1, 2, 0, 1, 2, 0, 1]);
/// ```
pub fn create_diagonal_class_grid(width: usize, height: usize, n_classes: u8) -> Vec<u8> {
    let n = n_classes.max(1) as usize;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((col + row) % n) as u8);
        }
    }
    data
}

/// Creates a grid split into vertical bands, one per entry of `classes`.
///
/// Band widths are `width / classes.len()`; the last band takes the rest.
pub fn create_banded_class_grid(width: usize, height: usize, classes: &[u8]) -> Vec<u8> {
    if classes.is_empty() {
        return vec![0; width * height];
    }
    let band = (width / classes.len()).max(1);
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(classes[(col / band).min(classes.len() - 1)]);
        }
    }
    data
}

/// Creates a grid filled with a single class.
pub fn create_constant_class_grid(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Counts the (a, b) pairs of two equally sized grids.
///
/// Reference implementation for checking confusion matrices.
pub fn count_class_pairs(a: &[u8], b: &[u8]) -> Vec<((u8, u8), u64)> {
    let mut counts = std::collections::BTreeMap::new();
    for (&x, &y) in a.iter().zip(b) {
        *counts.entry((x, y)).or_insert(0u64) += 1;
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_diagonal_class_grid() {
        let grid = create_diagonal_class_grid(10, 5, 4);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0);
        assert_eq!(grid[1], 1);
        assert_eq!(grid[10], 1); // col=0, row=1
        assert_eq!(grid[13], 0); // col=3, row=1
    }

    #[test]
    fn test_create_banded_class_grid() {
        let grid = create_banded_class_grid(7, 2, &[5, 9]);
        assert_eq!(&grid[..7], &[5, 5, 5, 9, 9, 9, 9]);
        assert_eq!(&grid[7..], &[5, 5, 5, 9, 9, 9, 9]);
    }

    #[test]
    fn test_count_class_pairs() {
        let a = create_constant_class_grid(3, 1, 2);
        let b = vec![0, 2, 2];
        assert_eq!(count_class_pairs(&a, &b), vec![((2, 0), 1), ((2, 2), 2)]);
    }
}
