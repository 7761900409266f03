//! Tab-separated class statistics report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use land_cover::ClassTable;
use sits_common::SitsResult;
use tracing::info;

use crate::histogram::{calculate_2d_class_histogram, ConfusionMatrix};

const LINE_END: &str = "\r\n";

/// Compare `img_class` against `img_class_ref` and write the report to
/// `out`. The reference class count is the largest index in `ref_classes`.
pub fn write_class_statistics(
    out: &Path,
    img_class: &Path,
    img_class_ref: &Path,
    n_class: usize,
    ref_classes: &ClassTable,
) -> SitsResult<ConfusionMatrix> {
    let matrix = calculate_2d_class_histogram(
        img_class,
        img_class_ref,
        n_class,
        usize::from(ref_classes.max_index()),
    )?;

    let mut writer = BufWriter::new(File::create(out)?);
    write_statistics_report(&mut writer, &matrix, ref_classes)?;
    writer.flush()?;

    info!(path = %out.display(), pixels = matrix.total(), "Wrote class statistics");
    Ok(matrix)
}

/// Report rows are reference classes, columns the total followed by the
/// classifier classes.
///
/// Fails with `InvalidInput`, before writing anything, when the table holds
/// a class index beyond the matrix's reference dimension.
pub fn write_statistics_report<W: Write>(
    out: &mut W,
    matrix: &ConfusionMatrix,
    classes: &ClassTable,
) -> std::io::Result<()> {
    if usize::from(classes.max_index()) > matrix.n_class_ref() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "class table '{}' reaches index {} but the matrix covers reference classes 0..={}",
                classes.name(),
                classes.max_index(),
                matrix.n_class_ref()
            ),
        ));
    }
    let extended = matrix.extended_transposed();

    let mut header = vec![String::new(), "Total".to_string()];
    header.extend((0..matrix.n_class()).map(|i| format!("Class #{}", i)));
    header.push("Other".to_string());
    write!(out, "{}{}", header.join("\t"), LINE_END)?;

    write_row(out, "Pixel Count", &extended[0])?;
    for class in classes.classes() {
        let label = format!("{} {}", class.code(), class.title);
        write_row(out, &label, &extended[class.index as usize + 1])?;
    }
    if let Some(last) = extended.last() {
        write_row(out, "Other", last)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, label: &str, values: &[u64]) -> std::io::Result<()> {
    write!(out, "{}", label)?;
    for value in values {
        write!(out, "\t{}", value)?;
    }
    out.write_all(LINE_END.as_bytes())
}
