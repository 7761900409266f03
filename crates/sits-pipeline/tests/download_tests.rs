//! Alignment downloads against a fake coverage service.

mod common;

use common::{ids, selection, Call, FakeCoverageService};
use raster_io::RasterDataset;
use sits_common::SitsError;
use sits_pipeline::{download_coverages, DownloadOptions, GridReference};
use test_utils::{assert_approx_eq, temp_test_dir};
use wcs_protocol::{GeoTiffOptions, Interpolation, Scale, Subset};

#[test]
fn test_master_and_slave_requests() {
    let dir = temp_test_dir();
    let out = dir.path().join("out");
    let service = FakeCoverageService::utm33();
    let options = DownloadOptions::new(0.5, Interpolation::Average).unwrap();

    let mut completed = Vec::new();
    let images = download_coverages(
        &service,
        &ids(&["A", "B"]),
        &selection(),
        &out,
        &options,
        |idx, id, path| completed.push((idx, id.to_string(), path.to_path_buf())),
    )
    .unwrap();

    assert_eq!(images, vec![out.join("A.tif"), out.join("B.tif")]);
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[1], (1, "B".to_string(), out.join("B.tif")));

    let calls = service.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::Describe("A".to_string()));

    let requests = service.coverage_requests();
    let (master_id, master) = &requests[0];
    assert_eq!(master_id, "A");
    assert_eq!(master.format.as_deref(), Some("image/tiff"));
    assert_eq!(master.subsetting_srid, Some(4326));
    assert_eq!(master.output_srid, Some(32633));
    assert_eq!(master.scale, Some(Scale::Factor(0.5)));
    assert_eq!(master.interpolation, Some(Interpolation::Average));
    assert_eq!(master.geotiff, Some(GeoTiffOptions::sits_default()));
    assert_eq!(
        master.subsets,
        vec![Subset::trim("x", 10.0, 11.0), Subset::trim("y", 45.0, 46.0)]
    );
    assert!(master.size.is_empty());

    let (slave_id, slave) = &requests[1];
    assert_eq!(slave_id, "B");
    assert_eq!(slave.subsetting_srid, Some(32633));
    assert_eq!(slave.output_srid, Some(32633));
    assert_eq!(slave.scale, None);
    assert_eq!(slave.interpolation, Some(Interpolation::Average));
    assert_eq!(slave.geotiff, Some(GeoTiffOptions::sits_default()));
    assert_eq!(slave.size, vec![("x".to_string(), 50), ("y".to_string(), 50)]);
    assert_eq!(
        slave.subsets,
        vec![
            Subset::trim("x", 600000.0, 601000.0),
            Subset::trim("y", 5299000.0, 5300000.0),
        ]
    );
}

#[test]
fn test_slaves_share_master_grid() {
    let dir = temp_test_dir();
    let out = dir.path().join("sits");
    let service = FakeCoverageService::utm33();

    let images = download_coverages(
        &service,
        &ids(&["S2_20150704", "S2_20150724", "S2_20150803", "L8_20150810"]),
        &selection(),
        &out,
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap();
    assert_eq!(images.len(), 4);

    let master = RasterDataset::open(&images[0]).unwrap();
    let master_gt = master.geotransform().unwrap();
    for image in &images[1..] {
        let slave = RasterDataset::open(image).unwrap();
        assert_eq!(slave.srid(), master.srid());
        assert_eq!(slave.size(), master.size());
        let gt = slave.geotransform().unwrap();
        assert_approx_eq!(gt.apply(0.0, 0.0).0, master_gt.apply(0.0, 0.0).0, 1e-6);
        assert_approx_eq!(gt.apply(0.0, 0.0).1, master_gt.apply(0.0, 0.0).1, 1e-6);
    }

    // only the master is described
    let describes = service
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Describe(_)))
        .count();
    assert_eq!(describes, 1);
}

#[test]
fn test_grid_reference_from_downloaded_master() {
    let dir = temp_test_dir();
    let out = dir.path().join("out");
    let service = FakeCoverageService::utm33();
    let images = download_coverages(
        &service,
        &ids(&["A"]),
        &selection(),
        &out,
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap();

    let grid = GridReference::from_raster(&images[0], 32633).unwrap();
    assert_eq!(grid.size, (100, 100));
    assert_eq!(grid.subset_x, (600000.0, 601000.0));
    assert_eq!(grid.subset_y, (5299000.0, 5300000.0));
}

#[test]
fn test_empty_sits_touches_nothing() {
    let dir = temp_test_dir();
    let out = dir.path().join("out");
    let service = FakeCoverageService::utm33();

    let err = download_coverages(
        &service,
        &[],
        &selection(),
        &out,
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap_err();

    assert!(matches!(err, SitsError::EmptySits));
    assert!(service.calls().is_empty());
    assert!(!out.exists());
}

#[test]
fn test_existing_output_directory_fails() {
    let dir = temp_test_dir();
    let service = FakeCoverageService::utm33();

    let err = download_coverages(
        &service,
        &ids(&["A"]),
        &selection(),
        dir.path(),
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap_err();

    assert!(matches!(err, SitsError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));
    assert!(service.calls().is_empty());
}

#[test]
fn test_master_without_epsg_reference() {
    let dir = temp_test_dir();
    let service = FakeCoverageService::new(None);

    let err = download_coverages(
        &service,
        &ids(&["A", "B"]),
        &selection(),
        &dir.path().join("out"),
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap_err();

    assert!(matches!(err, SitsError::UnresolvedReference(_)));
    assert!(service.coverage_requests().is_empty());
}

#[test]
fn test_fault_aborts_and_keeps_partial_output() {
    let dir = temp_test_dir();
    let out = dir.path().join("out");
    let service = FakeCoverageService::utm33().failing_on("B");

    let err = download_coverages(
        &service,
        &ids(&["A", "B", "C"]),
        &selection(),
        &out,
        &DownloadOptions::default(),
        |_, _, _| {},
    )
    .unwrap_err();

    assert!(err.is_protocol_fault());
    assert!(out.join("A.tif").exists());
    assert!(!out.join("C.tif").exists());
    assert_eq!(service.coverage_requests().len(), 2);
}
