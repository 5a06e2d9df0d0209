//! Integration tests for the CoverageJSON reader against synthetic documents.

use chrono::{TimeZone, Utc};
use covjson::{
    AssemblyStrategy, CovJsonError, CoverageJsonReader, DomainType, RangeDataType, TimeSource,
};
use serde_json::json;
use test_utils::{
    assert_approx_eq, point_series, polygons, temp_test_dir, trajectory_collection, write_fixture,
    GridFixture, EPSG_3857,
};

fn reader(doc: &serde_json::Value) -> CoverageJsonReader {
    CoverageJsonReader::from_str(&doc.to_string()).unwrap()
}

// ============================================================================
// Grid documents
// ============================================================================

#[test]
fn test_single_layer_queries() {
    let fixture = GridFixture::single_layer();
    let reader = reader(&fixture.build());

    assert!(!reader.is_collection());
    assert_eq!(reader.coverages_count(), 1);
    assert_eq!(reader.domain_type(), Some(&DomainType::Grid));
    assert!(!reader.has_t());
    assert!(!reader.has_z());
    assert_eq!(reader.parameter_names(), vec!["TMP"]);
    assert_eq!(reader.parameter("TMP").and_then(|p| p.unit_label()), Some("K"));
    assert_eq!(reader.crs().map(|c| c.authid), Some("EPSG:4326".to_string()));
    assert!(reader.time_range().is_none());

    let summary = reader.parameter_ranges("TMP").unwrap();
    assert_eq!(summary.data_type, RangeDataType::Float);
    assert_eq!(summary.axis_names, vec!["y", "x"]);
    assert_eq!(summary.shape, vec![270, 432]);
    assert_eq!(summary.count, 270 * 432);
    assert_eq!(summary.valid_count, 270 * 432);
    assert_eq!(summary.min, Some(0.0));
    assert_eq!(summary.max, Some(fixture.value_at(0, 0, 269, 431)));
}

#[test]
fn test_time_series_queries() {
    let reader = reader(&GridFixture::time_series().build());

    assert!(reader.has_t());
    assert!(!reader.has_z());
    assert_eq!(reader.parameter_names(), vec!["TMP", "UGRD"]);
    assert_eq!(reader.axis_values("t").len(), 13);
    assert_eq!(reader.time_step().map(|d| d.num_seconds()), Some(3600));

    let range = reader.time_range().unwrap();
    assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());

    let classification = reader.classify(0).unwrap();
    assert_eq!(classification.strategy, AssemblyStrategy::Raster);
    assert_eq!(classification.time_source, TimeSource::Independent);
    assert_eq!(classification.axis_order, vec!["t", "y", "x"]);
}

#[test]
fn test_has_t_in_data_per_parameter() {
    let mut doc = GridFixture::time_series().build();
    let first_slice: Vec<serde_json::Value> = doc["ranges"]["UGRD"]["values"]
        .as_array()
        .unwrap()
        .iter()
        .take(16 * 14)
        .cloned()
        .collect();
    doc["ranges"]["UGRD"] = json!({
        "type": "NdArray",
        "dataType": "float",
        "axisNames": ["y", "x"],
        "shape": [14, 16],
        "values": first_slice,
    });
    let reader = reader(&doc);
    let coverage = reader.coverage(0).unwrap();

    assert!(coverage.has_t_in_data("TMP").unwrap());
    assert!(!coverage.has_t_in_data("UGRD").unwrap());
    assert!(!coverage.has_z_in_data("TMP").unwrap());
    assert!(matches!(
        coverage.has_t_in_data("missing"),
        Err(CovJsonError::ParameterNotFound(_))
    ));
}

#[test]
fn test_level_axis_and_projected_crs() {
    let doc = GridFixture::new(4, 4)
        .with_levels(&[1000.0, 850.0, 500.0])
        .with_parameter("T", None)
        .with_crs(Some(EPSG_3857))
        .build();
    let reader = reader(&doc);

    assert!(reader.has_z());
    assert_eq!(reader.axis_values("z").len(), 3);
    let crs = reader.crs().unwrap();
    assert_eq!(crs.authid, "EPSG:3857");
    assert!(!crs.is_geographic());
}

#[test]
fn test_missing_values_in_summary() {
    let doc = GridFixture::new(3, 2)
        .with_parameter("P", None)
        .with_missing(&[0, 5])
        .build();
    let summary = reader(&doc).parameter_ranges("P").unwrap();

    assert_eq!(summary.count, 6);
    assert_eq!(summary.valid_count, 4);
    // cells 1..=4 are 1000, 2000, 1, 1001
    assert_eq!(summary.min, Some(1.0));
    assert_eq!(summary.max, Some(2000.0));
    assert_approx_eq!(summary.mean.unwrap(), 1000.5, 1e-9);
}

// ============================================================================
// Vector documents
// ============================================================================

#[test]
fn test_trajectory_collection_queries() {
    let reader = reader(&trajectory_collection(221, 24, Some(10)));

    assert!(reader.is_collection());
    assert_eq!(reader.coverages_count(), 221);
    assert_eq!(reader.domain_type(), Some(&DomainType::Trajectory));
    assert!(!reader.has_t());
    assert_eq!(reader.parameter_names(), vec!["track_type"]);
    assert!(reader.parameter("track_type").unwrap().is_categorical());

    let classifications = reader.classify_all().unwrap();
    assert_eq!(classifications.len(), 221);
    assert!(classifications.iter().all(|c| c.strategy == AssemblyStrategy::Vector));
    assert!(classifications.iter().all(|c| c.time_source == TimeSource::Composite));

    // composite times feed the time range
    let range = reader.time_range().unwrap();
    assert_eq!(range.start, Utc.with_ymd_and_hms(2008, 1, 1, 4, 0, 0).unwrap());
    assert_eq!(range.end, Utc.with_ymd_and_hms(2008, 1, 1, 6, 59, 0).unwrap());

    let summary = reader.parameter_ranges("track_type").unwrap();
    assert_eq!(summary.data_type, RangeDataType::Integer);
    assert_eq!(summary.count, 221 * 3);
    assert_eq!(summary.valid_count, (221 - 22) * 3);
    assert_eq!(summary.min, Some(0.0));
    assert_eq!(summary.max, Some(23.0));
}

#[test]
fn test_mixed_collection_is_malformed() {
    let mut doc = trajectory_collection(3, 2, None);
    doc["coverages"][1]["domain"]["domainType"] = json!("MultiPoint");
    let reader = reader(&doc);

    assert!(matches!(reader.classify_all(), Err(CovJsonError::MalformedDocument(_))));
}

#[test]
fn test_point_series_and_polygons() {
    let series = reader(&point_series(5));
    assert!(series.has_t());
    assert_eq!(series.classify(0).unwrap().strategy, AssemblyStrategy::Vector);

    let polys = reader(&polygons(2));
    let classification = polys.classify(0).unwrap();
    assert_eq!(classification.domain_type, DomainType::MultiPolygon);
    assert!(classification.has_composite_axis);
    assert!(!polys.has_t());
}

#[test]
fn test_unsupported_domain_type() {
    let mut doc = GridFixture::new(2, 2).with_parameter("P", None).build();
    doc["domain"]["domainType"] = json!("Section");
    let reader = reader(&doc);

    let err = reader.classify(0).unwrap_err();
    assert!(matches!(
        err,
        CovJsonError::UnsupportedDomainType { ref domain_type, coverage_index: 0 } if domain_type == "Section"
    ));
    assert!(err.is_recoverable());
}

// ============================================================================
// Input handling
// ============================================================================

#[test]
fn test_open_from_file() {
    let dir = temp_test_dir();
    let doc = GridFixture::new(8, 8).with_parameter("P", None).build();
    let path = write_fixture(dir.path(), "grid.covjson", &doc);

    let reader = CoverageJsonReader::open(&path).unwrap();
    let on_disk = std::fs::metadata(&path).unwrap().len();
    assert_eq!(reader.file_size_bytes(), on_disk);
    assert_approx_eq!(reader.file_size_mb(), on_disk as f64 / 1_000_000.0, 1e-12);
    assert_eq!(reader.source(), Some(path.as_path()));
}

#[test]
fn test_open_missing_file() {
    let dir = temp_test_dir();
    let err = CoverageJsonReader::open(dir.path().join("absent.covjson")).unwrap_err();
    assert!(matches!(err, CovJsonError::Io(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_invalid_json_is_malformed() {
    assert!(matches!(
        CoverageJsonReader::from_str("{\"type\": \"Coverage\""),
        Err(CovJsonError::MalformedDocument(_))
    ));
    assert!(matches!(
        CoverageJsonReader::from_str(r#"{"type": "Coverage", "ranges": {}}"#),
        Err(CovJsonError::MalformedDocument(_))
    ));
}
