//! Unit tests for the telemetry table engine.

use super::*;

fn row(name: &str, avg: Option<f64>, max: Option<f64>, count: Option<u64>) -> ServicePerformance {
    ServicePerformance {
        service_name: name.to_string(),
        avg_time: avg,
        min_time: avg,
        max_time: max,
        count,
    }
}

fn names(view: &[&ServicePerformance]) -> Vec<String> {
    view.iter().map(|r| r.service_name.clone()).collect()
}

#[test]
fn test_sort_spec_toggle_flips_direction() {
    let mut spec = SortSpec::default();
    assert_eq!(spec.key, SortKey::AvgTime);
    assert_eq!(spec.direction, SortDirection::Desc);

    spec.toggle(SortKey::AvgTime);
    assert_eq!(spec.direction, SortDirection::Asc);
    spec.toggle(SortKey::AvgTime);
    assert_eq!(spec.direction, SortDirection::Desc);
}

#[test]
fn test_sort_spec_new_key_resets_to_desc() {
    let mut spec = SortSpec::default();
    spec.toggle(SortKey::AvgTime); // now Asc
    spec.toggle(SortKey::Count);
    assert_eq!(spec.key, SortKey::Count);
    assert_eq!(spec.direction, SortDirection::Desc);
}

#[test]
fn test_null_sorts_as_zero_desc() {
    // svcA=50, svcB=null, svcC=800 sorted by avgTime descending yields
    // [svcC, svcA, svcB]: null orders as 0, so it lands last.
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![
        row("svcA", Some(50.0), Some(60.0), Some(10)),
        row("svcB", None, None, None),
        row("svcC", Some(800.0), Some(900.0), Some(3)),
    ]);

    let view = table.view();
    assert_eq!(names(&view), vec!["svcC", "svcA", "svcB"]);

    let bands: Vec<&str> = view.iter().map(|r| band(r.avg_time).label()).collect();
    assert_eq!(bands, vec!["critical", "good", "no data"]);
}

#[test]
fn test_null_renders_as_no_data_not_zero() {
    assert_eq!(format_duration(None), "no data");
    assert_eq!(format_duration(Some(0.0)), "0\u{b5}s");
    assert_ne!(format_duration(None), format_duration(Some(0.0)));
}

#[test]
fn test_band_boundaries() {
    assert_eq!(band(Some(99.9)), Band::Good);
    assert_eq!(band(Some(100.0)), Band::Warning);
    assert_eq!(band(Some(499.9)), Band::Warning);
    assert_eq!(band(Some(500.0)), Band::Critical);
    assert_eq!(band(None), Band::NoData);
}

#[test]
fn test_filter_is_case_insensitive_substring() {
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![
        row("PayOrder", Some(10.0), Some(20.0), Some(1)),
        row("QueryBalance", Some(20.0), Some(30.0), Some(2)),
        row("payRefund", Some(30.0), Some(40.0), Some(3)),
    ]);

    table.set_filter("PAY");
    let view = table.view();
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|r| r.service_name.to_lowercase().contains("pay")));
}

#[test]
fn test_filter_then_sort_compose() {
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![
        row("pay1", Some(300.0), Some(1.0), Some(1)),
        row("other", Some(900.0), Some(1.0), Some(1)),
        row("pay2", Some(100.0), Some(1.0), Some(1)),
    ]);

    table.set_filter("pay");
    let view = table.view();
    assert_eq!(names(&view), vec!["pay1", "pay2"]);
}

#[test]
fn test_empty_reason_distinguishes_no_data_from_no_match() {
    let mut table = PerfTable::new();
    assert_eq!(table.empty_reason(), Some(EmptyReason::NoData));

    table.replace_snapshot(vec![row("svc", Some(1.0), Some(2.0), Some(1))]);
    assert_eq!(table.empty_reason(), None);

    table.set_filter("zzz-not-present");
    assert_eq!(table.empty_reason(), Some(EmptyReason::NoMatch));
}

#[test]
fn test_sort_by_count_with_nulls() {
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![
        row("a", Some(1.0), Some(1.0), Some(5)),
        row("b", Some(1.0), Some(1.0), None),
        row("c", Some(1.0), Some(1.0), Some(9)),
    ]);
    table.toggle_sort(SortKey::Count); // avg -> count, resets to Desc
    assert_eq!(names(&table.view()), vec!["c", "a", "b"]);

    table.toggle_sort(SortKey::Count); // flips to Asc
    assert_eq!(names(&table.view()), vec!["b", "a", "c"]);
}

#[test]
fn test_replace_snapshot_is_wholesale() {
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![row("old", Some(1.0), Some(1.0), Some(1))]);
    table.replace_snapshot(vec![row("new", Some(2.0), Some(2.0), Some(2))]);

    let view = table.view();
    assert_eq!(names(&view), vec!["new"]);
}

#[test]
fn test_totals_over_full_snapshot() {
    let mut table = PerfTable::new();
    table.replace_snapshot(vec![
        row("a", Some(100.0), Some(1.0), Some(10)),
        row("b", None, None, None),
    ]);
    // Filter must not affect the summary cards.
    table.set_filter("a");

    let totals = table.totals();
    assert_eq!(totals.services, 2);
    assert_eq!(totals.total_count, 10);
    assert_eq!(totals.overall_avg, Some(50.0));
}

#[test]
fn test_totals_empty_snapshot() {
    let table = PerfTable::new();
    let totals = table.totals();
    assert_eq!(totals.services, 0);
    assert_eq!(totals.overall_avg, None);
    assert_eq!(totals.total_count, 0);
}

#[test]
fn test_format_duration_units() {
    assert_eq!(format_duration(Some(0.5)), "500\u{b5}s");
    assert_eq!(format_duration(Some(12.345)), "12.35ms");
    assert_eq!(format_duration(Some(1500.0)), "1.50s");
}

#[test]
fn test_wire_shape_is_camel_case() {
    let json = r#"{"serviceName":"svc","avgTime":12.5,"minTime":null,"maxTime":99.0,"count":4}"#;
    let parsed: ServicePerformance = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.service_name, "svc");
    assert_eq!(parsed.avg_time, Some(12.5));
    assert_eq!(parsed.min_time, None);
    assert_eq!(parsed.count, Some(4));
}
