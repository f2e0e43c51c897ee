// End-to-end parse + classify tests over realistic extracts

mod common;

use common::{target_date, JUSSY_EXTRACT, JUSSY_STATION};
use rain_verdict_service::climate::{
    classify, parse_observations, AnalysisWindow, Condition, Confidence, CsvParseError,
    ParseMode, Precipitation, QualityCode,
};
use rain_verdict_service::services::AnalysisService;

fn window_9_10() -> AnalysisWindow {
    AnalysisWindow::new(target_date(), 9, 10)
}

#[test]
fn test_jussy_extract_positional_fields() {
    let parsed = parse_observations(JUSSY_EXTRACT, ParseMode::Positional).unwrap();

    assert_eq!(parsed.header.len(), 196);
    assert_eq!(parsed.observations.len(), 2);
    assert_eq!(parsed.skipped_rows, 0);

    let first = &parsed.observations[0];
    assert_eq!(first.station.as_deref(), Some(JUSSY_STATION));
    assert_eq!(first.date(), Some(target_date()));
    assert_eq!(first.hour(), Some(9));
    assert_eq!(first.precipitation, Some(Precipitation::Measured(0.0)));
    assert_eq!(first.precipitation_quality, Some(QualityCode::Valid));
    assert_eq!(first.temperature, Some(16.9));
    assert_eq!(first.temperature_min, Some(16.2));
    assert_eq!(first.temperature_max, Some(17.1));
}

#[test]
fn test_jussy_extract_detailed_verdict() {
    let parsed = parse_observations(JUSSY_EXTRACT, ParseMode::Positional).unwrap();
    let verdict = classify(&parsed.observations, &window_9_10(), ParseMode::Positional);

    assert!(!verdict.did_rain);
    assert_eq!(verdict.total_precipitation_mm, 0.0);
    assert_eq!(verdict.total_record_count, 2);
    assert_eq!(verdict.valid_measurement_count, 2);
    assert_eq!(verdict.precipitation_event_count, 0);
    assert_eq!(verdict.confidence, Some(Confidence::High));
    assert_eq!(verdict.condition, Condition::Dry);
    let average = verdict.average_temperature.unwrap();
    assert!((average - 17.6).abs() < 1e-9);
}

#[test]
fn test_jussy_extract_by_name_fields() {
    let parsed = parse_observations(JUSSY_EXTRACT, ParseMode::ByName).unwrap();
    let second = &parsed.observations[1];

    assert_eq!(second.hour(), Some(10));
    assert_eq!(second.temperature, Some(18.3));
    assert_eq!(second.humidity, Some(74.0));
    assert_eq!(second.pressure, Some(1012.6));
    assert_eq!(second.wind_speed, Some(2.6));
    assert_eq!(second.precipitation_quality, Some(QualityCode::Valid));
}

#[test]
fn test_pathways_disagree_on_full_hourly_layout() {
    // The ungated pathway also sums QRR1 and QDRR1 (both contain "rr"), so a dry,
    // fully validated extract reads as rain there. The label still follows RR1.
    let positional = parse_observations(JUSSY_EXTRACT, ParseMode::Positional).unwrap();
    let by_name = parse_observations(JUSSY_EXTRACT, ParseMode::ByName).unwrap();

    let detailed = classify(&positional.observations, &window_9_10(), ParseMode::Positional);
    let simple = classify(&by_name.observations, &window_9_10(), ParseMode::ByName);

    assert!(!detailed.did_rain);
    assert!(simple.did_rain);
    assert_eq!(simple.total_precipitation_mm, 4.0);
    let columns: Vec<&str> = simple.details.iter().map(|d| d.column.as_str()).collect();
    assert_eq!(columns, vec!["QRR1", "QDRR1", "QRR1", "QDRR1"]);
    assert_eq!(simple.measured_precipitation_mm, 0.0);
    assert_eq!(simple.condition, Condition::Dry);
}

#[test]
fn test_quality_gating_over_mixed_codes() {
    let csv = "POSTE;DATE;RR1;QRR1\n\
               74211002;2025060709;2,5;1\n\
               74211002;2025060709;5,0;3\n\
               74211002;2025060710;1,0;2\n\
               74211002;2025060710;0,4;9\n\
               74211002;2025060710;3,0;7";
    let parsed = parse_observations(csv, ParseMode::Positional).unwrap();
    let verdict = classify(&parsed.observations, &window_9_10(), ParseMode::Positional);

    assert_eq!(verdict.total_precipitation_mm, 2.5);
    assert_eq!(verdict.valid_measurement_count, 1);
    assert_eq!(verdict.total_record_count, 5);
    assert_eq!(verdict.confidence, Some(Confidence::Moderate));
    assert_eq!(
        parsed.observations[4].precipitation_quality.map(|q| q.label()),
        Some("code 7".to_string())
    );
}

#[test]
fn test_dropped_rows_do_not_count() {
    let csv = "POSTE;DATE;RR1;QRR1\n74211002;2025060709;0,0;1\n74211002;2025060710;9,9\n\n74211002;2025060710;0,0;1";
    let report = AnalysisService::new()
        .analyze(csv, ParseMode::Positional, &window_9_10())
        .unwrap();

    assert_eq!(report.verdict.total_record_count, 2);
    assert!(!report.verdict.did_rain);
    assert_eq!(report.skipped_rows, 2);
    assert_eq!(report.data_row_count - report.skipped_rows, report.verdict.total_record_count);
}

#[test]
fn test_one_line_is_insufficient_in_both_modes() {
    for mode in [ParseMode::Positional, ParseMode::ByName] {
        let result = parse_observations("POSTE;DATE;RR1;QRR1\n", mode);
        assert_eq!(result, Err(CsvParseError::InsufficientData { lines: 1 }));
    }
}

#[test]
fn test_simple_pathway_scenarios() {
    let dry = parse_observations(
        "DATE;T;RR1;U;FF;PMER\n2025-06-07T09:00;16.9;0.0;80;10;1012",
        ParseMode::ByName,
    )
    .unwrap();
    let verdict = classify(&dry.observations, &window_9_10(), ParseMode::ByName);
    assert!(!verdict.did_rain);
    assert_eq!(verdict.condition, Condition::Dry);

    let heavy = parse_observations(
        "DATE;T;RR1;U;FF;PMER\n2025-06-07T09:00;16.9;6.0;80;10;1012",
        ParseMode::ByName,
    )
    .unwrap();
    let verdict = classify(&heavy.observations, &window_9_10(), ParseMode::ByName);
    assert!(verdict.did_rain);
    assert_eq!(verdict.condition, Condition::HeavyPrecipitation);
}

#[test]
fn test_simple_pathway_temperature_labels() {
    let warm = parse_observations("DATE;T;RR1\n2025-06-07T09:00;27,5;0,0", ParseMode::ByName).unwrap();
    let cold = parse_observations("DATE;T;RR1\n2025-06-07T09:00;2,0;0,0", ParseMode::ByName).unwrap();

    assert_eq!(
        classify(&warm.observations, &window_9_10(), ParseMode::ByName).condition,
        Condition::WarmAndDry
    );
    assert_eq!(
        classify(&cold.observations, &window_9_10(), ParseMode::ByName).condition,
        Condition::ColdAndDry
    );
}
