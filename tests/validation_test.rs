//! Unit tests for the validation module

use chrono::NaiveDate;
use review_pulse::models::{Metric, Period};
use review_pulse::validation::InputValidator;

#[test]
fn test_parse_period_valid_values() {
    assert_eq!(InputValidator::parse_period(Some("day")).unwrap(), Period::Day);
    assert_eq!(InputValidator::parse_period(Some("week")).unwrap(), Period::Week);
    assert_eq!(InputValidator::parse_period(Some("month")).unwrap(), Period::Month);
    assert_eq!(InputValidator::parse_period(Some("year")).unwrap(), Period::Year);
}

#[test]
fn test_parse_period_defaults_to_month() {
    assert_eq!(InputValidator::parse_period(None).unwrap(), Period::Month);
}

#[test]
fn test_parse_period_rejects_unknown() {
    assert!(InputValidator::parse_period(Some("decade")).is_err());
}

#[test]
fn test_parse_period_rejects_uppercase() {
    assert!(InputValidator::parse_period(Some("Month")).is_err());
}

#[test]
fn test_parse_metric_valid_values() {
    assert_eq!(InputValidator::parse_metric(Some("rating")).unwrap(), Metric::Rating);
    assert_eq!(InputValidator::parse_metric(Some("sentiment")).unwrap(), Metric::Sentiment);
}

#[test]
fn test_parse_metric_defaults_to_rating() {
    assert_eq!(InputValidator::parse_metric(None).unwrap(), Metric::Rating);
}

#[test]
fn test_parse_metric_rejects_unknown() {
    assert!(InputValidator::parse_metric(Some("stars")).is_err());
}

#[test]
fn test_parse_date_valid() {
    let parsed = InputValidator::parse_date(Some("2023-01-10"), "start_date").unwrap();
    assert_eq!(parsed, NaiveDate::from_ymd_opt(2023, 1, 10));
}

#[test]
fn test_parse_date_none_is_none() {
    assert_eq!(InputValidator::parse_date(None, "start_date").unwrap(), None);
}

#[test]
fn test_parse_date_rejects_malformed() {
    assert!(InputValidator::parse_date(Some("01/10/2023"), "start_date").is_err());
    assert!(InputValidator::parse_date(Some("2023-13-01"), "start_date").is_err());
    assert!(InputValidator::parse_date(Some("not-a-date"), "end_date").is_err());
}

#[test]
fn test_validate_viewport_valid_bounds() {
    assert!(InputValidator::validate_viewport(39.9, 40.1, -75.3, -75.1).is_ok());
}

#[test]
fn test_validate_viewport_rejects_inverted_latitude() {
    assert!(InputValidator::validate_viewport(40.1, 39.9, -75.3, -75.1).is_err());
}

#[test]
fn test_validate_viewport_rejects_inverted_longitude() {
    assert!(InputValidator::validate_viewport(39.9, 40.1, -75.1, -75.3).is_err());
}

#[test]
fn test_validate_viewport_rejects_equal_bounds() {
    assert!(InputValidator::validate_viewport(40.0, 40.0, -75.3, -75.1).is_err());
}

#[test]
fn test_validate_viewport_rejects_out_of_range_latitude() {
    assert!(InputValidator::validate_viewport(-91.0, 40.0, -75.3, -75.1).is_err());
    assert!(InputValidator::validate_viewport(39.9, 91.0, -75.3, -75.1).is_err());
}

#[test]
fn test_validate_viewport_rejects_out_of_range_longitude() {
    assert!(InputValidator::validate_viewport(39.9, 40.1, -181.0, -75.1).is_err());
    assert!(InputValidator::validate_viewport(39.9, 40.1, -75.3, 181.0).is_err());
}

#[test]
fn test_resolve_limit_uses_default_when_absent() {
    assert_eq!(InputValidator::resolve_limit(None, 100, 1000).unwrap(), 100);
}

#[test]
fn test_resolve_limit_accepts_explicit_value() {
    assert_eq!(InputValidator::resolve_limit(Some(250), 100, 1000).unwrap(), 250);
}

#[test]
fn test_resolve_limit_accepts_maximum() {
    assert_eq!(InputValidator::resolve_limit(Some(1000), 100, 1000).unwrap(), 1000);
}

#[test]
fn test_resolve_limit_rejects_zero() {
    assert!(InputValidator::resolve_limit(Some(0), 100, 1000).is_err());
}

#[test]
fn test_resolve_limit_rejects_above_maximum() {
    assert!(InputValidator::resolve_limit(Some(1001), 100, 1000).is_err());
}

#[test]
fn test_validate_business_id_valid() {
    assert!(InputValidator::validate_business_id("abc123").is_ok());
}

#[test]
fn test_validate_business_id_empty() {
    assert!(InputValidator::validate_business_id("").is_err());
    assert!(InputValidator::validate_business_id("   ").is_err());
}

#[test]
fn test_validate_business_id_too_long() {
    let long_id = "a".repeat(101);
    assert!(InputValidator::validate_business_id(&long_id).is_err());
}

#[test]
fn test_normalize_state_uppercases() {
    assert_eq!(InputValidator::normalize_state("pa").unwrap(), "PA");
    assert_eq!(InputValidator::normalize_state(" ca ").unwrap(), "CA");
}

#[test]
fn test_normalize_state_rejects_wrong_length() {
    assert!(InputValidator::normalize_state("P").is_err());
    assert!(InputValidator::normalize_state("PAX").is_err());
    assert!(InputValidator::normalize_state("").is_err());
}

#[test]
fn test_normalize_state_rejects_non_letters() {
    assert!(InputValidator::normalize_state("P1").is_err());
}

#[test]
fn test_validate_city_valid() {
    assert!(InputValidator::validate_city("Philadelphia").is_ok());
}

#[test]
fn test_validate_city_empty() {
    assert!(InputValidator::validate_city("").is_err());
    assert!(InputValidator::validate_city("  ").is_err());
}

#[test]
fn test_validate_city_too_long() {
    let long_city = "a".repeat(101);
    assert!(InputValidator::validate_city(&long_city).is_err());
}
