use chrono::NaiveDate;
use std::str::FromStr;

use crate::error::{ApiError, Result};
use crate::models::{Metric, Period};

/// Validation utilities for request parameters and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Parse an optional period parameter, defaulting to month
    pub fn parse_period(period: Option<&str>) -> Result<Period> {
        match period {
            Some(raw) => Period::from_str(raw),
            None => Ok(Period::default()),
        }
    }

    /// Parse an optional metric parameter, defaulting to rating
    pub fn parse_metric(metric: Option<&str>) -> Result<Metric> {
        match metric {
            Some(raw) => Metric::from_str(raw),
            None => Ok(Metric::default()),
        }
    }

    /// Parse an optional YYYY-MM-DD date parameter
    pub fn parse_date(date: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
        match date {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    ApiError::InvalidParameter(format!(
                        "Invalid {field} '{raw}'. Expected YYYY-MM-DD"
                    ))
                }),
            None => Ok(None),
        }
    }

    /// Validate viewport bounds: coordinate ranges and strict ordering
    pub fn validate_viewport(south: f64, north: f64, west: f64, east: f64) -> Result<()> {
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(ApiError::InvalidParameter(
                "Latitude bounds must be within [-90, 90]".to_string(),
            ));
        }

        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(ApiError::InvalidParameter(
                "Longitude bounds must be within [-180, 180]".to_string(),
            ));
        }

        if south >= north {
            return Err(ApiError::InvalidParameter(
                "South latitude must be less than north latitude".to_string(),
            ));
        }

        if west >= east {
            return Err(ApiError::InvalidParameter(
                "West longitude must be less than east longitude".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve a requested limit against an endpoint's default and maximum
    pub fn resolve_limit(requested: Option<u32>, default: u32, max: u32) -> Result<u32> {
        match requested {
            None => Ok(default),
            Some(0) => Err(ApiError::InvalidParameter(
                "limit must be greater than 0".to_string(),
            )),
            Some(limit) if limit > max => Err(ApiError::InvalidParameter(format!(
                "limit {limit} exceeds maximum of {max}"
            ))),
            Some(limit) => Ok(limit),
        }
    }

    /// Validate a business identifier
    pub fn validate_business_id(business_id: &str) -> Result<()> {
        if business_id.trim().is_empty() {
            return Err(ApiError::InvalidParameter(
                "Business ID cannot be empty".to_string(),
            ));
        }

        if business_id.len() > 100 {
            return Err(ApiError::InvalidParameter(
                "Business ID too long (max 100 characters)".to_string(),
            ));
        }

        Ok(())
    }

    /// Normalize a state code: uppercase, exactly two ASCII letters
    pub fn normalize_state(state: &str) -> Result<String> {
        let normalized = state.trim().to_uppercase();

        if normalized.len() != 2 || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ApiError::InvalidParameter(format!(
                "Invalid state code '{state}'. Expected two letters (e.g., 'PA')"
            )));
        }

        Ok(normalized)
    }

    /// Validate a city path segment
    pub fn validate_city(city: &str) -> Result<()> {
        if city.trim().is_empty() {
            return Err(ApiError::InvalidParameter(
                "City cannot be empty".to_string(),
            ));
        }

        if city.len() > 100 {
            return Err(ApiError::InvalidParameter(
                "City name too long (max 100 characters)".to_string(),
            ));
        }

        Ok(())
    }
}
