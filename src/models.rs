//! Data models for businesses, reviews, photos, and analytics payloads
//!
//! This module contains all data structures used throughout the application,
//! including database rows, aggregation buckets, and API response shapes.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Database representation of a business
#[derive(Debug, Clone)]
pub struct Business {
    /// Unique business identifier
    pub business_id: String,
    /// Business name
    pub name: String,
    /// City the business is located in
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Externally maintained review count
    pub review_count: i64,
    /// Externally maintained average star rating (0-5)
    pub stars: f64,
    /// True if the business is currently open
    pub is_open: bool,
    /// Comma-separated category list
    pub categories: String,
    /// Attribute map (key to string value)
    pub attributes: HashMap<String, String>,
    /// Opening hours (day name to time range)
    pub hours: HashMap<String, String>,
    /// Number of photos attached to this business
    pub photo_count: i64,
}

/// Database representation of a review
#[derive(Debug, Clone)]
pub struct Review {
    /// Unique review identifier
    pub review_id: String,
    /// Business this review belongs to
    pub business_id: String,
    /// Review text content
    pub text: String,
    /// Star rating (0-5)
    pub stars: f64,
    /// Review date (primary time-series axis)
    pub date: NaiveDate,
    /// Reviewer identifier
    pub user_id: String,
    /// Useful vote count
    pub useful: i64,
    /// Funny vote count
    pub funny: i64,
    /// Cool vote count
    pub cool: i64,
    /// Sentiment label (negative/neutral/positive)
    pub sentiment_label: String,
    /// Sentiment model confidence
    pub sentiment_confidence: f64,
    /// Negative class probability
    pub prob_negative: f64,
    /// Neutral class probability
    pub prob_neutral: f64,
    /// Positive class probability
    pub prob_positive: f64,
    /// Probability-difference sentiment score
    pub sentiment_score_prob_diff: f64,
    /// Expected-value sentiment score
    pub sentiment_score_expected: f64,
    /// Logit-based sentiment score
    pub sentiment_score_logit: f64,
}

/// Database representation of a photo
#[derive(Debug, Clone)]
pub struct Photo {
    /// Unique photo identifier
    pub photo_id: String,
    /// Business this photo belongs to
    pub business_id: String,
    /// Photo label ("food", "inside", ...)
    pub label: String,
}

/// Time bucket width for timeline aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Calendar day buckets
    Day,
    /// ISO week buckets (Monday start)
    Week,
    /// Calendar month buckets
    #[default]
    Month,
    /// Calendar year buckets
    Year,
}

impl Period {
    /// Get the lowercase wire name for this period
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(ApiError::InvalidParameter(format!(
                "Invalid period '{other}'. Must be one of: day, week, month, year"
            ))),
        }
    }
}

/// Metric selected for timeline aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Average star rating
    #[default]
    Rating,
    /// Average sentiment scores
    Sentiment,
}

impl Metric {
    /// Get the lowercase wire name for this metric
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Sentiment => "sentiment",
        }
    }
}

impl FromStr for Metric {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(Self::Rating),
            "sentiment" => Ok(Self::Sentiment),
            other => Err(ApiError::InvalidParameter(format!(
                "Invalid metric '{other}'. Must be one of: rating, sentiment"
            ))),
        }
    }
}

/// Optional inclusive [start, end] filter applied to review dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    /// Inclusive lower bound
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end: Option<NaiveDate>,
}

/// One ratings bucket in a business-scoped timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingPoint {
    /// First calendar day of the bucket
    pub period_start: NaiveDate,
    /// Mean star rating within the bucket
    pub avg_rating: f64,
    /// Number of reviews within the bucket
    pub review_count: i64,
}

/// One sentiment bucket in a business-scoped timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPoint {
    /// First calendar day of the bucket
    pub period_start: NaiveDate,
    /// Mean probability-difference sentiment score
    pub avg_sentiment_score: f64,
    /// Mean expected-value sentiment score
    pub avg_sentiment_expected: f64,
    /// Number of reviews within the bucket
    pub review_count: i64,
}

/// One ratings bucket in a region-scoped timeline or comparison series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRatingPoint {
    /// First calendar day of the bucket
    pub period_start: NaiveDate,
    /// Mean star rating within the bucket
    pub avg_rating: f64,
    /// Number of reviews within the bucket
    pub review_count: i64,
    /// Distinct businesses contributing to the bucket (1 on the business side
    /// of a comparison)
    pub business_count: i64,
}

/// One sentiment bucket in a region-scoped timeline or comparison series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSentimentPoint {
    /// First calendar day of the bucket
    pub period_start: NaiveDate,
    /// Mean probability-difference sentiment score
    pub avg_sentiment_score: f64,
    /// Mean expected-value sentiment score
    pub avg_sentiment_expected: f64,
    /// Number of reviews within the bucket
    pub review_count: i64,
    /// Distinct businesses contributing to the bucket (1 on the business side
    /// of a comparison)
    pub business_count: i64,
}

/// Bucket series for a single business, one variant per metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TimelineSeries {
    /// Ratings buckets
    Ratings(Vec<RatingPoint>),
    /// Sentiment buckets
    Sentiment(Vec<SentimentPoint>),
}

/// Bucket series carrying a distinct-business count, one variant per metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RegionSeries {
    /// Ratings buckets
    Ratings(Vec<RegionRatingPoint>),
    /// Sentiment buckets
    Sentiment(Vec<RegionSentimentPoint>),
}

/// Timeline response for a single business
#[derive(Debug, Clone, Serialize)]
pub struct BusinessTimeline {
    /// Business identifier
    pub business_id: String,
    /// Business display name
    pub business_name: String,
    /// Bucket width used for aggregation
    pub period: Period,
    /// Metric carried by `data`
    pub metric: Metric,
    /// Inclusive lower date bound, if one was applied
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound, if one was applied
    pub end_date: Option<NaiveDate>,
    /// Chronologically ordered buckets
    pub data: TimelineSeries,
}

/// Timeline response for all businesses in a city
#[derive(Debug, Clone, Serialize)]
pub struct CityTimeline {
    /// City name
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Bucket width used for aggregation
    pub period: Period,
    /// Metric carried by `data`
    pub metric: Metric,
    /// Inclusive lower date bound, if one was applied
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound, if one was applied
    pub end_date: Option<NaiveDate>,
    /// Chronologically ordered buckets
    pub data: RegionSeries,
}

/// Timeline response for all businesses in a state
#[derive(Debug, Clone, Serialize)]
pub struct StateTimeline {
    /// Two-letter state code
    pub state: String,
    /// Bucket width used for aggregation
    pub period: Period,
    /// Metric carried by `data`
    pub metric: Metric,
    /// Inclusive lower date bound, if one was applied
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound, if one was applied
    pub end_date: Option<NaiveDate>,
    /// Chronologically ordered buckets
    pub data: RegionSeries,
}

/// Business-vs-city comparison response
#[derive(Debug, Clone, Serialize)]
pub struct CityComparison {
    /// Business identifier
    pub business_id: String,
    /// Business display name
    pub business_name: String,
    /// City used as the peer scope
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Bucket width used for aggregation
    pub period: Period,
    /// Metric carried by both series
    pub metric: Metric,
    /// Inclusive lower date bound, if one was applied
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound, if one was applied
    pub end_date: Option<NaiveDate>,
    /// Buckets for the business itself (business_count is always 1)
    pub business_data: RegionSeries,
    /// Buckets averaged over the whole city
    pub city_average: RegionSeries,
}

/// Business-vs-state comparison response
#[derive(Debug, Clone, Serialize)]
pub struct StateComparison {
    /// Business identifier
    pub business_id: String,
    /// Business display name
    pub business_name: String,
    /// Two-letter state code used as the peer scope
    pub state: String,
    /// Bucket width used for aggregation
    pub period: Period,
    /// Metric carried by both series
    pub metric: Metric,
    /// Inclusive lower date bound, if one was applied
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound, if one was applied
    pub end_date: Option<NaiveDate>,
    /// Buckets for the business itself (business_count is always 1)
    pub business_data: RegionSeries,
    /// Buckets averaged over the whole state
    pub state_average: RegionSeries,
}

/// Business payload returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct BusinessDto {
    /// Unique business identifier
    pub business_id: String,
    /// Business name
    pub name: String,
    /// Comma-separated category list
    pub categories: String,
    /// City the business is located in
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Externally maintained review count
    pub review_count: i64,
    /// Externally maintained average star rating (0-5)
    pub stars: f64,
    /// Attribute map
    pub attributes: HashMap<String, String>,
    /// Opening hours map
    pub hours: HashMap<String, String>,
    /// Number of photos attached to this business
    pub photo_count: i64,
}

impl From<Business> for BusinessDto {
    fn from(business: Business) -> Self {
        Self {
            business_id: business.business_id,
            name: business.name,
            categories: business.categories,
            city: business.city,
            state: business.state,
            latitude: business.latitude,
            longitude: business.longitude,
            review_count: business.review_count,
            stars: business.stars,
            attributes: business.attributes,
            hours: business.hours,
            photo_count: business.photo_count,
        }
    }
}

/// Review payload returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDto {
    /// Unique review identifier
    pub review_id: String,
    /// Review text content
    pub text: String,
    /// Star rating (0-5)
    pub stars: f64,
    /// Review date
    pub date: NaiveDate,
    /// Business this review belongs to
    pub business_id: String,
    /// Sentiment model confidence
    pub sentiment_confidence: f64,
    /// Negative class probability
    pub prob_negative: f64,
    /// Neutral class probability
    pub prob_neutral: f64,
    /// Positive class probability
    pub prob_positive: f64,
    /// Probability-difference sentiment score
    pub sentiment_score_prob_diff: f64,
    /// Expected-value sentiment score
    pub sentiment_score_expected: f64,
    /// Logit-based sentiment score
    pub sentiment_score_logit: f64,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            review_id: review.review_id,
            text: review.text,
            stars: review.stars,
            date: review.date,
            business_id: review.business_id,
            sentiment_confidence: review.sentiment_confidence,
            prob_negative: review.prob_negative,
            prob_neutral: review.prob_neutral,
            prob_positive: review.prob_positive,
            sentiment_score_prob_diff: review.sentiment_score_prob_diff,
            sentiment_score_expected: review.sentiment_score_expected,
            sentiment_score_logit: review.sentiment_score_logit,
        }
    }
}

/// Photo payload returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct PhotoDto {
    /// Unique photo identifier
    pub photo_id: String,
    /// Business this photo belongs to
    pub business_id: String,
    /// Photo label
    pub label: String,
}

impl From<Photo> for PhotoDto {
    fn from(photo: Photo) -> Self {
        Self {
            photo_id: photo.photo_id,
            business_id: photo.business_id,
            label: photo.label,
        }
    }
}
