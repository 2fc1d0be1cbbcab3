//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.
//! Queries are assembled from these constants so a rename stays a one-line change.

/// Businesses table schema
pub mod businesses {
    /// Table name
    pub const TABLE: &str = "businesses";
    /// Primary key column
    pub const BUSINESS_ID: &str = "business_id";
    /// Business name column
    pub const NAME: &str = "name";
    /// City column
    pub const CITY: &str = "city";
    /// Two-letter state code column
    pub const STATE: &str = "state";
    /// Latitude column (degrees)
    pub const LATITUDE: &str = "latitude";
    /// Longitude column (degrees)
    pub const LONGITUDE: &str = "longitude";
    /// Externally maintained review count column
    pub const REVIEW_COUNT: &str = "review_count";
    /// Externally maintained average star rating column
    pub const STARS: &str = "stars";
    /// Open/closed flag column
    pub const IS_OPEN: &str = "is_open";
    /// Comma-separated categories column
    pub const CATEGORIES: &str = "categories";
    /// Attributes JSON column (string map)
    pub const ATTRIBUTES: &str = "attributes";
    /// Opening hours JSON column (day to range map)
    pub const HOURS: &str = "hours";
    /// Photo count column
    pub const PHOTO_COUNT: &str = "photo_count";
}

/// Reviews table schema
pub mod reviews {
    /// Table name
    pub const TABLE: &str = "reviews";
    /// Primary key column
    pub const REVIEW_ID: &str = "review_id";
    /// Foreign key to businesses table
    pub const BUSINESS_ID: &str = "business_id";
    /// Review text column
    pub const TEXT: &str = "text";
    /// Star rating column (0-5)
    pub const STARS: &str = "stars";
    /// Review date column (ISO-8601 text, primary time-series axis)
    pub const DATE: &str = "date";
    /// Reviewer identifier column
    pub const USER_ID: &str = "user_id";
    /// Useful vote count column
    pub const USEFUL: &str = "useful";
    /// Funny vote count column
    pub const FUNNY: &str = "funny";
    /// Cool vote count column
    pub const COOL: &str = "cool";
    /// Sentiment label column (negative/neutral/positive)
    pub const SENTIMENT_LABEL: &str = "sentiment_label";
    /// Sentiment model confidence column
    pub const SENTIMENT_CONFIDENCE: &str = "sentiment_confidence";
    /// Negative class probability column
    pub const PROB_NEGATIVE: &str = "prob_negative";
    /// Neutral class probability column
    pub const PROB_NEUTRAL: &str = "prob_neutral";
    /// Positive class probability column
    pub const PROB_POSITIVE: &str = "prob_positive";
    /// Probability-difference sentiment score column
    pub const SENTIMENT_SCORE_PROB_DIFF: &str = "sentiment_score_prob_diff";
    /// Expected-value sentiment score column
    pub const SENTIMENT_SCORE_EXPECTED: &str = "sentiment_score_expected";
    /// Logit-based sentiment score column
    pub const SENTIMENT_SCORE_LOGIT: &str = "sentiment_score_logit";
}

/// Photos table schema
pub mod photos {
    /// Table name
    pub const TABLE: &str = "photos";
    /// Primary key column
    pub const PHOTO_ID: &str = "photo_id";
    /// Foreign key to businesses table
    pub const BUSINESS_ID: &str = "business_id";
    /// Photo label column ("food", "inside", ...)
    pub const LABEL: &str = "label";
}
