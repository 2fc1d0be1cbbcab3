//! Service layer: validation sequencing and response assembly
//!
//! Services own the orchestration the repositories do not: not-found checks
//! before aggregation, viewport bound validation, pagination clamping, state
//! normalization, and shaping raw query rows into API payloads. They hold
//! their repositories as trait objects so tests can inject doubles.

use std::sync::Arc;

use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::models::{
    Business, BusinessDto, BusinessTimeline, CityComparison, CityTimeline, DateWindow, Metric,
    Period, PhotoDto, RegionSeries, ReviewDto, StateComparison, StateTimeline, TimelineSeries,
};
use crate::repository::{BusinessRepository, ReviewRepository};
use crate::validation::InputValidator;

/// Business lookup, listing, search, and region enumeration
pub struct BusinessService {
    businesses: Arc<dyn BusinessRepository>,
    reviews: Arc<dyn ReviewRepository>,
    limits: ApiConfig,
}

impl BusinessService {
    pub fn new(
        businesses: Arc<dyn BusinessRepository>,
        reviews: Arc<dyn ReviewRepository>,
        limits: ApiConfig,
    ) -> Self {
        Self {
            businesses,
            reviews,
            limits,
        }
    }

    /// Exact lookup; unknown id is a not-found failure
    pub async fn get_business(&self, business_id: &str) -> Result<BusinessDto> {
        let business = self.require_business(business_id).await?;
        Ok(business.into())
    }

    /// Paginated listing with optional region filters. The state filter is
    /// case-normalized to uppercase.
    pub async fn list_businesses(
        &self,
        state: Option<String>,
        city: Option<String>,
        skip: u32,
        limit: Option<u32>,
    ) -> Result<Vec<BusinessDto>> {
        let limit = InputValidator::resolve_limit(
            limit,
            self.limits.default_list_limit,
            self.limits.max_list_limit,
        )?;
        let state = state.map(|s| s.to_uppercase());

        let results = self.businesses.get_all(state, city, skip, limit).await?;
        Ok(results.into_iter().map(BusinessDto::from).collect())
    }

    /// Businesses inside an inclusive bounding box; bounds are validated
    /// before any query runs
    pub async fn businesses_in_viewport(
        &self,
        south: f64,
        north: f64,
        west: f64,
        east: f64,
        limit: Option<u32>,
    ) -> Result<Vec<BusinessDto>> {
        InputValidator::validate_viewport(south, north, west, east)?;
        let limit = InputValidator::resolve_limit(
            limit,
            self.limits.default_viewport_limit,
            self.limits.max_viewport_limit,
        )?;

        let results = self
            .businesses
            .get_in_viewport(south, north, west, east, limit)
            .await?;
        Ok(results.into_iter().map(BusinessDto::from).collect())
    }

    /// Fuzzy multi-term search ranked by relevance
    pub async fn search_businesses(
        &self,
        query: &str,
        skip: u32,
        limit: Option<u32>,
    ) -> Result<Vec<BusinessDto>> {
        let limit = InputValidator::resolve_limit(
            limit,
            self.limits.default_search_limit,
            self.limits.max_search_limit,
        )?;

        debug!(query, skip, limit, "searching businesses");
        let results = self.businesses.search(query, skip, limit).await?;
        Ok(results.into_iter().map(BusinessDto::from).collect())
    }

    /// Reviews for a business, newest first. The business is resolved first
    /// so an unknown id fails with not-found rather than an empty list.
    pub async fn reviews_for_business(
        &self,
        business_id: &str,
        skip: u32,
        limit: Option<u32>,
    ) -> Result<Vec<ReviewDto>> {
        let limit = InputValidator::resolve_limit(
            limit,
            self.limits.default_review_limit,
            self.limits.max_review_limit,
        )?;
        self.require_business(business_id).await?;

        let results = self.reviews.get_by_business(business_id, skip, limit).await?;
        Ok(results.into_iter().map(ReviewDto::from).collect())
    }

    /// Photos for a business; unknown id fails with not-found
    pub async fn photos_for_business(&self, business_id: &str) -> Result<Vec<PhotoDto>> {
        self.require_business(business_id).await?;

        let results = self.businesses.get_photos_by_business(business_id).await?;
        Ok(results.into_iter().map(PhotoDto::from).collect())
    }

    /// Distinct state codes, alphabetical
    pub async fn get_states(&self) -> Result<Vec<String>> {
        self.businesses.get_states().await
    }

    /// Distinct cities within a state, alphabetical
    pub async fn get_cities(&self, state: &str) -> Result<Vec<String>> {
        let state = InputValidator::normalize_state(state)?;
        self.businesses.get_cities_by_state(&state).await
    }

    async fn require_business(&self, business_id: &str) -> Result<Business> {
        InputValidator::validate_business_id(business_id)?;
        self.businesses
            .get_by_id(business_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Business with ID '{business_id}' not found"))
            })
    }
}

/// Time-bucketed aggregation timelines and paired comparisons
pub struct AnalyticsService {
    reviews: Arc<dyn ReviewRepository>,
    businesses: Arc<dyn BusinessRepository>,
}

impl AnalyticsService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, businesses: Arc<dyn BusinessRepository>) -> Self {
        Self { reviews, businesses }
    }

    /// Ratings timeline for one business
    pub async fn business_ratings_timeline(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<BusinessTimeline> {
        let business = self.require_business(business_id).await?;

        let data = self
            .reviews
            .business_ratings_over_time(business_id, period, window)
            .await?;

        Ok(BusinessTimeline {
            business_id: business.business_id,
            business_name: business.name,
            period,
            metric: Metric::Rating,
            start_date: window.start,
            end_date: window.end,
            data: TimelineSeries::Ratings(data),
        })
    }

    /// Sentiment timeline for one business
    pub async fn business_sentiment_timeline(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<BusinessTimeline> {
        let business = self.require_business(business_id).await?;

        let data = self
            .reviews
            .business_sentiment_over_time(business_id, period, window)
            .await?;

        Ok(BusinessTimeline {
            business_id: business.business_id,
            business_name: business.name,
            period,
            metric: Metric::Sentiment,
            start_date: window.start,
            end_date: window.end,
            data: TimelineSeries::Sentiment(data),
        })
    }

    /// Ratings timeline across all businesses in a city
    pub async fn city_ratings_timeline(
        &self,
        state: &str,
        city: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<CityTimeline> {
        let state = InputValidator::normalize_state(state)?;
        InputValidator::validate_city(city)?;

        let data = self
            .reviews
            .city_ratings_over_time(city, &state, period, window)
            .await?;

        Ok(CityTimeline {
            city: city.to_string(),
            state,
            period,
            metric: Metric::Rating,
            start_date: window.start,
            end_date: window.end,
            data: RegionSeries::Ratings(data),
        })
    }

    /// Ratings timeline across all businesses in a state
    pub async fn state_ratings_timeline(
        &self,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<StateTimeline> {
        let state = InputValidator::normalize_state(state)?;

        let data = self
            .reviews
            .state_ratings_over_time(&state, period, window)
            .await?;

        Ok(StateTimeline {
            state,
            period,
            metric: Metric::Rating,
            start_date: window.start,
            end_date: window.end,
            data: RegionSeries::Ratings(data),
        })
    }

    /// Business vs city-average comparison. The business is resolved first;
    /// its stored city/state become the peer scope.
    pub async fn city_comparison(
        &self,
        business_id: &str,
        metric: Metric,
        period: Period,
        window: DateWindow,
    ) -> Result<CityComparison> {
        let business = self.require_business(business_id).await?;

        let (business_data, city_average) = match metric {
            Metric::Rating => {
                let (own, peer) = self
                    .reviews
                    .city_ratings_comparison(
                        business_id,
                        &business.city,
                        &business.state,
                        period,
                        window,
                    )
                    .await?;
                (RegionSeries::Ratings(own), RegionSeries::Ratings(peer))
            }
            Metric::Sentiment => {
                let (own, peer) = self
                    .reviews
                    .city_sentiment_comparison(
                        business_id,
                        &business.city,
                        &business.state,
                        period,
                        window,
                    )
                    .await?;
                (RegionSeries::Sentiment(own), RegionSeries::Sentiment(peer))
            }
        };

        Ok(CityComparison {
            business_id: business.business_id,
            business_name: business.name,
            city: business.city,
            state: business.state,
            period,
            metric,
            start_date: window.start,
            end_date: window.end,
            business_data,
            city_average,
        })
    }

    /// Business vs state-average comparison
    pub async fn state_comparison(
        &self,
        business_id: &str,
        metric: Metric,
        period: Period,
        window: DateWindow,
    ) -> Result<StateComparison> {
        let business = self.require_business(business_id).await?;

        let (business_data, state_average) = match metric {
            Metric::Rating => {
                let (own, peer) = self
                    .reviews
                    .state_ratings_comparison(business_id, &business.state, period, window)
                    .await?;
                (RegionSeries::Ratings(own), RegionSeries::Ratings(peer))
            }
            Metric::Sentiment => {
                let (own, peer) = self
                    .reviews
                    .state_sentiment_comparison(business_id, &business.state, period, window)
                    .await?;
                (RegionSeries::Sentiment(own), RegionSeries::Sentiment(peer))
            }
        };

        Ok(StateComparison {
            business_id: business.business_id,
            business_name: business.name,
            state: business.state,
            period,
            metric,
            start_date: window.start,
            end_date: window.end,
            business_data,
            state_average,
        })
    }

    async fn require_business(&self, business_id: &str) -> Result<Business> {
        InputValidator::validate_business_id(business_id)?;
        self.businesses
            .get_by_id(business_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Business with ID '{business_id}' not found"))
            })
    }
}
