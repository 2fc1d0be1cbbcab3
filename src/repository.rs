//! Repository layer: parameterized SQL against the review dataset
//!
//! All aggregation happens in SQL. Dynamic filters are assembled by pushing
//! fragments and boxed parameters; the synchronous rusqlite calls run on the
//! blocking thread pool so async callers never stall on a database round trip.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params_from_iter, OptionalExtension, Row, ToSql};
use tokio::task;

use crate::db::{Database, DbConnection};
use crate::error::{ApiError, Result};
use crate::metrics::{MetricsCollector, QueryTimer};
use crate::models::{
    Business, DateWindow, Period, Photo, RatingPoint, RegionRatingPoint, RegionSentimentPoint,
    Review, SentimentPoint,
};
use crate::schema::{businesses, photos, reviews};
use crate::search::{
    clean_query, CONTAINS_CATEGORIES_BONUS, CONTAINS_CITY_BONUS, CONTAINS_NAME_BONUS,
    EXACT_CITY_BONUS, EXACT_NAME_BONUS, EXACT_STATE_BONUS, SIMILARITY_CATEGORIES_WEIGHT,
    SIMILARITY_CITY_WEIGHT, SIMILARITY_NAME_WEIGHT, SIMILARITY_THRESHOLD,
};

/// Data access contract for businesses, regions, and photos
#[async_trait]
pub trait BusinessRepository: Send + Sync {
    /// Exact lookup by business identifier
    async fn get_by_id(&self, business_id: &str) -> Result<Option<Business>>;

    /// Paginated listing with optional state/city equality filters,
    /// ordered by stars then review_count descending
    async fn get_all(
        &self,
        state: Option<String>,
        city: Option<String>,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Business>>;

    /// Businesses inside an inclusive geographic bounding box
    async fn get_in_viewport(
        &self,
        south: f64,
        north: f64,
        west: f64,
        east: f64,
        limit: u32,
    ) -> Result<Vec<Business>>;

    /// Multi-term fuzzy search ranked by the relevance score
    async fn search(&self, query: &str, skip: u32, limit: u32) -> Result<Vec<Business>>;

    /// Distinct state codes, alphabetical
    async fn get_states(&self) -> Result<Vec<String>>;

    /// Distinct city names within a state, alphabetical
    async fn get_cities_by_state(&self, state: &str) -> Result<Vec<String>>;

    /// Photos attached to a business
    async fn get_photos_by_business(&self, business_id: &str) -> Result<Vec<Photo>>;
}

/// Data access contract for reviews and time-bucketed aggregations
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews for a business, newest first, paginated
    async fn get_by_business(
        &self,
        business_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Review>>;

    /// Per-bucket average star rating for one business
    async fn business_ratings_over_time(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RatingPoint>>;

    /// Per-bucket average sentiment scores for one business
    async fn business_sentiment_over_time(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<SentimentPoint>>;

    /// Per-bucket average rating across all businesses in a city
    async fn city_ratings_over_time(
        &self,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RegionRatingPoint>>;

    /// Per-bucket average rating across all businesses in a state
    async fn state_ratings_over_time(
        &self,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RegionRatingPoint>>;

    /// Business and city-average rating series in one UNION ALL round trip
    async fn city_ratings_comparison(
        &self,
        business_id: &str,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionRatingPoint>, Vec<RegionRatingPoint>)>;

    /// Business and state-average rating series in one UNION ALL round trip
    async fn state_ratings_comparison(
        &self,
        business_id: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionRatingPoint>, Vec<RegionRatingPoint>)>;

    /// Business and city-average sentiment series in one UNION ALL round trip
    async fn city_sentiment_comparison(
        &self,
        business_id: &str,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionSentimentPoint>, Vec<RegionSentimentPoint>)>;

    /// Business and state-average sentiment series in one UNION ALL round trip
    async fn state_sentiment_comparison(
        &self,
        business_id: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionSentimentPoint>, Vec<RegionSentimentPoint>)>;
}

/// SQLite-backed business repository
pub struct SqliteBusinessRepository {
    db: Arc<Database>,
    metrics: MetricsCollector,
}

impl SqliteBusinessRepository {
    pub fn new(db: Arc<Database>, metrics: MetricsCollector) -> Self {
        Self { db, metrics }
    }
}

/// SQLite-backed review repository
pub struct SqliteReviewRepository {
    db: Arc<Database>,
    metrics: MetricsCollector,
}

impl SqliteReviewRepository {
    pub fn new(db: Arc<Database>, metrics: MetricsCollector) -> Self {
        Self { db, metrics }
    }
}

/// Run a synchronous query closure on the blocking pool, recording its
/// outcome and duration under `operation`.
async fn run_query<T, F>(
    db: Arc<Database>,
    metrics: MetricsCollector,
    operation: &'static str,
    f: F,
) -> Result<T>
where
    F: FnOnce(&DbConnection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let timer = QueryTimer::new(metrics, operation);
    let result = task::spawn_blocking(move || {
        let conn = db.get_connection()?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Database task failed: {e}")))
    .and_then(|inner| inner);

    timer.finish(result.is_ok());
    result
}

/// SQL expression truncating a date column to the start of its bucket.
/// The bucket key is always the first calendar day of the bucket.
fn bucket_expr(period: Period, column: &str) -> String {
    match period {
        Period::Day => format!("date({column})"),
        // ISO week: step back within the week, then forward to Monday
        Period::Week => format!("date({column}, '-6 days', 'weekday 1')"),
        Period::Month => format!("date({column}, 'start of month')"),
        Period::Year => format!("date({column}, 'start of year')"),
    }
}

/// Append inclusive [start, end] date filters to a WHERE clause in progress
fn push_window(
    sql: &mut String,
    params: &mut Vec<Box<dyn ToSql + Send>>,
    column: &str,
    window: DateWindow,
) {
    if let Some(start) = window.start {
        sql.push_str(&format!(" AND {column} >= ?"));
        params.push(Box::new(start));
    }
    if let Some(end) = window.end {
        sql.push_str(&format!(" AND {column} <= ?"));
        params.push(Box::new(end));
    }
}

#[async_trait]
impl BusinessRepository for SqliteBusinessRepository {
    async fn get_by_id(&self, business_id: &str) -> Result<Option<Business>> {
        let business_id = business_id.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_get_by_id",
            move |conn| {
                let business = conn
                    .query_row(
                        &format!(
                            "SELECT * FROM {} WHERE {} = ?",
                            businesses::TABLE,
                            businesses::BUSINESS_ID
                        ),
                        [&business_id],
                        map_business,
                    )
                    .optional()?;
                Ok(business)
            },
        )
        .await
    }

    async fn get_all(
        &self,
        state: Option<String>,
        city: Option<String>,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Business>> {
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_list",
            move |conn| {
                let mut sql = format!("SELECT * FROM {} WHERE 1=1", businesses::TABLE);
                let mut params: Vec<Box<dyn ToSql + Send>> = Vec::new();

                if let Some(state) = state {
                    sql.push_str(&format!(" AND {} = ?", businesses::STATE));
                    params.push(Box::new(state));
                }
                if let Some(city) = city {
                    sql.push_str(&format!(" AND {} = ?", businesses::CITY));
                    params.push(Box::new(city));
                }

                sql.push_str(&format!(
                    " ORDER BY {} DESC, {} DESC LIMIT ? OFFSET ?",
                    businesses::STARS,
                    businesses::REVIEW_COUNT
                ));
                params.push(Box::new(i64::from(limit)));
                params.push(Box::new(i64::from(skip)));

                collect_businesses(conn, &sql, &params)
            },
        )
        .await
    }

    async fn get_in_viewport(
        &self,
        south: f64,
        north: f64,
        west: f64,
        east: f64,
        limit: u32,
    ) -> Result<Vec<Business>> {
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_viewport",
            move |conn| {
                let sql = format!(
                    "SELECT * FROM {table} \
                     WHERE {lat} >= ? AND {lat} <= ? AND {lon} >= ? AND {lon} <= ? \
                     ORDER BY {stars} DESC, {count} DESC LIMIT ?",
                    table = businesses::TABLE,
                    lat = businesses::LATITUDE,
                    lon = businesses::LONGITUDE,
                    stars = businesses::STARS,
                    count = businesses::REVIEW_COUNT
                );
                let params: Vec<Box<dyn ToSql + Send>> = vec![
                    Box::new(south),
                    Box::new(north),
                    Box::new(west),
                    Box::new(east),
                    Box::new(i64::from(limit)),
                ];

                collect_businesses(conn, &sql, &params)
            },
        )
        .await
    }

    async fn search(&self, query: &str, skip: u32, limit: u32) -> Result<Vec<Business>> {
        let cleaned = clean_query(query);
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_search",
            move |conn| {
                let (sql, params) = build_search_query(&cleaned, skip, limit);
                collect_businesses(conn, &sql, &params)
            },
        )
        .await
    }

    async fn get_states(&self) -> Result<Vec<String>> {
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "location_states",
            move |conn| {
                let sql = format!(
                    "SELECT DISTINCT {col} FROM {table} ORDER BY {col}",
                    col = businesses::STATE,
                    table = businesses::TABLE
                );
                let mut stmt = conn.prepare(&sql)?;
                let state_iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut results = Vec::new();
                for state in state_iter {
                    results.push(state?);
                }
                Ok(results)
            },
        )
        .await
    }

    async fn get_cities_by_state(&self, state: &str) -> Result<Vec<String>> {
        let state = state.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "location_cities",
            move |conn| {
                let sql = format!(
                    "SELECT DISTINCT {city} FROM {table} WHERE {state} = ? ORDER BY {city}",
                    city = businesses::CITY,
                    table = businesses::TABLE,
                    state = businesses::STATE
                );
                let mut stmt = conn.prepare(&sql)?;
                let city_iter = stmt.query_map([&state], |row| row.get::<_, String>(0))?;

                let mut results = Vec::new();
                for city in city_iter {
                    results.push(city?);
                }
                Ok(results)
            },
        )
        .await
    }

    async fn get_photos_by_business(&self, business_id: &str) -> Result<Vec<Photo>> {
        let business_id = business_id.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "photos_by_business",
            move |conn| {
                let sql = format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {}",
                    photos::TABLE,
                    photos::BUSINESS_ID,
                    photos::PHOTO_ID
                );
                let mut stmt = conn.prepare(&sql)?;
                let photo_iter = stmt.query_map([&business_id], map_photo)?;

                let mut results = Vec::new();
                for photo in photo_iter {
                    results.push(photo?);
                }
                Ok(results)
            },
        )
        .await
    }
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepository {
    async fn get_by_business(
        &self,
        business_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Review>> {
        let business_id = business_id.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "reviews_by_business",
            move |conn| {
                let sql = format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT ? OFFSET ?",
                    reviews::TABLE,
                    reviews::BUSINESS_ID,
                    reviews::DATE
                );
                let params: Vec<Box<dyn ToSql + Send>> = vec![
                    Box::new(business_id),
                    Box::new(i64::from(limit)),
                    Box::new(i64::from(skip)),
                ];

                let mut stmt = conn.prepare(&sql)?;
                let review_iter = stmt.query_map(params_from_iter(params.iter()), map_review)?;

                let mut results = Vec::new();
                for review in review_iter {
                    results.push(review?);
                }
                Ok(results)
            },
        )
        .await
    }

    async fn business_ratings_over_time(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RatingPoint>> {
        let business_id = business_id.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_ratings_timeline",
            move |conn| {
                let bucket = bucket_expr(period, reviews::DATE);
                let mut sql = format!(
                    "SELECT {bucket} AS period_start, \
                            AVG({stars}) AS avg_rating, \
                            COUNT({id}) AS review_count \
                     FROM {table} WHERE {bid} = ?",
                    stars = reviews::STARS,
                    id = reviews::REVIEW_ID,
                    table = reviews::TABLE,
                    bid = reviews::BUSINESS_ID
                );
                let mut params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(business_id)];
                push_window(&mut sql, &mut params, reviews::DATE, window);
                sql.push_str(" GROUP BY period_start ORDER BY period_start");

                let mut stmt = conn.prepare(&sql)?;
                let point_iter =
                    stmt.query_map(params_from_iter(params.iter()), map_rating_point)?;

                let mut results = Vec::new();
                for point in point_iter {
                    results.push(point?);
                }
                Ok(results)
            },
        )
        .await
    }

    async fn business_sentiment_over_time(
        &self,
        business_id: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<SentimentPoint>> {
        let business_id = business_id.to_string();
        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "business_sentiment_timeline",
            move |conn| {
                let bucket = bucket_expr(period, reviews::DATE);
                let mut sql = format!(
                    "SELECT {bucket} AS period_start, \
                            AVG({prob_diff}) AS avg_sentiment_score, \
                            AVG({expected}) AS avg_sentiment_expected, \
                            COUNT({id}) AS review_count \
                     FROM {table} WHERE {bid} = ?",
                    prob_diff = reviews::SENTIMENT_SCORE_PROB_DIFF,
                    expected = reviews::SENTIMENT_SCORE_EXPECTED,
                    id = reviews::REVIEW_ID,
                    table = reviews::TABLE,
                    bid = reviews::BUSINESS_ID
                );
                let mut params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(business_id)];
                push_window(&mut sql, &mut params, reviews::DATE, window);
                sql.push_str(" GROUP BY period_start ORDER BY period_start");

                let mut stmt = conn.prepare(&sql)?;
                let point_iter =
                    stmt.query_map(params_from_iter(params.iter()), map_sentiment_point)?;

                let mut results = Vec::new();
                for point in point_iter {
                    results.push(point?);
                }
                Ok(results)
            },
        )
        .await
    }

    async fn city_ratings_over_time(
        &self,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RegionRatingPoint>> {
        let mut sql = region_ratings_select(period);
        sql.push_str(&format!(
            " WHERE b.{} = ? AND b.{} = ?",
            businesses::CITY,
            businesses::STATE
        ));
        let mut params: Vec<Box<dyn ToSql + Send>> =
            vec![Box::new(city.to_string()), Box::new(state.to_string())];
        let date_col = format!("r.{}", reviews::DATE);
        push_window(&mut sql, &mut params, &date_col, window);
        sql.push_str(" GROUP BY period_start ORDER BY period_start");

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "city_ratings_timeline",
            move |conn| collect_region_rating_points(conn, &sql, &params),
        )
        .await
    }

    async fn state_ratings_over_time(
        &self,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<Vec<RegionRatingPoint>> {
        let mut sql = region_ratings_select(period);
        sql.push_str(&format!(" WHERE b.{} = ?", businesses::STATE));
        let mut params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(state.to_string())];
        let date_col = format!("r.{}", reviews::DATE);
        push_window(&mut sql, &mut params, &date_col, window);
        sql.push_str(" GROUP BY period_start ORDER BY period_start");

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "state_ratings_timeline",
            move |conn| collect_region_rating_points(conn, &sql, &params),
        )
        .await
    }

    async fn city_ratings_comparison(
        &self,
        business_id: &str,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionRatingPoint>, Vec<RegionRatingPoint>)> {
        let peer_filter = format!(
            "b.{} = ? AND b.{} = ?",
            businesses::CITY,
            businesses::STATE
        );
        let peer_params: Vec<Box<dyn ToSql + Send>> =
            vec![Box::new(city.to_string()), Box::new(state.to_string())];
        let (sql, params) =
            build_ratings_comparison(business_id, &peer_filter, peer_params, period, window);

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "city_ratings_comparison",
            move |conn| split_rating_rows(conn, &sql, &params),
        )
        .await
    }

    async fn state_ratings_comparison(
        &self,
        business_id: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionRatingPoint>, Vec<RegionRatingPoint>)> {
        let peer_filter = format!("b.{} = ?", businesses::STATE);
        let peer_params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(state.to_string())];
        let (sql, params) =
            build_ratings_comparison(business_id, &peer_filter, peer_params, period, window);

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "state_ratings_comparison",
            move |conn| split_rating_rows(conn, &sql, &params),
        )
        .await
    }

    async fn city_sentiment_comparison(
        &self,
        business_id: &str,
        city: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionSentimentPoint>, Vec<RegionSentimentPoint>)> {
        let peer_filter = format!(
            "b.{} = ? AND b.{} = ?",
            businesses::CITY,
            businesses::STATE
        );
        let peer_params: Vec<Box<dyn ToSql + Send>> =
            vec![Box::new(city.to_string()), Box::new(state.to_string())];
        let (sql, params) =
            build_sentiment_comparison(business_id, &peer_filter, peer_params, period, window);

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "city_sentiment_comparison",
            move |conn| split_sentiment_rows(conn, &sql, &params),
        )
        .await
    }

    async fn state_sentiment_comparison(
        &self,
        business_id: &str,
        state: &str,
        period: Period,
        window: DateWindow,
    ) -> Result<(Vec<RegionSentimentPoint>, Vec<RegionSentimentPoint>)> {
        let peer_filter = format!("b.{} = ?", businesses::STATE);
        let peer_params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(state.to_string())];
        let (sql, params) =
            build_sentiment_comparison(business_id, &peer_filter, peer_params, period, window);

        run_query(
            Arc::clone(&self.db),
            self.metrics,
            "state_sentiment_comparison",
            move |conn| split_sentiment_rows(conn, &sql, &params),
        )
        .await
    }
}

/// Ranked search over name/city/state/categories: any term may match by
/// containment or trigram similarity; the relevance score orders results.
fn build_search_query(cleaned: &str, skip: u32, limit: u32) -> (String, Vec<Box<dyn ToSql + Send>>) {
    let mut params: Vec<Box<dyn ToSql + Send>> = Vec::new();
    let whole_pattern = format!("%{cleaned}%");

    // Relevance: exact-match bonus (first matching field only), weighted
    // whole-query similarity, then a containment bonus (first field only)
    let relevance = format!(
        "(CASE WHEN lower({name}) = ? THEN {EXACT_NAME_BONUS} \
               WHEN lower({city}) = ? THEN {EXACT_CITY_BONUS} \
               WHEN lower({state}) = ? THEN {EXACT_STATE_BONUS} \
               ELSE 0 END \
         + COALESCE(similarity({name}, ?), 0) * {SIMILARITY_NAME_WEIGHT} \
         + COALESCE(similarity({city}, ?), 0) * {SIMILARITY_CITY_WEIGHT} \
         + COALESCE(similarity({categories}, ?), 0) * {SIMILARITY_CATEGORIES_WEIGHT} \
         + CASE WHEN {name} LIKE ? THEN {CONTAINS_NAME_BONUS} \
                WHEN {city} LIKE ? THEN {CONTAINS_CITY_BONUS} \
                WHEN {categories} LIKE ? THEN {CONTAINS_CATEGORIES_BONUS} \
                ELSE 0 END)",
        name = businesses::NAME,
        city = businesses::CITY,
        state = businesses::STATE,
        categories = businesses::CATEGORIES
    );
    for _ in 0..6 {
        params.push(Box::new(cleaned.to_string()));
    }
    for _ in 0..3 {
        params.push(Box::new(whole_pattern.clone()));
    }

    let mut sql = format!(
        "SELECT *, {relevance} AS relevance FROM {} WHERE ",
        businesses::TABLE
    );

    let terms: Vec<&str> = cleaned.split_whitespace().collect();
    if terms.is_empty() {
        // Cleaning removed everything; the filter degenerates to match-all
        sql.push_str("1=1");
    } else {
        let term_condition = format!(
            "({name} LIKE ? OR {city} LIKE ? OR {state} LIKE ? OR {categories} LIKE ? \
             OR similarity({name}, ?) > {SIMILARITY_THRESHOLD} \
             OR similarity({city}, ?) > {SIMILARITY_THRESHOLD} \
             OR similarity({categories}, ?) > {SIMILARITY_THRESHOLD})",
            name = businesses::NAME,
            city = businesses::CITY,
            state = businesses::STATE,
            categories = businesses::CATEGORIES
        );
        let conditions: Vec<&str> = terms.iter().map(|_| term_condition.as_str()).collect();
        sql.push('(');
        sql.push_str(&conditions.join(" OR "));
        sql.push(')');

        for term in terms {
            let term_pattern = format!("%{term}%");
            for _ in 0..4 {
                params.push(Box::new(term_pattern.clone()));
            }
            for _ in 0..3 {
                params.push(Box::new(term.to_string()));
            }
        }
    }

    sql.push_str(&format!(
        " ORDER BY relevance DESC, {} DESC, {} DESC LIMIT ? OFFSET ?",
        businesses::STARS,
        businesses::REVIEW_COUNT
    ));
    params.push(Box::new(i64::from(limit)));
    params.push(Box::new(i64::from(skip)));

    (sql, params)
}

/// SELECT head shared by the city and state rating timelines
fn region_ratings_select(period: Period) -> String {
    let date_col = format!("r.{}", reviews::DATE);
    let bucket = bucket_expr(period, &date_col);
    format!(
        "SELECT {bucket} AS period_start, \
                AVG(r.{stars}) AS avg_rating, \
                COUNT(r.{id}) AS review_count, \
                COUNT(DISTINCT r.{bid}) AS business_count \
         FROM {rtable} r JOIN {btable} b ON r.{bid} = b.{b_id}",
        stars = reviews::STARS,
        id = reviews::REVIEW_ID,
        bid = reviews::BUSINESS_ID,
        rtable = reviews::TABLE,
        btable = businesses::TABLE,
        b_id = businesses::BUSINESS_ID
    )
}

/// Pair the business-scoped and peer-scoped rating aggregations with UNION
/// ALL, tagged by origin and ordered on the shared period axis.
fn build_ratings_comparison(
    business_id: &str,
    peer_filter: &str,
    peer_params: Vec<Box<dyn ToSql + Send>>,
    period: Period,
    window: DateWindow,
) -> (String, Vec<Box<dyn ToSql + Send>>) {
    let bucket = bucket_expr(period, reviews::DATE);
    let peer_date_col = format!("r.{}", reviews::DATE);
    let peer_bucket = bucket_expr(period, &peer_date_col);

    // The business side carries a synthetic business_count of 1 so both
    // series share one field set
    let mut business_sql = format!(
        "SELECT {bucket} AS period_start, \
                AVG({stars}) AS avg_rating, \
                COUNT({id}) AS review_count, \
                1 AS business_count, \
                'business' AS data_type \
         FROM {table} WHERE {bid} = ?",
        stars = reviews::STARS,
        id = reviews::REVIEW_ID,
        table = reviews::TABLE,
        bid = reviews::BUSINESS_ID
    );
    let mut params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(business_id.to_string())];
    push_window(&mut business_sql, &mut params, reviews::DATE, window);
    business_sql.push_str(" GROUP BY period_start");

    let mut peer_sql = format!(
        "SELECT {peer_bucket} AS period_start, \
                AVG(r.{stars}) AS avg_rating, \
                COUNT(r.{id}) AS review_count, \
                COUNT(DISTINCT r.{bid}) AS business_count, \
                'peer' AS data_type \
         FROM {rtable} r JOIN {btable} b ON r.{bid} = b.{b_id} \
         WHERE {peer_filter}",
        stars = reviews::STARS,
        id = reviews::REVIEW_ID,
        bid = reviews::BUSINESS_ID,
        rtable = reviews::TABLE,
        btable = businesses::TABLE,
        b_id = businesses::BUSINESS_ID
    );
    params.extend(peer_params);
    push_window(&mut peer_sql, &mut params, &peer_date_col, window);
    peer_sql.push_str(" GROUP BY period_start");

    let sql = format!("{business_sql} UNION ALL {peer_sql} ORDER BY period_start");
    (sql, params)
}

/// Sentiment flavor of [`build_ratings_comparison`]
fn build_sentiment_comparison(
    business_id: &str,
    peer_filter: &str,
    peer_params: Vec<Box<dyn ToSql + Send>>,
    period: Period,
    window: DateWindow,
) -> (String, Vec<Box<dyn ToSql + Send>>) {
    let bucket = bucket_expr(period, reviews::DATE);
    let peer_date_col = format!("r.{}", reviews::DATE);
    let peer_bucket = bucket_expr(period, &peer_date_col);

    let mut business_sql = format!(
        "SELECT {bucket} AS period_start, \
                AVG({prob_diff}) AS avg_sentiment_score, \
                AVG({expected}) AS avg_sentiment_expected, \
                COUNT({id}) AS review_count, \
                1 AS business_count, \
                'business' AS data_type \
         FROM {table} WHERE {bid} = ?",
        prob_diff = reviews::SENTIMENT_SCORE_PROB_DIFF,
        expected = reviews::SENTIMENT_SCORE_EXPECTED,
        id = reviews::REVIEW_ID,
        table = reviews::TABLE,
        bid = reviews::BUSINESS_ID
    );
    let mut params: Vec<Box<dyn ToSql + Send>> = vec![Box::new(business_id.to_string())];
    push_window(&mut business_sql, &mut params, reviews::DATE, window);
    business_sql.push_str(" GROUP BY period_start");

    let mut peer_sql = format!(
        "SELECT {peer_bucket} AS period_start, \
                AVG(r.{prob_diff}) AS avg_sentiment_score, \
                AVG(r.{expected}) AS avg_sentiment_expected, \
                COUNT(r.{id}) AS review_count, \
                COUNT(DISTINCT r.{bid}) AS business_count, \
                'peer' AS data_type \
         FROM {rtable} r JOIN {btable} b ON r.{bid} = b.{b_id} \
         WHERE {peer_filter}",
        prob_diff = reviews::SENTIMENT_SCORE_PROB_DIFF,
        expected = reviews::SENTIMENT_SCORE_EXPECTED,
        id = reviews::REVIEW_ID,
        bid = reviews::BUSINESS_ID,
        rtable = reviews::TABLE,
        btable = businesses::TABLE,
        b_id = businesses::BUSINESS_ID
    );
    params.extend(peer_params);
    push_window(&mut peer_sql, &mut params, &peer_date_col, window);
    peer_sql.push_str(" GROUP BY period_start");

    let sql = format!("{business_sql} UNION ALL {peer_sql} ORDER BY period_start");
    (sql, params)
}

fn collect_businesses(
    conn: &DbConnection,
    sql: &str,
    params: &[Box<dyn ToSql + Send>],
) -> Result<Vec<Business>> {
    let mut stmt = conn.prepare(sql)?;
    let business_iter = stmt.query_map(params_from_iter(params.iter()), map_business)?;

    let mut results = Vec::new();
    for business in business_iter {
        results.push(business?);
    }
    Ok(results)
}

fn collect_region_rating_points(
    conn: &DbConnection,
    sql: &str,
    params: &[Box<dyn ToSql + Send>],
) -> Result<Vec<RegionRatingPoint>> {
    let mut stmt = conn.prepare(sql)?;
    let point_iter = stmt.query_map(params_from_iter(params.iter()), map_region_rating_point)?;

    let mut results = Vec::new();
    for point in point_iter {
        results.push(point?);
    }
    Ok(results)
}

/// Run a tagged comparison query and split the rows back into the business
/// series and the peer series, both still in period order.
fn split_rating_rows(
    conn: &DbConnection,
    sql: &str,
    params: &[Box<dyn ToSql + Send>],
) -> Result<(Vec<RegionRatingPoint>, Vec<RegionRatingPoint>)> {
    let mut stmt = conn.prepare(sql)?;
    let row_iter = stmt.query_map(params_from_iter(params.iter()), |row| {
        let tag: String = row.get("data_type")?;
        Ok((tag, map_region_rating_point(row)?))
    })?;

    let mut business_data = Vec::new();
    let mut peer_data = Vec::new();
    for item in row_iter {
        let (tag, point) = item?;
        if tag == "business" {
            business_data.push(point);
        } else {
            peer_data.push(point);
        }
    }
    Ok((business_data, peer_data))
}

fn split_sentiment_rows(
    conn: &DbConnection,
    sql: &str,
    params: &[Box<dyn ToSql + Send>],
) -> Result<(Vec<RegionSentimentPoint>, Vec<RegionSentimentPoint>)> {
    let mut stmt = conn.prepare(sql)?;
    let row_iter = stmt.query_map(params_from_iter(params.iter()), |row| {
        let tag: String = row.get("data_type")?;
        Ok((tag, map_region_sentiment_point(row)?))
    })?;

    let mut business_data = Vec::new();
    let mut peer_data = Vec::new();
    for item in row_iter {
        let (tag, point) = item?;
        if tag == "business" {
            business_data.push(point);
        } else {
            peer_data.push(point);
        }
    }
    Ok((business_data, peer_data))
}

fn parse_json_map(raw: &str) -> rusqlite::Result<HashMap<String, String>> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Map a database row to a Business
fn map_business(row: &Row) -> rusqlite::Result<Business> {
    let attributes: String = row.get(businesses::ATTRIBUTES)?;
    let hours: String = row.get(businesses::HOURS)?;

    Ok(Business {
        business_id: row.get(businesses::BUSINESS_ID)?,
        name: row.get(businesses::NAME)?,
        city: row.get(businesses::CITY)?,
        state: row.get(businesses::STATE)?,
        latitude: row.get(businesses::LATITUDE)?,
        longitude: row.get(businesses::LONGITUDE)?,
        review_count: row.get(businesses::REVIEW_COUNT)?,
        stars: row.get(businesses::STARS)?,
        is_open: row.get(businesses::IS_OPEN)?,
        categories: row.get(businesses::CATEGORIES)?,
        attributes: parse_json_map(&attributes)?,
        hours: parse_json_map(&hours)?,
        photo_count: row.get(businesses::PHOTO_COUNT)?,
    })
}

/// Map a database row to a Review
fn map_review(row: &Row) -> rusqlite::Result<Review> {
    Ok(Review {
        review_id: row.get(reviews::REVIEW_ID)?,
        business_id: row.get(reviews::BUSINESS_ID)?,
        text: row.get(reviews::TEXT)?,
        stars: row.get(reviews::STARS)?,
        date: row.get(reviews::DATE)?,
        user_id: row.get(reviews::USER_ID)?,
        useful: row.get(reviews::USEFUL)?,
        funny: row.get(reviews::FUNNY)?,
        cool: row.get(reviews::COOL)?,
        sentiment_label: row.get(reviews::SENTIMENT_LABEL)?,
        sentiment_confidence: row.get(reviews::SENTIMENT_CONFIDENCE)?,
        prob_negative: row.get(reviews::PROB_NEGATIVE)?,
        prob_neutral: row.get(reviews::PROB_NEUTRAL)?,
        prob_positive: row.get(reviews::PROB_POSITIVE)?,
        sentiment_score_prob_diff: row.get(reviews::SENTIMENT_SCORE_PROB_DIFF)?,
        sentiment_score_expected: row.get(reviews::SENTIMENT_SCORE_EXPECTED)?,
        sentiment_score_logit: row.get(reviews::SENTIMENT_SCORE_LOGIT)?,
    })
}

/// Map a database row to a Photo
fn map_photo(row: &Row) -> rusqlite::Result<Photo> {
    Ok(Photo {
        photo_id: row.get(photos::PHOTO_ID)?,
        business_id: row.get(photos::BUSINESS_ID)?,
        label: row.get(photos::LABEL)?,
    })
}

fn map_rating_point(row: &Row) -> rusqlite::Result<RatingPoint> {
    Ok(RatingPoint {
        period_start: row.get("period_start")?,
        avg_rating: row.get::<_, Option<f64>>("avg_rating")?.unwrap_or(0.0),
        review_count: row.get("review_count")?,
    })
}

fn map_sentiment_point(row: &Row) -> rusqlite::Result<SentimentPoint> {
    Ok(SentimentPoint {
        period_start: row.get("period_start")?,
        avg_sentiment_score: row
            .get::<_, Option<f64>>("avg_sentiment_score")?
            .unwrap_or(0.0),
        avg_sentiment_expected: row
            .get::<_, Option<f64>>("avg_sentiment_expected")?
            .unwrap_or(0.0),
        review_count: row.get("review_count")?,
    })
}

fn map_region_rating_point(row: &Row) -> rusqlite::Result<RegionRatingPoint> {
    Ok(RegionRatingPoint {
        period_start: row.get("period_start")?,
        avg_rating: row.get::<_, Option<f64>>("avg_rating")?.unwrap_or(0.0),
        review_count: row.get("review_count")?,
        business_count: row.get("business_count")?,
    })
}

fn map_region_sentiment_point(row: &Row) -> rusqlite::Result<RegionSentimentPoint> {
    Ok(RegionSentimentPoint {
        period_start: row.get("period_start")?,
        avg_sentiment_score: row
            .get::<_, Option<f64>>("avg_sentiment_score")?
            .unwrap_or(0.0),
        avg_sentiment_expected: row
            .get::<_, Option<f64>>("avg_sentiment_expected")?
            .unwrap_or(0.0),
        review_count: row.get("review_count")?,
        business_count: row.get("business_count")?,
    })
}
