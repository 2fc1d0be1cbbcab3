//! Review Pulse - Business Review Analytics API
//!
//! A read-only analytics API over a business/review/photo dataset. Clients
//! query businesses by id, region, geographic viewport, or fuzzy text search,
//! and pull time-bucketed rating/sentiment aggregates per business, city, or
//! state, optionally compared against a peer average.
//!
//! # Features
//!
//! - Business lookup, listing, and viewport queries
//! - Multi-term fuzzy search with trigram-based relevance ranking
//! - Day/week/month/year rating and sentiment timelines
//! - Business-vs-city and business-vs-state paired comparisons

/// Configuration management
pub mod config;
/// Database connection pooling and migrations
pub mod db;
/// Error taxonomy and HTTP mapping
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and API payloads
pub mod models;
/// Repository pattern for data access
pub mod repository;
/// HTTP routes and server startup
pub mod routes;
/// Database schema definitions
pub mod schema;
/// Trigram similarity and search ranking primitives
pub mod search;
/// Service layer orchestration
pub mod service;
/// Shared application state
pub mod state;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use config::AppConfig;
pub use db::Database;
pub use error::{ApiError, Result};
