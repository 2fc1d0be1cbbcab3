//! Trigram similarity and search-ranking primitives
//!
//! Implements the pg_trgm similarity measure as a deterministic SQLite scalar
//! function, plus the query-cleaning helper and the relevance weights used by
//! the search SQL. The weights are load-bearing for result ordering and must
//! not be tuned without versioning the API.

use std::collections::HashSet;

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

/// Minimum trigram similarity for a fuzzy term match
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Bonus when the lowercased name equals the whole query
pub const EXACT_NAME_BONUS: f64 = 100.0;
/// Bonus when the lowercased city equals the whole query
pub const EXACT_CITY_BONUS: f64 = 90.0;
/// Bonus when the lowercased state equals the whole query
pub const EXACT_STATE_BONUS: f64 = 85.0;

/// Weight applied to name similarity against the whole query
pub const SIMILARITY_NAME_WEIGHT: f64 = 50.0;
/// Weight applied to city similarity against the whole query
pub const SIMILARITY_CITY_WEIGHT: f64 = 40.0;
/// Weight applied to categories similarity against the whole query
pub const SIMILARITY_CATEGORIES_WEIGHT: f64 = 30.0;

/// Bonus when the name contains the whole query
pub const CONTAINS_NAME_BONUS: f64 = 20.0;
/// Bonus when the city contains the whole query
pub const CONTAINS_CITY_BONUS: f64 = 15.0;
/// Bonus when the categories contain the whole query
pub const CONTAINS_CATEGORIES_BONUS: f64 = 10.0;

/// Normalize a raw search query: trim and lowercase.
///
/// Terms are obtained by splitting the result on whitespace; the cleaned
/// string itself is what exact-match and containment bonuses compare against.
#[must_use]
pub fn clean_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Extract the trigram set of a string the way pg_trgm does: case-fold,
/// split into alphanumeric words, pad each word with two leading and one
/// trailing space, then collect character 3-grams.
fn trigrams(text: &str) -> HashSet<(char, char, char)> {
    let mut grams = HashSet::new();
    let lowered = text.to_lowercase();

    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut padded: Vec<char> = Vec::with_capacity(word.len() + 3);
        padded.push(' ');
        padded.push(' ');
        padded.extend(word.chars());
        padded.push(' ');

        for window in padded.windows(3) {
            grams.insert((window[0], window[1], window[2]));
        }
    }

    grams
}

/// Trigram similarity of two strings: |A ∩ B| / |A ∪ B|, in [0, 1].
///
/// Returns 0.0 when either side contributes no trigrams, matching pg_trgm.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let total = left.len() + right.len() - shared;
    if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            shared as f64 / total as f64
        }
    }
}

fn similarity_udf(ctx: &Context) -> rusqlite::Result<Option<f64>> {
    let a: Option<String> = ctx.get(0)?;
    let b: Option<String> = ctx.get(1)?;
    Ok(match (a, b) {
        (Some(a), Some(b)) => Some(similarity(&a, &b)),
        _ => None,
    })
}

/// Register the `similarity(a, b)` scalar function on a connection.
///
/// Must run on every pooled connection before any search SQL executes; the
/// pool initializer is the right place.
pub fn register_similarity(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        similarity_udf,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query_trims_and_lowercases() {
        assert_eq!(clean_query("  Philadelphia Italian "), "philadelphia italian");
        assert_eq!(clean_query("PIZZA"), "pizza");
    }

    #[test]
    fn test_trigrams_pad_each_word() {
        let grams = trigrams("cat");
        assert_eq!(grams.len(), 4);
        assert!(grams.contains(&(' ', ' ', 'c')));
        assert!(grams.contains(&(' ', 'c', 'a')));
        assert!(grams.contains(&('c', 'a', 't')));
        assert!(grams.contains(&('a', 't', ' ')));
    }

    #[test]
    fn test_trigrams_split_on_non_alphanumeric() {
        assert_eq!(trigrams("a-b"), trigrams("a b"));
    }

    #[test]
    fn test_similarity_identical_strings() {
        assert!((similarity("pizza", "pizza") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_is_case_insensitive() {
        assert!((similarity("Pizza", "pizza") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_disjoint_strings() {
        assert!(similarity("pizza", "sushi") < 0.1);
    }

    #[test]
    fn test_similarity_tolerates_typos() {
        // "Philadelfia" shares 9 of 15 combined trigrams with "Philadelphia"
        let score = similarity("philadelfia", "philadelphia");
        assert!(score > SIMILARITY_THRESHOLD, "score was {score}");
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_empty_input_is_zero() {
        assert!((similarity("", "pizza")).abs() < f64::EPSILON);
        assert!((similarity("", "")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_symmetry() {
        let ab = similarity("coffee shop", "cofee shop");
        let ba = similarity("cofee shop", "coffee shop");
        assert!((ab - ba).abs() < f64::EPSILON);
    }

    #[test]
    fn test_registered_function_matches_rust_side() {
        let conn = Connection::open_in_memory().unwrap();
        register_similarity(&conn).unwrap();

        let from_sql: f64 = conn
            .query_row(
                "SELECT similarity('philadelfia', 'philadelphia')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!((from_sql - similarity("philadelfia", "philadelphia")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_registered_function_null_propagates() {
        let conn = Connection::open_in_memory().unwrap();
        register_similarity(&conn).unwrap();

        let from_sql: Option<f64> = conn
            .query_row("SELECT similarity(NULL, 'pizza')", [], |row| row.get(0))
            .unwrap();

        assert!(from_sql.is_none());
    }
}
