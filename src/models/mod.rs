use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier for a catalog item, either a numeric provider ID or an opaque string key
///
/// Numeric-looking strings are normalized to `Numeric` so `"19995"` and `19995`
/// resolve to the same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawItemId")]
pub enum ItemId {
    /// Numeric ID (e.g., a TMDB movie ID such as 19995)
    Numeric(u64),
    /// Any other opaque key
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Num(u64),
    Str(String),
}

impl From<RawItemId> for ItemId {
    fn from(raw: RawItemId) -> Self {
        match raw {
            RawItemId::Num(id) => ItemId::Numeric(id),
            RawItemId::Str(s) => ItemId::parse(&s),
        }
    }
}

impl ItemId {
    /// Parses a path or query segment into an item ID
    ///
    /// Only the canonical decimal form becomes `Numeric`; `"007"` and `"+7"` stay
    /// opaque text keys distinct from `7`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(id) if id.to_string() == trimmed => ItemId::Numeric(id),
            _ => ItemId::Text(trimmed.to_string()),
        }
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId::Numeric(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::parse(id)
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Numeric(id) => write!(f, "{}", id),
            ItemId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A recommendable catalog entry
///
/// `index` is the item's row in the similarity matrix and always equals its
/// position in the catalog.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub index: usize,
}

/// One row of the persisted item table
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "movie_id")]
    pub id: ItemId,
    pub title: String,
}

/// An item index paired with its similarity to the seed item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f64,
}

/// Movie details as reported by a metadata provider, before truncation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub rating: Option<f64>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub poster_url: Option<String>,
}

/// Metadata attached to a recommendation when the provider answered in time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieMetadata {
    pub rating: Option<f64>,
    pub release_date: Option<String>,
    /// Truncated synopsis, or the "no overview" placeholder
    pub overview: String,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub poster_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Why metadata could not be attached to a recommendation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The single provider call exceeded its timeout
    Timeout,
    /// Connection or other transport failure
    Transport,
    /// Provider answered with a non-success status
    UpstreamStatus,
    /// Provider answered with a body we could not decode
    MalformedPayload,
    /// The batch deadline passed before this fetch completed
    DeadlineExceeded,
    /// The fetch task panicked or was cancelled
    TaskFailed,
}

impl Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            UnavailableReason::Timeout => "timeout",
            UnavailableReason::Transport => "transport",
            UnavailableReason::UpstreamStatus => "upstream_status",
            UnavailableReason::MalformedPayload => "malformed_payload",
            UnavailableReason::DeadlineExceeded => "deadline_exceeded",
            UnavailableReason::TaskFailed => "task_failed",
        };
        write!(f, "{}", reason)
    }
}

/// Outcome of enriching one candidate: fully live or fully unavailable
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataResult {
    Available(MovieMetadata),
    Unavailable { reason: UnavailableReason },
}

impl MetadataResult {
    pub fn unavailable(reason: UnavailableReason) -> Self {
        MetadataResult::Unavailable { reason }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MetadataResult::Available(_))
    }
}

/// A ranked recommendation with its enrichment outcome
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedRecommendation {
    #[serde(flatten)]
    pub item: Item,
    pub similarity_score: f64,
    pub metadata: MetadataResult,
}

/// Response for a single recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    /// The item recommendations were computed for
    pub input: Item,
    /// Every catalog item the request resolved to, in catalog order.
    /// `input` is always the first entry.
    pub matches: Vec<Item>,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub count: usize,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// API response from GET /movie/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display_numeric() {
        let id = ItemId::Numeric(19995);
        assert_eq!(format!("{}", id), "19995");
    }

    #[test]
    fn test_item_id_display_text() {
        let id = ItemId::Text("avatar-2009".to_string());
        assert_eq!(format!("{}", id), "avatar-2009");
    }

    #[test]
    fn test_item_id_numeric_string_normalizes() {
        let from_number: ItemId = serde_json::from_str("19995").unwrap();
        let from_string: ItemId = serde_json::from_str(r#""19995""#).unwrap();
        assert_eq!(from_number, ItemId::Numeric(19995));
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn test_item_id_non_canonical_numbers_stay_text() {
        assert_eq!(ItemId::parse("007"), ItemId::Text("007".to_string()));
        assert_eq!(ItemId::parse("+7"), ItemId::Text("+7".to_string()));
        assert_eq!(ItemId::parse(" 7 "), ItemId::Numeric(7));
        assert_eq!(ItemId::parse("0"), ItemId::Numeric(0));

        let padded: ItemId = serde_json::from_str(r#""007""#).unwrap();
        assert_eq!(format!("{}", padded), "007");
        assert_ne!(padded, ItemId::Numeric(7));
    }

    #[test]
    fn test_item_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&ItemId::Numeric(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&ItemId::Text("a".to_string())).unwrap(),
            r#""a""#
        );
    }

    #[test]
    fn test_catalog_record_accepts_movie_id_alias() {
        let record: CatalogRecord =
            serde_json::from_str(r#"{"movie_id": 285, "title": "Pirates"}"#).unwrap();
        assert_eq!(record.id, ItemId::Numeric(285));
        assert_eq!(record.title, "Pirates");
    }

    #[test]
    fn test_unavailable_metadata_is_tagged() {
        let result = MetadataResult::unavailable(UnavailableReason::Timeout);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "timeout");
    }

    #[test]
    fn test_enriched_recommendation_flattens_item() {
        let rec = EnrichedRecommendation {
            item: Item {
                id: ItemId::Numeric(1),
                title: "Heat".to_string(),
                index: 3,
            },
            similarity_score: 0.5,
            metadata: MetadataResult::unavailable(UnavailableReason::DeadlineExceeded),
        };

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Heat");
        assert_eq!(json["index"], 3);
        assert_eq!(json["metadata"]["status"], "unavailable");
        assert_eq!(json["metadata"]["reason"], "deadline_exceeded");
    }

    #[test]
    fn test_tmdb_movie_tolerates_missing_fields() {
        let movie: TmdbMovie = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(movie.vote_average.is_none());
        assert!(movie.genres.is_empty());
    }
}
