//! Identification history domain models.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{FlutterlogError, Result};

/// Lowest accepted confidence score (percent).
/// Offset-less ISO-8601 layouts, read as UTC.
const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub const MIN_CONFIDENCE: f64 = 0.0;
/// Highest accepted confidence score (percent).
pub const MAX_CONFIDENCE: f64 = 100.0;

/// One logged observation of a butterfly species.
///
/// Serialized with the camelCase field names shared by the persisted layout
/// and the export file. `location` and `notes` are omitted when absent.
/// The timestamp is kept as the original ISO-8601 string so that a
/// load/persist cycle reproduces it byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationRecord {
    /// Unique record identifier within one user's collection
    pub id: String,
    /// Species label as produced by the classifier
    pub species: String,
    /// Confidence score in percent, within [0, 100]
    pub confidence: f64,
    /// Creation time (ISO 8601 format)
    pub timestamp: String,
    /// Free-text location of the sighting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Reference to the displayed image
    pub image_url: String,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether the identification has been confirmed
    #[serde(default)]
    pub verified: bool,
}

impl IdentificationRecord {
    /// Creates an unverified record with a fresh UUID and the current UTC time.
    pub fn new(species: impl Into<String>, confidence: f64, image_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            species: species.into(),
            confidence,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            location: None,
            image_url: image_url.into(),
            notes: None,
            verified: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Parses the stored timestamp.
    ///
    /// Accepts RFC 3339 as well as ISO-8601 date-times without an offset
    /// (`2025-01-15T10:30:00`, `2025-01-15T10:30`) and plain dates, which are
    /// read as UTC. Returns `None` for anything else.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(parsed);
        }
        LOCAL_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&self.timestamp, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(&self.timestamp, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc().fixed_offset())
    }

    /// Checks the field invariants of a record before it enters a collection.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(FlutterlogError::InvalidRecord(
                "id must not be empty".to_string(),
            ));
        }
        if self.species.trim().is_empty() {
            return Err(FlutterlogError::InvalidRecord(format!(
                "record '{}' has an empty species",
                self.id
            )));
        }
        if !is_valid_confidence(self.confidence) {
            return Err(FlutterlogError::InvalidRecord(format!(
                "record '{}' has confidence {} outside [{}, {}]",
                self.id, self.confidence, MIN_CONFIDENCE, MAX_CONFIDENCE
            )));
        }
        if self.parsed_timestamp().is_none() {
            return Err(FlutterlogError::InvalidRecord(format!(
                "record '{}' has a non ISO-8601 timestamp '{}'",
                self.id, self.timestamp
            )));
        }
        Ok(())
    }
}

/// Returns true when `value` is a finite percentage.
pub fn is_valid_confidence(value: f64) -> bool {
    value.is_finite() && (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&value)
}

/// Verification-state filter for history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    /// Every record
    #[default]
    All,
    /// Only records with `verified == true`
    Verified,
    /// Only records with `verified == false`
    Unverified,
}

impl HistoryFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Verified => "verified",
            Self::Unverified => "unverified",
        }
    }

    /// Returns true when `record` belongs in this view.
    pub fn matches(&self, record: &IdentificationRecord) -> bool {
        match self {
            Self::All => true,
            Self::Verified => record.verified,
            Self::Unverified => !record.verified,
        }
    }
}

impl fmt::Display for HistoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryFilter {
    type Err = FlutterlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "verified" => Ok(Self::Verified),
            "unverified" => Ok(Self::Unverified),
            other => Err(FlutterlogError::config(format!(
                "unknown history filter '{}' (expected all, verified or unverified)",
                other
            ))),
        }
    }
}

/// Ordering applied to a history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recent first
    #[default]
    Date,
    /// Highest confidence first
    Confidence,
    /// Species name A-Z, case-insensitive
    Species,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Confidence => "confidence",
            Self::Species => "species",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = FlutterlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(Self::Date),
            "confidence" => Ok(Self::Confidence),
            "species" => Ok(Self::Species),
            other => Err(FlutterlogError::config(format!(
                "unknown sort key '{}' (expected date, confidence or species)",
                other
            ))),
        }
    }
}

/// Aggregate metrics over a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    /// Number of records
    pub total: usize,
    /// Number of distinct species labels (exact, case-sensitive)
    pub unique_species: usize,
    /// Number of verified records
    pub verified_count: usize,
    /// Mean confidence rounded to the nearest integer, 0 for an empty collection
    pub average_confidence: i64,
}
