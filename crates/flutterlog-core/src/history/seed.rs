//! Demonstration records for first-run seeding.

use super::model::IdentificationRecord;

/// File name suggested for history downloads.
pub const EXPORT_FILE_NAME: &str = "butterfly_identifications.json";

/// Three sample sightings shown to a new user before any real identification.
///
/// Seeding is opt-in: pass these to [`super::HistoryStore::seed_if_empty`].
pub fn demo_records() -> Vec<IdentificationRecord> {
    vec![
        IdentificationRecord {
            id: "1".to_string(),
            species: "MONARCH".to_string(),
            confidence: 94.2,
            timestamp: "2025-01-15T10:30:00Z".to_string(),
            location: Some("Central Park, NY".to_string()),
            image_url: "https://images.pexels.com/photos/326055/pexels-photo-326055.jpeg"
                .to_string(),
            notes: Some("Beautiful specimen spotted during morning walk".to_string()),
            verified: true,
        },
        IdentificationRecord {
            id: "2".to_string(),
            species: "BLUE MORPHO".to_string(),
            confidence: 87.6,
            timestamp: "2025-01-14T15:45:00Z".to_string(),
            location: Some("Butterfly Garden".to_string()),
            image_url: "https://images.pexels.com/photos/1805164/pexels-photo-1805164.jpeg"
                .to_string(),
            notes: None,
            verified: false,
        },
        IdentificationRecord {
            id: "3".to_string(),
            species: "PAINTED LADY".to_string(),
            confidence: 91.8,
            timestamp: "2025-01-13T09:15:00Z".to_string(),
            location: Some("Backyard Garden".to_string()),
            image_url: "https://images.pexels.com/photos/1805164/pexels-photo-1805164.jpeg"
                .to_string(),
            notes: None,
            verified: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_demo_records_are_valid_and_unique() {
        let records = demo_records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.validate().is_ok()));

        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());
    }
}
