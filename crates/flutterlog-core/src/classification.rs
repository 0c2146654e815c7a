//! Classifier output contract.
//!
//! The classifier itself lives outside this crate. These types describe what
//! it hands over (ranked predictions plus a processing time) and how a result
//! becomes a history record.

use serde::{Deserialize, Serialize};

use crate::error::{FlutterlogError, Result};
use crate::history::{IdentificationRecord, is_valid_confidence};

/// A single (species, confidence) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub species: String,
    /// Confidence in percent, within [0, 100]
    pub confidence: f64,
}

impl Prediction {
    pub fn new(species: impl Into<String>, confidence: f64) -> Self {
        Self {
            species: species.into(),
            confidence,
        }
    }
}

/// Ranked classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Ranked predictions, normally most confident first
    pub predictions: Vec<Prediction>,
    /// Wall-clock processing time in seconds
    pub processing_time: f64,
}

impl ClassificationResult {
    /// Returns the most confident prediction. Ties go to the earlier one, so a
    /// correctly ranked result yields its first element.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions
            .iter()
            .reduce(|best, next| if next.confidence > best.confidence { next } else { best })
    }

    /// Checks the supplier contract: at least one prediction, every species
    /// non-empty, every confidence within range, and a positive processing
    /// time. Ranking order is not checked.
    pub fn validate(&self) -> Result<()> {
        if self.predictions.is_empty() {
            return Err(FlutterlogError::InvalidClassification(
                "no predictions".to_string(),
            ));
        }

        for (rank, prediction) in self.predictions.iter().enumerate() {
            if prediction.species.trim().is_empty() {
                return Err(FlutterlogError::InvalidClassification(format!(
                    "prediction #{} has an empty species",
                    rank + 1
                )));
            }
            if !is_valid_confidence(prediction.confidence) {
                return Err(FlutterlogError::InvalidClassification(format!(
                    "prediction #{} has confidence {} outside [0, 100]",
                    rank + 1,
                    prediction.confidence
                )));
            }
        }

        if !(self.processing_time.is_finite() && self.processing_time > 0.0) {
            return Err(FlutterlogError::InvalidClassification(format!(
                "processing time {} is not a positive number of seconds",
                self.processing_time
            )));
        }

        Ok(())
    }

    /// Builds an unverified record from the top prediction.
    pub fn to_record(&self, image_url: impl Into<String>) -> Result<IdentificationRecord> {
        self.validate()?;
        let top = self
            .top()
            .ok_or_else(|| FlutterlogError::InvalidClassification("no predictions".to_string()))?;
        Ok(IdentificationRecord::new(
            top.species.clone(),
            top.confidence,
            image_url,
        ))
    }
}
