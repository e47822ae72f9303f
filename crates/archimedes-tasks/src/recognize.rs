//! The seam to an external handwriting-to-markup service.

use archimedes_commands::HandlerError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("recognizer returned no result")]
    NoResult,
    #[error("recognition confidence {confidence:.3} below required {required:.3}")]
    LowConfidence { confidence: f64, required: f64 },
    #[error("per-character confidence {confidence:.3} below required {required:.3}")]
    LowCharConfidence { confidence: f64, required: f64 },
    #[error("recognition service error: {0}")]
    Service(String),
}

impl From<RecognitionError> for HandlerError {
    fn from(e: RecognitionError) -> Self {
        HandlerError::Recognition(Box::new(e))
    }
}

/// Markup read from a region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// TeX markup.
    pub markup: String,
    /// Overall confidence in `[0, 1]`.
    pub confidence: f64,
    /// Lowest per-character confidence, when the service reports one.
    #[serde(default)]
    pub min_char_confidence: Option<f64>,
}

/// A service that turns an image of handwriting into markup.
pub trait MarkupRecognizer {
    fn recognize(&self, region: &RgbImage) -> Result<Recognition, RecognitionError>;
}

/// Confidence thresholds a recognition has to meet. `None` disables a
/// check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionPolicy {
    pub min_confidence: Option<f64>,
    pub min_char_confidence: Option<f64>,
}

impl RecognitionPolicy {
    pub fn check(&self, r: &Recognition) -> Result<(), RecognitionError> {
        if r.markup.trim().is_empty() {
            return Err(RecognitionError::NoResult);
        }
        if let Some(required) = self.min_confidence {
            if r.confidence < required {
                return Err(RecognitionError::LowConfidence {
                    confidence: r.confidence,
                    required,
                });
            }
        }
        if let (Some(required), Some(confidence)) = (self.min_char_confidence, r.min_char_confidence)
        {
            if confidence < required {
                return Err(RecognitionError::LowCharConfidence {
                    confidence,
                    required,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(markup: &str, confidence: f64, chars: Option<f64>) -> Recognition {
        Recognition {
            markup: markup.to_owned(),
            confidence,
            min_char_confidence: chars,
        }
    }

    #[test]
    fn default_policy_only_rejects_empty_markup() {
        let p = RecognitionPolicy::default();
        assert!(p.check(&rec("x^2", 0.01, Some(0.0))).is_ok());
        assert_eq!(p.check(&rec("  ", 0.9, None)), Err(RecognitionError::NoResult));
    }

    #[test]
    fn low_confidence_is_distinguished_from_no_result() {
        let p = RecognitionPolicy {
            min_confidence: Some(0.8),
            min_char_confidence: Some(0.5),
        };
        assert_eq!(
            p.check(&rec("1+1", 0.6, None)),
            Err(RecognitionError::LowConfidence {
                confidence: 0.6,
                required: 0.8
            })
        );
        assert_eq!(
            p.check(&rec("1+1", 0.9, Some(0.4))),
            Err(RecognitionError::LowCharConfidence {
                confidence: 0.4,
                required: 0.5
            })
        );
        assert!(p.check(&rec("1+1", 0.9, None)).is_ok());
        assert!(p.check(&rec("1+1", 0.8, Some(0.5))).is_ok());
    }

    #[test]
    fn converts_into_handler_error() {
        let e: HandlerError = RecognitionError::NoResult.into();
        assert!(matches!(e, HandlerError::Recognition(_)));
        assert!(e.to_string().contains("no result"));
    }
}
