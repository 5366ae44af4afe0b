//! Prediction result and its wire representation.

use serde::{Deserialize, Serialize};

/// Crop-specific part of a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct CropPrediction {
    pub class: String,
    pub confidence_percent: f64,
}

/// Outcome of the selection policy.
///
/// Confidences are percentages (0-100) at full precision; rounding only
/// happens when converting to a [`PredictionResponse`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub main_class: String,
    pub main_confidence_percent: f64,
    /// Present only when a crop filter was given, some label matched it and
    /// the main class did not already belong to that crop.
    pub crop: Option<CropPrediction>,
}

impl PredictionResult {
    pub fn crop_class(&self) -> Option<&str> {
        self.crop.as_ref().map(|c| c.class.as_str())
    }

    pub fn crop_confidence_percent(&self) -> Option<f64> {
        self.crop.as_ref().map(|c| c.confidence_percent)
    }
}

/// Formats a percentage with two decimals and a trailing `%`.
pub fn format_confidence(percent: f64) -> String {
    format!("{percent:.2}%")
}

/// JSON body returned by `POST /predict`.
///
/// Field names are part of the public contract with the web frontend.
/// Crop fields serialize as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub main_prediction: String,
    pub main_confidence: String,
    pub crop_specific_prediction: Option<String>,
    pub crop_specific_confidence: Option<String>,
}

impl From<&PredictionResult> for PredictionResponse {
    fn from(result: &PredictionResult) -> Self {
        Self {
            main_prediction: result.main_class.clone(),
            main_confidence: format_confidence(result.main_confidence_percent),
            crop_specific_prediction: result.crop.as_ref().map(|c| c.class.clone()),
            crop_specific_confidence: result
                .crop
                .as_ref()
                .map(|c| format_confidence(c.confidence_percent)),
        }
    }
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self::from(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(70.0), "70.00%");
        assert_eq!(format_confidence(f64::from(0.7_f32) * 100.0), "70.00%");
        assert_eq!(format_confidence(99.999), "100.00%");
        assert_eq!(format_confidence(0.0), "0.00%");
        assert_eq!(format_confidence(12.344), "12.34%");
    }

    #[test]
    fn test_response_with_crop() {
        let result = PredictionResult {
            main_class: "maiz_roya".to_string(),
            main_confidence_percent: 70.0,
            crop: Some(CropPrediction {
                class: "cafe_sano".to_string(),
                confidence_percent: 20.0,
            }),
        };

        let json = serde_json::to_value(PredictionResponse::from(&result)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "main_prediction": "maiz_roya",
                "main_confidence": "70.00%",
                "crop_specific_prediction": "cafe_sano",
                "crop_specific_confidence": "20.00%",
            })
        );
    }

    #[test]
    fn test_response_without_crop_serializes_nulls() {
        let result = PredictionResult {
            main_class: "maiz_roya".to_string(),
            main_confidence_percent: 70.0,
            crop: None,
        };

        let json = serde_json::to_value(PredictionResponse::from(result)).unwrap();
        assert!(json["crop_specific_prediction"].is_null());
        assert!(json["crop_specific_confidence"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
