//! MR upload + tumor classification panel.
//!
//! Two sequential calls: the image is stored first, and only the id the
//! upload returns is sent along with the bytes to the classifier. The
//! classifier's probability strings ("92.31%") are shown without the
//! percent sign, which the UI prefixes itself.

use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, ClinicBackend, ImageUpload};
use crate::messages::{self, FormError};
use crate::models::PredictResponse;

/// Classifier output ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class label, e.g. `glioma_tumor`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Probability of the predicted class without `%`; empty if the
    /// classifier did not list it.
    pub score: String,
    pub all: Vec<ClassScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class: String,
    pub probability: String,
}

fn strip_percent(probability: &str) -> String {
    probability.replacen('%', "", 1)
}

/// `glioma_tumor` is shown as `glioma tumor`.
pub fn class_label(class: &str) -> String {
    class.replacen('_', " ", 1)
}

impl From<PredictResponse> for Prediction {
    fn from(response: PredictResponse) -> Self {
        let score = response
            .prediction
            .iter()
            .find(|p| p.class == response.predicted_class)
            .map(|p| strip_percent(&p.probability))
            .unwrap_or_default();
        let all = response
            .prediction
            .into_iter()
            .map(|p| ClassScore {
                probability: strip_percent(&p.probability),
                class: p.class,
            })
            .collect();

        Self {
            kind: response.predicted_class,
            score,
            all,
        }
    }
}

impl Prediction {
    /// Result card lines: one per class, then the verdict and confidence.
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .all
            .iter()
            .map(|c| format!("{}: %{}", class_label(&c.class), c.probability))
            .collect();
        lines.push(format!("Tümör Türü: {}", self.kind));
        lines.push(format!("Güven: %{}", self.score));
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error("Upload failed: {0}")]
    Upload(BackendError),
    #[error("Prediction failed: {0}")]
    Predict(BackendError),
}

impl PredictionError {
    /// Validation text is specific; every network failure shares one message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Upload(_) | Self::Predict(_) => messages::PREDICTION_FAILED.to_string(),
        }
    }
}

/// View-state of the "MR & Yapay Zeka" panel.
#[derive(Debug, Clone, Default)]
pub struct PredictionPanel {
    selected_patient: Option<i64>,
    image: Option<ImageUpload>,
    stored_image_id: Option<i64>,
    prediction: Option<Prediction>,
    loading: bool,
    error: Option<String>,
}

impl PredictionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_patient(&mut self, patient_id: i64) {
        self.selected_patient = Some(patient_id);
        self.error = None;
    }

    pub fn clear_patient(&mut self) {
        self.selected_patient = None;
    }

    pub fn selected_patient(&self) -> Option<i64> {
        self.selected_patient
    }

    /// Image currently previewed.
    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    /// Backend id of the last uploaded image.
    pub fn stored_image_id(&self) -> Option<i64> {
        self.stored_image_id
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Result card text, or the placeholder when nothing was predicted yet.
    pub fn result_lines(&self) -> Vec<String> {
        match &self.prediction {
            Some(p) => p.display_lines(),
            None => vec![messages::NO_PREDICTION_YET.to_string()],
        }
    }

    /// Upload `image` for the selected patient, then classify it.
    ///
    /// Without a selected patient nothing is sent. The previous result is
    /// cleared before the first request.
    pub fn submit(
        &mut self,
        backend: &dyn ClinicBackend,
        image: ImageUpload,
    ) -> Result<&Prediction, PredictionError> {
        let Some(patient_id) = self.selected_patient else {
            let err = PredictionError::from(FormError::NoPatientSelected);
            self.error = Some(err.user_message());
            return Err(err);
        };

        self.prediction = None;
        self.stored_image_id = None;
        self.error = None;
        self.loading = true;

        let outcome = Self::upload_then_predict(backend, patient_id, &image);
        self.image = Some(image);
        self.loading = false;

        match outcome {
            Ok((image_id, prediction)) => {
                tracing::info!(
                    patient_id,
                    image_id,
                    class = %prediction.kind,
                    "MR prediction received"
                );
                self.stored_image_id = Some(image_id);
                Ok(self.prediction.insert(prediction))
            }
            Err(err) => {
                tracing::warn!(patient_id, error = %err, "MR prediction failed");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    fn upload_then_predict(
        backend: &dyn ClinicBackend,
        patient_id: i64,
        image: &ImageUpload,
    ) -> Result<(i64, Prediction), PredictionError> {
        let created = backend
            .upload_mr_image(patient_id, image)
            .map_err(PredictionError::Upload)?;
        let response = backend
            .predict(patient_id, created.id, image)
            .map_err(PredictionError::Predict)?;
        Ok((created.id, Prediction::from(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Endpoint, MockBackend, MockCall};
    use crate::models::ClassProbability;

    fn glioma_response() -> PredictResponse {
        PredictResponse {
            predicted_class: "glioma".into(),
            prediction: vec![
                ClassProbability { class: "glioma".into(), probability: "92%".into() },
                ClassProbability { class: "pituitary".into(), probability: "8%".into() },
            ],
        }
    }

    #[test]
    fn normalizes_and_strips_percent() {
        let prediction = Prediction::from(glioma_response());
        assert_eq!(prediction.kind, "glioma");
        assert_eq!(prediction.score, "92");
        assert_eq!(
            prediction.all,
            vec![
                ClassScore { class: "glioma".into(), probability: "92".into() },
                ClassScore { class: "pituitary".into(), probability: "8".into() },
            ]
        );
    }

    #[test]
    fn missing_predicted_class_gives_empty_score() {
        let mut response = glioma_response();
        response.predicted_class = "no_tumor".into();
        assert_eq!(Prediction::from(response).score, "");
    }

    #[test]
    fn serializes_kind_as_type() {
        let json = serde_json::to_value(Prediction::from(glioma_response())).unwrap();
        assert_eq!(json["type"], "glioma");
        assert_eq!(json["all"][1]["probability"], "8");
    }

    #[test]
    fn display_lines_prefix_percent() {
        let lines = Prediction::from(PredictResponse {
            predicted_class: "glioma_tumor".into(),
            prediction: vec![ClassProbability {
                class: "glioma_tumor".into(),
                probability: "92.31%".into(),
            }],
        })
        .display_lines();
        assert_eq!(lines[0], "glioma tumor: %92.31");
        assert_eq!(lines[1], "Tümör Türü: glioma_tumor");
        assert_eq!(lines[2], "Güven: %92.31");
    }

    #[test]
    fn no_patient_selected_sends_nothing() {
        let backend = MockBackend::seeded();
        let mut panel = PredictionPanel::new();

        let err = panel
            .submit(&backend, ImageUpload::from_bytes(vec![1, 2]))
            .unwrap_err();
        assert_eq!(err, PredictionError::Validation(FormError::NoPatientSelected));
        assert_eq!(panel.error(), Some("Lütfen önce bir hasta seçin."));
        assert!(backend.calls().is_empty());
        assert!(panel.image().is_none());
    }

    #[test]
    fn predict_uses_id_returned_by_upload() {
        let backend = MockBackend::seeded().with_prediction(glioma_response());
        let mut panel = PredictionPanel::new();
        panel.select_patient(1);

        let prediction = panel
            .submit(&backend, ImageUpload::from_bytes(vec![9; 8]))
            .unwrap()
            .clone();
        assert_eq!(prediction.score, "92");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], MockCall { endpoint: Endpoint::UploadMrImage, target: Some(1) });
        assert_eq!(calls[1].endpoint, Endpoint::Predict);
        let image_id = panel.stored_image_id().unwrap();
        assert_eq!(calls[1].target, Some(image_id));
        assert!(backend.was_uploaded(image_id));
        assert!(!panel.is_loading());
    }

    #[test]
    fn failed_upload_never_predicts() {
        let backend = MockBackend::seeded();
        backend.fail(
            Endpoint::UploadMrImage,
            BackendError::Rejected { status: 400, message: "Dosya ve hasta ID gerekli!".into() },
        );
        let mut panel = PredictionPanel::new();
        panel.select_patient(1);

        let err = panel.submit(&backend, ImageUpload::from_bytes(vec![1])).unwrap_err();
        assert!(matches!(err, PredictionError::Upload(_)));
        assert_eq!(backend.call_count(Endpoint::Predict), 0);
        assert_eq!(panel.error(), Some("Tahmin alınırken hata oluştu."));
        assert!(panel.prediction().is_none());
    }

    #[test]
    fn failed_predict_collapses_to_generic_message() {
        let backend = MockBackend::seeded();
        backend.fail(Endpoint::Predict, BackendError::Timeout(30));
        let mut panel = PredictionPanel::new();
        panel.select_patient(2);

        let err = panel.submit(&backend, ImageUpload::from_bytes(vec![1])).unwrap_err();
        assert_eq!(err, PredictionError::Predict(BackendError::Timeout(30)));
        assert_eq!(panel.error(), Some("Tahmin alınırken hata oluştu."));
        assert_eq!(panel.result_lines(), vec!["Henüz tahmin yapılmadı.".to_string()]);
    }

    #[test]
    fn new_submission_clears_previous_result() {
        let backend = MockBackend::seeded();
        let mut panel = PredictionPanel::new();
        panel.select_patient(1);
        panel.submit(&backend, ImageUpload::from_bytes(vec![1])).unwrap();
        assert!(panel.prediction().is_some());

        backend.fail(Endpoint::Predict, BackendError::Timeout(30));
        let _ = panel.submit(&backend, ImageUpload::from_bytes(vec![2]));
        assert!(panel.prediction().is_none());
    }
}
