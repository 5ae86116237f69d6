use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrImage {
    pub id: i64,
    pub file_url: String,
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl MrImage {
    /// Prediction label for the image card, "Tahmin yok" when not classified yet.
    pub fn prediction_label(&self) -> String {
        match self.prediction.as_deref().filter(|p| !p.is_empty()) {
            Some(p) => p.replacen('_', " ", 1),
            None => "Tahmin yok".to_string(),
        }
    }
}
