use serde::{Deserialize, Serialize};

/// Raw `/predict` response. Probabilities arrive as strings such as `"92.31%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_class: String,
    pub prediction: Vec<ClassProbability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: String,
    pub probability: String,
}
