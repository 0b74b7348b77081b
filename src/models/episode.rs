use serde::{Deserialize, Serialize};

/// An episode as reported by a parser during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEpisode {
    pub id_on_website: String,
    pub name: String,
    #[serde(default)]
    pub number: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub seconds: f64,
    pub completed: bool,
}
