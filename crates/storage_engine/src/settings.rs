use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Favorited entries are listed first and "only favorites" is honored.
    pub favoriting_enabled: bool,
    /// Maximum number of entries the recent filter shows.
    pub recent_cap: usize,
    /// Sub-steps reported per filtering pass.
    pub task_count: usize,
    pub task_label: String,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            favoriting_enabled: true,
            recent_cap: 100,
            task_count: 9,
            task_label: "Loading items".to_string(),
        }
    }
}
