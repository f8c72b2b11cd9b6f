use serde::{Deserialize, Serialize};

/// Per-type fallbacks applied when the description leaves a color unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub node_fill: String,
    pub node_border: String,
    pub group_fill: String,
    pub group_border: String,
    pub edge_stroke: String,
    pub edge_stroke_width: f32,
    pub edge_dasharray: String,
    pub node_accent: String,
    pub edge_accent: String,
    pub group_z_index: i32,
    pub edge_z_index: i32,
    pub node_z_index: i32,
}

impl Theme {
    pub fn paper() -> Self {
        Self {
            node_fill: "#fff".to_string(),
            node_border: "#333".to_string(),
            group_fill: "rgba(0,0,0,0.02)".to_string(),
            group_border: "#ccc".to_string(),
            edge_stroke: "#333".to_string(),
            edge_stroke_width: 2.0,
            edge_dasharray: "5,5".to_string(),
            node_accent: "#333".to_string(),
            edge_accent: "#555".to_string(),
            group_z_index: -1,
            edge_z_index: 5,
            node_z_index: 10,
        }
    }

    pub fn dashes_for(&self, dashed: bool) -> Option<&str> {
        dashed.then_some(self.edge_dasharray.as_str())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::paper()
    }
}
