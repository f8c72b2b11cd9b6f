use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "RIGHT" | "LR" => Some(Self::Right),
            "DOWN" | "TD" | "TB" => Some(Self::Down),
            "LEFT" | "RL" => Some(Self::Left),
            "UP" | "BT" => Some(Self::Up),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }
}

/// A leaf entity of the incoming description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub dashed: bool,
}

/// Flat `{nodes, groups, links}` description produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl NodeSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            info: None,
            color: None,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

impl GroupSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            info: None,
            color: None,
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("Group")
    }
}

impl LinkSpec {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            label: None,
            info: None,
            dashed: false,
        }
    }
}

impl GraphDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_description_with_optional_fields() {
        let input = r##"{
            "nodes": [
                {"id": "api", "label": "API", "info": "Serves requests", "parent": "backend"},
                {"id": "db"}
            ],
            "groups": [{"id": "backend", "label": "Backend", "color": "#e3f2fd"}],
            "links": [{"source": "api", "target": "db", "label": "reads", "dashed": true}]
        }"##;
        let desc = GraphDescription::from_json(input).unwrap();
        assert_eq!(desc.nodes.len(), 2);
        assert_eq!(desc.nodes[0].parent.as_deref(), Some("backend"));
        assert_eq!(desc.nodes[1].display_label(), "db");
        assert_eq!(desc.groups[0].color.as_deref(), Some("#e3f2fd"));
        assert!(desc.links[0].dashed);
        assert!(desc.links[0].info.is_none());
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let desc = GraphDescription::from_json("{}").unwrap();
        assert!(desc.is_empty());
        assert!(desc.links.is_empty());
    }

    #[test]
    fn direction_tokens() {
        assert_eq!(Direction::from_token("LR"), Some(Direction::Right));
        assert_eq!(Direction::from_token("DOWN"), Some(Direction::Down));
        assert_eq!(Direction::from_token("diagonal"), None);
        assert!(Direction::Left.is_horizontal());
    }
}
