use crate::ir::Direction;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Padding {
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    /// Parses the `[top=70,left=50,bottom=50,right=50]` form. Sides that are
    /// not mentioned keep the value from `base`.
    pub fn parse(input: &str, base: Padding) -> Option<Self> {
        let body = input.trim().trim_start_matches('[').trim_end_matches(']');
        let mut padding = base;
        for part in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=')?;
            let value: f32 = value.trim().parse().ok()?;
            match key.trim() {
                "top" => padding.top = value,
                "left" => padding.left = value,
                "bottom" => padding.bottom = value,
                "right" => padding.right = value,
                _ => return None,
            }
        }
        Some(padding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRouting {
    Orthogonal,
    Polyline,
}

/// The fixed profile handed to the layout solver. Entities keep their
/// declaration order within a layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub direction: Direction,
    pub edge_routing: EdgeRouting,
    pub node_spacing: f32,
    pub layer_spacing: f32,
    pub edge_node_spacing: f32,
    pub edge_node_layer_spacing: f32,
    pub root_padding: Padding,
    pub group_padding: Padding,
    pub group_edge_node_spacing: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let padding = Padding {
            top: 70.0,
            left: 50.0,
            bottom: 50.0,
            right: 50.0,
        };
        Self {
            direction: Direction::Right,
            edge_routing: EdgeRouting::Orthogonal,
            node_spacing: 100.0,
            layer_spacing: 180.0,
            edge_node_spacing: 40.0,
            edge_node_layer_spacing: 50.0,
            root_padding: padding,
            group_padding: padding,
            group_edge_node_spacing: 30.0,
            node_width: 180.0,
            node_height: 60.0,
            margin: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub fit_padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Rendered size of a leaf, independent of the size used for layout.
    pub node_render_width: f32,
    pub node_render_height: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fit_padding: 0.2,
            min_zoom: 0.1,
            max_zoom: 2.0,
            canvas_width: 1200.0,
            canvas_height: 800.0,
            node_render_width: 180.0,
            node_render_height: 55.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopupConfig {
    /// Text shorter than this is shown as a single paragraph.
    pub split_threshold: usize,
    /// Sentences are accumulated until a paragraph reaches this many characters.
    pub paragraph_chars: usize,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            split_threshold: 150,
            paragraph_chars: 175,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub view: ViewConfig,
    pub popup: PopupConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().parse::<f32>().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    direction: Option<String>,
    edge_routing: Option<EdgeRouting>,
    node_spacing: Option<NumberOrString>,
    layer_spacing: Option<NumberOrString>,
    edge_node_spacing: Option<NumberOrString>,
    edge_node_layer_spacing: Option<NumberOrString>,
    padding: Option<String>,
    group_padding: Option<String>,
    group_edge_node_spacing: Option<NumberOrString>,
    node_width: Option<NumberOrString>,
    node_height: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewConfigFile {
    fit_padding: Option<f32>,
    min_zoom: Option<f32>,
    max_zoom: Option<f32>,
    canvas_width: Option<f32>,
    canvas_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    node_fill: Option<String>,
    group_fill: Option<String>,
    group_border: Option<String>,
    edge_stroke: Option<String>,
    edge_dasharray: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    view: Option<ViewConfigFile>,
    theme: Option<ThemeFile>,
    popup: Option<PopupConfig>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses JSON5 overrides and merges them over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        apply_layout_overrides(&mut config.layout, layout)?;
    }

    if let Some(view) = parsed.view {
        if let Some(v) = view.fit_padding {
            config.view.fit_padding = v;
        }
        if let Some(v) = view.min_zoom {
            config.view.min_zoom = v;
        }
        if let Some(v) = view.max_zoom {
            config.view.max_zoom = v;
        }
        if let Some(v) = view.canvas_width {
            config.view.canvas_width = v;
        }
        if let Some(v) = view.canvas_height {
            config.view.canvas_height = v;
        }
        if config.view.min_zoom <= 0.0 || config.view.min_zoom > config.view.max_zoom {
            anyhow::bail!(
                "invalid zoom range [{}, {}]",
                config.view.min_zoom,
                config.view.max_zoom
            );
        }
    }

    if let Some(theme) = parsed.theme {
        if let Some(v) = theme.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = theme.group_fill {
            config.theme.group_fill = v;
        }
        if let Some(v) = theme.group_border {
            config.theme.group_border = v;
        }
        if let Some(v) = theme.edge_stroke {
            config.theme.edge_stroke = v;
        }
        if let Some(v) = theme.edge_dasharray {
            config.theme.edge_dasharray = v;
        }
    }

    if let Some(popup) = parsed.popup {
        config.popup = popup;
    }

    Ok(config)
}

fn apply_layout_overrides(layout: &mut LayoutConfig, file: LayoutConfigFile) -> anyhow::Result<()> {
    if let Some(token) = file.direction.as_deref() {
        layout.direction = Direction::from_token(&token.to_ascii_uppercase())
            .ok_or_else(|| anyhow::anyhow!("unknown layout direction '{token}'"))?;
    }
    if let Some(v) = file.edge_routing {
        layout.edge_routing = v;
    }
    let numeric = [
        (file.node_spacing, &mut layout.node_spacing, "nodeSpacing"),
        (file.layer_spacing, &mut layout.layer_spacing, "layerSpacing"),
        (
            file.edge_node_spacing,
            &mut layout.edge_node_spacing,
            "edgeNodeSpacing",
        ),
        (
            file.edge_node_layer_spacing,
            &mut layout.edge_node_layer_spacing,
            "edgeNodeLayerSpacing",
        ),
        (
            file.group_edge_node_spacing,
            &mut layout.group_edge_node_spacing,
            "groupEdgeNodeSpacing",
        ),
        (file.node_width, &mut layout.node_width, "nodeWidth"),
        (file.node_height, &mut layout.node_height, "nodeHeight"),
    ];
    for (value, slot, name) in numeric {
        let Some(value) = value else {
            continue;
        };
        *slot = value
            .as_f32()
            .ok_or_else(|| anyhow::anyhow!("{name} must be a number"))?;
    }
    if let Some(raw) = file.padding.as_deref() {
        layout.root_padding = Padding::parse(raw, layout.root_padding)
            .ok_or_else(|| anyhow::anyhow!("malformed padding '{raw}'"))?;
    }
    if let Some(raw) = file.group_padding.as_deref() {
        layout.group_padding = Padding::parse(raw, layout.group_padding)
            .ok_or_else(|| anyhow::anyhow!("malformed group padding '{raw}'"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layered_profile() {
        let config = Config::default();
        assert_eq!(config.layout.direction, Direction::Right);
        assert_eq!(config.layout.node_spacing, 100.0);
        assert_eq!(config.layout.layer_spacing, 180.0);
        assert_eq!(config.layout.group_padding.top, 70.0);
        assert_eq!(config.view.max_zoom, 2.0);
    }

    #[test]
    fn parses_padding_option() {
        let base = Padding::uniform(0.0);
        let padding = Padding::parse("[top=70,left=50,bottom=50,right=50]", base).unwrap();
        assert_eq!(padding.top, 70.0);
        assert_eq!(padding.right, 50.0);
        let partial = Padding::parse("[left=12]", Padding::uniform(4.0)).unwrap();
        assert_eq!(partial.left, 12.0);
        assert_eq!(partial.top, 4.0);
        assert!(Padding::parse("[middle=3]", base).is_none());
    }

    #[test]
    fn json5_overrides_merge_over_defaults() {
        let config = parse_config(
            r#"{
                // spacing accepts strings the way layered-layout options are usually written
                layout: { direction: "down", nodeSpacing: "60", groupPadding: "[top=40]" },
                view: { maxZoom: 4 },
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.direction, Direction::Down);
        assert_eq!(config.layout.node_spacing, 60.0);
        assert_eq!(config.layout.layer_spacing, 180.0);
        assert_eq!(config.layout.group_padding.top, 40.0);
        assert_eq!(config.layout.group_padding.left, 50.0);
        assert_eq!(config.view.max_zoom, 4.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config(r#"{ layout: { direction: "sideways" } }"#).is_err());
        assert!(parse_config(r#"{ layout: { nodeSpacing: "wide" } }"#).is_err());
        assert!(parse_config(r#"{ view: { minZoom: 3, maxZoom: 2 } }"#).is_err());
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.popup.paragraph_chars, 175);
    }

    #[test]
    fn resolved_config_serializes_and_fills_gaps() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["popup"]["paragraphChars"], 175);
        assert_eq!(json["theme"]["edge_stroke"], "#333");

        let config: Config = serde_json::from_str(r#"{ "popup": { "paragraphChars": 200 } }"#).unwrap();
        assert_eq!(config.popup.paragraph_chars, 200);
        assert_eq!(config.popup.split_threshold, 150);
        assert_eq!(config.theme.group_border, "#ccc");
        assert_eq!(config.layout.node_width, LayoutConfig::default().node_width);
    }
}
