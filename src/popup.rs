use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::PopupConfig;
use crate::layout::{GraphIndex, Point, RenderEdge, RenderNode};
use crate::theme::Theme;
use crate::viewport::Viewport;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PopupContent {
    Text { paragraphs: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Connection {
        source_label: String,
        target_label: String,
        info: Option<String>,
    },
}

/// An open detail popup, pinned to a world-space point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupAnchor {
    pub world: Point,
    pub title: Option<String>,
    pub content: PopupContent,
    pub accent_color: String,
}

impl PopupAnchor {
    /// Where the popup sits on screen for the given viewport.
    pub fn screen_position(&self, viewport: &Viewport) -> Point {
        viewport.world_to_screen(self.world)
    }
}

/// A popup resolved against a viewport, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenPopup<'a> {
    pub position: Point,
    pub anchor: &'a PopupAnchor,
}

/// Holds at most one open popup.
#[derive(Debug, Clone, Default)]
pub struct PopupState {
    current: Option<PopupAnchor>,
}

impl PopupState {
    pub fn current(&self) -> Option<&PopupAnchor> {
        self.current.as_ref()
    }

    /// Opens the popup for a clicked node, replacing any open one.
    pub fn on_node_click(
        &mut self,
        node: &RenderNode,
        click: Point,
        viewport: &Viewport,
        theme: &Theme,
        popup: &PopupConfig,
    ) {
        self.current = Some(PopupAnchor {
            world: viewport.screen_to_world(click),
            title: Some(node.label.clone()),
            content: PopupContent::Text {
                paragraphs: split_paragraphs(&node.info, popup),
            },
            accent_color: node
                .color
                .clone()
                .unwrap_or_else(|| theme.node_accent.clone()),
        });
    }

    pub fn on_edge_click(
        &mut self,
        edge: &RenderEdge,
        index: &GraphIndex,
        click: Point,
        viewport: &Viewport,
        theme: &Theme,
    ) {
        let info = edge
            .info
            .clone()
            .filter(|text| !text.is_empty())
            .or_else(|| edge.label.clone().filter(|text| !text.is_empty()));
        self.current = Some(PopupAnchor {
            world: viewport.screen_to_world(click),
            title: None,
            content: PopupContent::Connection {
                source_label: index.display_label(&edge.source).to_string(),
                target_label: index.display_label(&edge.target).to_string(),
                info,
            },
            accent_color: theme.edge_accent.clone(),
        });
    }

    pub fn on_background_click(&mut self) {
        self.close();
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn placement(&self, viewport: &Viewport) -> Option<ScreenPopup<'_>> {
        self.current.as_ref().map(|anchor| ScreenPopup {
            position: anchor.screen_position(viewport),
            anchor,
        })
    }
}

/// Breaks long text into paragraphs at sentence boundaries. Short text stays
/// a single paragraph; empty text yields none.
pub fn split_paragraphs(text: &str, config: &PopupConfig) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() < config.split_threshold {
        return vec![text.to_string()];
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // Keep the punctuation with its sentence; drop the whitespace.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
        // A block closes once it reaches the limit, counting its trailing separator,
        // so a paragraph may run past `paragraph_chars` by up to one sentence.
        if current.chars().count() + 1 >= config.paragraph_chars {
            paragraphs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{NodeKind, Size};

    fn node(color: Option<&str>, info: &str) -> RenderNode {
        RenderNode {
            id: "api".to_string(),
            position: Point::new(0.0, 0.0),
            size: Size::new(180.0, 55.0),
            parent_id: None,
            kind: NodeKind::Leaf,
            label: "API".to_string(),
            info: info.to_string(),
            color: color.map(str::to_string),
            fill: "#fff".to_string(),
            border: "#333".to_string(),
            z_index: 10,
        }
    }

    #[test]
    fn popup_tracks_pan_and_zoom() {
        let mut state = PopupState::default();
        let viewport = Viewport::new(100.0, 50.0, 2.0);
        let click = Point::new(300.0, 250.0);
        state.on_node_click(
            &node(None, "Handles requests."),
            click,
            &viewport,
            &Theme::default(),
            &PopupConfig::default(),
        );
        let anchor = state.current().unwrap();
        assert_eq!(anchor.world, Point::new(100.0, 100.0));
        assert_eq!(anchor.accent_color, "#333");
        assert_eq!(state.placement(&viewport).unwrap().position, click);

        let panned = Viewport::new(-20.0, 10.0, 0.5);
        assert_eq!(state.placement(&panned).unwrap().position, Point::new(30.0, 60.0));

        state.on_background_click();
        assert!(state.placement(&panned).is_none());
    }

    #[test]
    fn node_color_becomes_accent() {
        let mut state = PopupState::default();
        state.on_node_click(
            &node(Some("#0a0"), ""),
            Point::ORIGIN,
            &Viewport::default(),
            &Theme::default(),
            &PopupConfig::default(),
        );
        let anchor = state.current().unwrap();
        assert_eq!(anchor.accent_color, "#0a0");
        assert_eq!(anchor.content, PopupContent::Text { paragraphs: vec![] });
    }

    #[test]
    fn short_text_is_one_paragraph() {
        let text = "One. Two! Three?";
        assert_eq!(split_paragraphs(text, &PopupConfig::default()), vec![text.to_string()]);
    }

    #[test]
    fn long_text_splits_at_sentence_boundaries() {
        let sentence = "This sentence runs to about sixty characters, give or take a few.";
        let text = [sentence; 5].join(" ");
        let paragraphs = split_paragraphs(&text, &PopupConfig::default());
        // Three sentences reach the limit; the remaining two form the tail.
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0], [sentence; 3].join(" "));
        assert!(paragraphs[0].chars().count() > 175);
        assert_eq!(paragraphs[1], [sentence; 2].join(" "));
        for paragraph in &paragraphs {
            assert!(paragraph.ends_with('.'));
        }
        assert_eq!(paragraphs.join(" "), text);
    }

    #[test]
    fn block_closes_exactly_at_the_limit() {
        let config = PopupConfig {
            split_threshold: 0,
            paragraph_chars: 10,
        };
        // "Abcdefgh." plus its separator is ten characters.
        let paragraphs = split_paragraphs("Abcdefgh. Ab. Cd.", &config);
        assert_eq!(paragraphs, vec!["Abcdefgh.", "Ab. Cd."]);
    }
}
