use crate::model::{CellId, GraphModel};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const SHAPE: &str = "shape";
pub const PERIMETER: &str = "perimeter";
pub const PERIMETER_SPACING: &str = "perimeterSpacing";
pub const SOURCE_PERIMETER_SPACING: &str = "sourcePerimeterSpacing";
pub const TARGET_PERIMETER_SPACING: &str = "targetPerimeterSpacing";
pub const ROTATION: &str = "rotation";
pub const DIRECTION: &str = "direction";
pub const ANCHOR_POINT_DIRECTION: &str = "anchorPointDirection";
pub const FLIP_H: &str = "flipH";
pub const FLIP_V: &str = "flipV";
pub const STENCIL_FLIP_H: &str = "stencilFlipH";
pub const STENCIL_FLIP_V: &str = "stencilFlipV";
pub const EDGE_STYLE: &str = "edgeStyle";
pub const LOOP_STYLE: &str = "loopStyle";
pub const NO_EDGE_STYLE: &str = "noEdgeStyle";
pub const ORTHOGONAL: &str = "orthogonal";
pub const ELBOW: &str = "elbow";
pub const SEGMENT: &str = "segment";
pub const ROUTING_CENTER_X: &str = "routingCenterX";
pub const ROUTING_CENTER_Y: &str = "routingCenterY";
pub const PORT_CONSTRAINT: &str = "portConstraint";
pub const SOURCE_PORT: &str = "sourcePort";
pub const TARGET_PORT: &str = "targetPort";
pub const EXIT_X: &str = "exitX";
pub const EXIT_Y: &str = "exitY";
pub const EXIT_DX: &str = "exitDx";
pub const EXIT_DY: &str = "exitDy";
pub const EXIT_PERIMETER: &str = "exitPerimeter";
pub const ENTRY_X: &str = "entryX";
pub const ENTRY_Y: &str = "entryY";
pub const ENTRY_DX: &str = "entryDx";
pub const ENTRY_DY: &str = "entryDy";
pub const ENTRY_PERIMETER: &str = "entryPerimeter";
pub const LABEL_POSITION: &str = "labelPosition";
pub const VERTICAL_LABEL_POSITION: &str = "verticalLabelPosition";
pub const LABEL_WIDTH: &str = "labelWidth";
pub const ALIGN: &str = "align";
pub const VERTICAL_ALIGN: &str = "verticalAlign";
pub const FONT_SIZE: &str = "fontSize";

/// Font size used when a style carries none.
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Resolved key/value style of a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Style(BTreeMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies every entry of `other` over this style.
    pub fn merge(&mut self, other: &Style) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Numeric value of `key`; non-finite or unparsable values read as absent.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => other.parse::<f64>().ok().map(|v| v != 0.0),
        }
    }

    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.flag(key).unwrap_or(default)
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.number_or(ROTATION, 0.0)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Produces the resolved style map for a cell.
pub trait StyleResolver {
    fn cell_style(&self, model: &GraphModel, cell: CellId) -> Style;
}

/// Default vertex and edge styles plus named styles, combined with the
/// `name;key=value;key=none` strings stored on cells.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    default_vertex: Style,
    default_edge: Style,
    named: HashMap<String, Style>,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            default_vertex: Self::create_default_vertex_style(),
            default_edge: Self::create_default_edge_style(),
            named: HashMap::new(),
        }
    }
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_default_vertex_style() -> Style {
        Style::from_iter([
            (SHAPE, "rectangle"),
            (PERIMETER, "rectanglePerimeter"),
            (ALIGN, "center"),
            (VERTICAL_ALIGN, "middle"),
            (FONT_SIZE, "11"),
        ])
    }

    pub fn create_default_edge_style() -> Style {
        Style::from_iter([
            (SHAPE, "connector"),
            (ALIGN, "center"),
            (VERTICAL_ALIGN, "middle"),
            (FONT_SIZE, "11"),
        ])
    }

    pub fn default_vertex_style(&self) -> &Style {
        &self.default_vertex
    }

    pub fn default_edge_style(&self) -> &Style {
        &self.default_edge
    }

    pub fn set_default_vertex_style(&mut self, style: Style) {
        self.default_vertex = style;
    }

    pub fn set_default_edge_style(&mut self, style: Style) {
        self.default_edge = style;
    }

    pub fn put_cell_style(&mut self, name: impl Into<String>, style: Style) {
        self.named.insert(name.into(), style);
    }

    pub fn named_style(&self, name: &str) -> Option<&Style> {
        self.named.get(name)
    }

    /// Applies a style string to `base`.
    ///
    /// A leading `;` starts from an empty style instead of `base`. Bare tokens
    /// merge a named style, `key=value` sets a key and `key=none` removes it.
    pub fn apply_style_string(&self, text: &str, base: &Style) -> Style {
        if text.is_empty() {
            return base.clone();
        }
        let mut style = if text.starts_with(';') {
            Style::new()
        } else {
            base.clone()
        };
        for token in text.split(';').filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((key, "none")) => {
                    style.remove(key);
                }
                Some((key, value)) => style.set(key, value),
                None => {
                    if let Some(named) = self.named.get(token) {
                        style.merge(named);
                    }
                }
            }
        }
        style
    }
}

impl StyleResolver for Stylesheet {
    fn cell_style(&self, model: &GraphModel, cell: CellId) -> Style {
        let base = if model.is_edge(cell) {
            &self.default_edge
        } else {
            &self.default_vertex
        };
        match model.style(cell) {
            Some(text) => self.apply_style_string(text, base),
            None => base.clone(),
        }
    }
}
