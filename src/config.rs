use crate::geometry::Point;
use crate::style::Style;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub scale: f64,
    pub translate: Point,
    /// Consult the dynamic resolver hook for edge-style and perimeter names
    /// missing from the registry.
    pub allow_eval: bool,
    /// Re-resolve the style of an existing state on every creating lookup.
    pub update_style: bool,
    pub default_loop_style: String,
    /// Default segment length of loops, in unscaled units.
    pub grid_size: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::new(0.0, 0.0),
            allow_eval: false,
            update_style: false,
            default_loop_style: crate::edge_style::LOOP.to_string(),
            grid_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Length of the horizontal stubs of entity-relation edges.
    pub entity_segment: f64,
    /// Overrides the orthogonal hint for edges without an `orthogonal` style.
    pub orthogonal: Option<bool>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            entity_segment: 30.0,
            orthogonal: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub view: ViewConfig,
    pub routing: RoutingConfig,
    /// Named styles registered with the stylesheet.
    pub styles: BTreeMap<String, Style>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewConfigFile {
    scale: Option<f64>,
    translate: Option<Point>,
    allow_eval: Option<bool>,
    update_style: Option<bool>,
    default_loop_style: Option<String>,
    grid_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    entity_segment: Option<f64>,
    orthogonal: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    view: Option<ViewConfigFile>,
    routing: Option<RoutingConfigFile>,
    styles: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(view) = parsed.view {
        if let Some(v) = view.scale {
            if !(v.is_finite() && v > 0.0) {
                anyhow::bail!("view.scale must be a positive number, got {v}");
            }
            config.view.scale = v;
        }
        if let Some(v) = view.translate {
            config.view.translate = v;
        }
        if let Some(v) = view.allow_eval {
            config.view.allow_eval = v;
        }
        if let Some(v) = view.update_style {
            config.view.update_style = v;
        }
        if let Some(v) = view.default_loop_style {
            config.view.default_loop_style = v;
        }
        if let Some(v) = view.grid_size {
            config.view.grid_size = v;
        }
    }

    if let Some(routing) = parsed.routing {
        if let Some(v) = routing.entity_segment {
            config.routing.entity_segment = v;
        }
        if routing.orthogonal.is_some() {
            config.routing.orthogonal = routing.orthogonal;
        }
    }

    if let Some(styles) = parsed.styles {
        for (name, entries) in styles {
            config.styles.insert(name, entries.into_iter().collect());
        }
    }

    Ok(config)
}
