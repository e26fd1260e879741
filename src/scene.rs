use crate::model::{CellId, CellKind, Geometry, GraphModel, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene: {0}")]
    Parse(#[from] json5::Error),
    #[error("duplicate cell id `{0}`")]
    DuplicateId(String),
    #[error("cell `{cell}` refers to unknown {role} `{id}`")]
    UnknownReference {
        cell: String,
        role: &'static str,
        id: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    #[default]
    Vertex,
    Edge,
    Layer,
}

/// One cell of a scene document. Parents must be declared before their
/// children; terminals may refer to any cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneCell {
    pub id: String,
    #[serde(default)]
    pub kind: SceneKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, alias = "label")]
    pub value: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub collapsed: bool,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDoc {
    #[serde(default)]
    pub cells: Vec<SceneCell>,
}

/// A model built from a scene document plus the mapping from document ids.
#[derive(Debug, Clone)]
pub struct Scene {
    pub model: GraphModel,
    pub ids: BTreeMap<String, CellId>,
}

impl Scene {
    pub fn cell(&self, id: &str) -> Option<CellId> {
        self.ids.get(id).copied()
    }

    /// Document id of a model cell, if it came from the document.
    pub fn name(&self, cell: CellId) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, id)| **id == cell)
            .map(|(name, _)| name.as_str())
    }
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let contents = std::fs::read_to_string(path)?;
    parse_scene(&contents)
}

pub fn parse_scene(input: &str) -> Result<Scene> {
    let doc: SceneDoc = json5::from_str(input)?;
    build_scene(&doc)
}

pub fn build_scene(doc: &SceneDoc) -> Result<Scene> {
    let mut model = GraphModel::new();
    let mut ids: BTreeMap<String, CellId> = BTreeMap::new();

    for cell in &doc.cells {
        if ids.contains_key(&cell.id) {
            return Err(SceneError::DuplicateId(cell.id.clone()));
        }
        let id = match cell.kind {
            SceneKind::Layer => model.add_layer()?,
            kind => {
                let parent = match &cell.parent {
                    Some(parent) => lookup(&ids, &cell.id, "parent", parent)?,
                    None => model.default_parent(),
                };
                let kind = if kind == SceneKind::Edge {
                    CellKind::Edge
                } else {
                    CellKind::Vertex
                };
                model.add_cell(parent, kind)?
            }
        };

        let geometry = match (&cell.geometry, cell.kind) {
            (Some(geometry), _) => Some(geometry.clone()),
            (None, SceneKind::Edge) => Some(Geometry::relative(0.0, 0.0)),
            (None, _) => None,
        };
        model.set_geometry(id, geometry)?;
        model.set_value(id, cell.value.as_deref())?;
        model.set_style(id, cell.style.as_deref())?;
        model.set_visible(id, cell.visible)?;
        model.set_collapsed(id, cell.collapsed)?;
        ids.insert(cell.id.clone(), id);
    }

    for cell in doc.cells.iter().filter(|c| c.kind == SceneKind::Edge) {
        let Some(&edge) = ids.get(&cell.id) else {
            continue;
        };
        if let Some(source) = &cell.source {
            let terminal = lookup(&ids, &cell.id, "source", source)?;
            model.set_terminal(edge, Some(terminal), true)?;
        }
        if let Some(target) = &cell.target {
            let terminal = lookup(&ids, &cell.id, "target", target)?;
            model.set_terminal(edge, Some(terminal), false)?;
        }
    }

    model.take_changes();
    tracing::debug!(cells = ids.len(), "built scene");
    Ok(Scene { model, ids })
}

fn lookup(
    ids: &BTreeMap<String, CellId>,
    cell: &str,
    role: &'static str,
    id: &str,
) -> Result<CellId> {
    ids.get(id)
        .copied()
        .ok_or_else(|| SceneError::UnknownReference {
            cell: cell.to_string(),
            role,
            id: id.to_string(),
        })
}
