use crate::geometry::Rect;
use crate::model::{CellId, CellKind};
use crate::render::RenderListener;
use crate::view::{CellState, GraphView};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDump {
    pub scale: f64,
    pub translate: [f64; 2],
    pub graph_bounds: Rect,
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    pub cell: CellId,
    pub name: Option<String>,
    pub kind: CellKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub origin: [f64; 2],
    pub label_anchor: [f64; 2],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    pub source: Option<CellId>,
    pub target: Option<CellId>,
    pub shape_bounds: Option<Rect>,
    pub label_bounds: Option<Rect>,
}

impl StateEntry {
    fn from_state(state: &CellState, name: Option<String>) -> Self {
        let anchor = state.label_anchor();
        StateEntry {
            cell: state.cell,
            name,
            kind: state.kind,
            x: state.x(),
            y: state.y(),
            width: state.width(),
            height: state.height(),
            origin: [state.origin.x, state.origin.y],
            label_anchor: [anchor.x, anchor.y],
            points: state.absolute_points.iter().map(|p| [p.x, p.y]).collect(),
            length: state.is_edge().then_some(state.length),
            source: state.visible_source.map(|h| h.cell()),
            target: state.visible_target.map(|h| h.cell()),
            shape_bounds: state.shape_bounds,
            label_bounds: state.label_bounds,
        }
    }
}

impl StateDump {
    /// Snapshot of every cached vertex and edge state, in cell id order.
    pub fn from_view<R: RenderListener>(
        view: &GraphView<R>,
        name: impl Fn(CellId) -> Option<String>,
    ) -> Self {
        let translate = view.translate();
        let states = view
            .states()
            .iter()
            .filter(|s| s.kind != CellKind::Plain)
            .map(|s| StateEntry::from_state(s, name(s.cell)))
            .collect();
        StateDump {
            scale: view.scale(),
            translate: [translate.x, translate.y],
            graph_bounds: view.graph_bounds(),
            states,
        }
    }
}

pub fn write_state_dump(path: &Path, dump: &StateDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

pub fn print_state_dump(dump: &StateDump) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut writer, dump)?;
    writeln!(writer)?;
    Ok(())
}
