use crate::geometry::Point;
use crate::style;
use crate::view::CellState;

/// Where an edge end attaches to its terminal.
///
/// `point` is normalized to the terminal's perimeter bounds; `None` leaves
/// the end floating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionConstraint {
    pub point: Option<Point>,
    pub perimeter: bool,
    pub dx: f64,
    pub dy: f64,
}

impl Default for ConnectionConstraint {
    fn default() -> Self {
        Self {
            point: None,
            perimeter: true,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

pub trait ConstraintResolver {
    fn constraint(
        &self,
        edge: &CellState,
        terminal: Option<&CellState>,
        source: bool,
    ) -> ConnectionConstraint;
}

/// Reads `exitX`/`exitY`/`exitPerimeter`/`exitDx`/`exitDy` (or the `entry*`
/// keys for targets) from the edge style.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleConstraints;

impl ConstraintResolver for StyleConstraints {
    fn constraint(
        &self,
        edge: &CellState,
        _terminal: Option<&CellState>,
        source: bool,
    ) -> ConnectionConstraint {
        let (kx, ky, kp, kdx, kdy) = if source {
            (
                style::EXIT_X,
                style::EXIT_Y,
                style::EXIT_PERIMETER,
                style::EXIT_DX,
                style::EXIT_DY,
            )
        } else {
            (
                style::ENTRY_X,
                style::ENTRY_Y,
                style::ENTRY_PERIMETER,
                style::ENTRY_DX,
                style::ENTRY_DY,
            )
        };
        let s = &edge.style;
        let point = match (s.number(kx), s.number(ky)) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };
        if point.is_none() {
            return ConnectionConstraint::default();
        }
        ConnectionConstraint {
            point,
            perimeter: s.flag_or(kp, true),
            dx: s.number_or(kdx, 0.0),
            dy: s.number_or(kdy, 0.0),
        }
    }
}
