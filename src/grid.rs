//! A toroidal, multi-occupancy grid of cells.
//!
//! Every agent occupies exactly one cell. The grid keeps, per cell, the ids of the agents in it
//! (in arrival order) and, per agent, the cell it is in, so relocating an agent does not need
//! a search. All neighbourhood computations wrap around the edges.
use log::trace;
use serde::{Deserialize, Serialize};

use crate::agents::{set_agent_position, AgentId};
use crate::context::Context;
use crate::define_data_plugin;
use crate::parameters::ContextParametersExt;
use crate::random::ContextRandomExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    width: usize,
    height: usize,
    cells: Vec<Vec<AgentId>>,
    locations: Vec<Option<Position>>,
}

impl SpatialGrid {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(
            width > 0 && height > 0,
            "grid dimensions must be positive, got {width}x{height}"
        );
        SpatialGrid {
            width,
            height,
            cells: vec![Vec::new(); width * height],
            locations: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    fn cell_index(&self, position: Position) -> usize {
        assert!(
            self.contains(position),
            "position ({}, {}) is outside the {}x{} grid",
            position.x,
            position.y,
            self.width,
            self.height
        );
        position.y * self.width + position.x
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn wrap(&self, position: Position, dx: isize, dy: isize) -> Position {
        let x = (position.x as isize + dx).rem_euclid(self.width as isize);
        let y = (position.y as isize + dy).rem_euclid(self.height as isize);
        Position::new(x as usize, y as usize)
    }

    /// The cells within Chebyshev distance `radius` of `position`, wrapping around the edges.
    ///
    /// Each cell appears once even when the neighbourhood wraps onto itself on a small grid.
    /// With `include_center` false the offset `(0, 0)` is skipped, but a wrapped offset that
    /// lands back on `position` is kept.
    #[allow(clippy::cast_possible_wrap)]
    pub fn neighbourhood(
        &self,
        position: Position,
        radius: usize,
        include_center: bool,
    ) -> Vec<Position> {
        let radius = radius as isize;
        let mut cells = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                let cell = self.wrap(position, dx, dy);
                if !cells.contains(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// The agents in the cell at `position`, in arrival order.
    pub fn occupants(&self, position: Position) -> &[AgentId] {
        &self.cells[self.cell_index(position)]
    }

    pub fn is_empty(&self, position: Position) -> bool {
        self.occupants(position).is_empty()
    }

    /// The cell `agent_id` occupies, if it has been placed.
    pub fn location(&self, agent_id: AgentId) -> Option<Position> {
        self.locations.get(agent_id.0).copied().flatten()
    }

    /// Moves `agent_id` into the cell at `position`, removing it from its previous cell.
    pub fn place(&mut self, agent_id: AgentId, position: Position) {
        let new_index = self.cell_index(position);
        if let Some(previous) = self.location(agent_id) {
            let previous_index = self.cell_index(previous);
            self.cells[previous_index].retain(|other| *other != agent_id);
        }
        self.cells[new_index].push(agent_id);
        if self.locations.len() <= agent_id.0 {
            self.locations.resize(agent_id.0 + 1, None);
        }
        self.locations[agent_id.0] = Some(position);
    }
}

define_data_plugin!(GridPlugin, SpatialGrid, |context| {
    let parameters = context.get_parameters();
    SpatialGrid::new(parameters.width, parameters.height)
});

pub trait ContextGridExt {
    /// Creates the grid with the dimensions of the stored parameters.
    fn init_grid(&mut self);

    /// # Panics
    ///
    /// Panics if the grid has not been initialized.
    fn grid(&self) -> &SpatialGrid;

    /// A uniformly random cell of the grid.
    fn sample_cell(&self) -> Position;

    /// Moves the agent to `position`, keeping the grid and the agent's own position in sync.
    fn place_agent(&mut self, agent_id: AgentId, position: Position);

    /// The other agents sharing the cell of `agent_id`.
    fn get_cohabitants(&self, agent_id: AgentId) -> Vec<AgentId>;
}

impl ContextGridExt for Context {
    fn init_grid(&mut self) {
        let grid = self.get_data_mut(GridPlugin);
        trace!("initialized {}x{} grid", grid.width(), grid.height());
    }

    fn grid(&self) -> &SpatialGrid {
        self.get_data(GridPlugin)
    }

    fn sample_cell(&self) -> Position {
        let (width, height) = (self.grid().width(), self.grid().height());
        let x = self.sample_range(0..width);
        let y = self.sample_range(0..height);
        Position::new(x, y)
    }

    fn place_agent(&mut self, agent_id: AgentId, position: Position) {
        self.get_data_mut(GridPlugin).place(agent_id, position);
        set_agent_position(self, agent_id, position);
    }

    fn get_cohabitants(&self, agent_id: AgentId) -> Vec<AgentId> {
        let grid = self.grid();
        match grid.location(agent_id) {
            Some(position) => grid
                .occupants(position)
                .iter()
                .copied()
                .filter(|other| *other != agent_id)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbourhood_in_open_space() {
        let grid = SpatialGrid::new(10, 10);
        let cells = grid.neighbourhood(Position::new(5, 5), 1, false);
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&Position::new(5, 5)));
        assert!(cells.contains(&Position::new(4, 6)));

        let with_center = grid.neighbourhood(Position::new(5, 5), 2, true);
        assert_eq!(with_center.len(), 25);
    }

    #[test]
    fn neighbourhood_wraps_around_edges() {
        let grid = SpatialGrid::new(10, 8);
        let cells = grid.neighbourhood(Position::new(0, 0), 1, false);
        assert_eq!(cells.len(), 8);
        assert!(cells.contains(&Position::new(9, 7)));
        assert!(cells.contains(&Position::new(1, 7)));
        assert!(cells.contains(&Position::new(9, 1)));
    }

    #[test]
    fn neighbourhood_on_tiny_grid_is_deduplicated() {
        let grid = SpatialGrid::new(1, 1);
        assert_eq!(
            grid.neighbourhood(Position::new(0, 0), 1, false),
            vec![Position::new(0, 0)]
        );

        let grid = SpatialGrid::new(2, 2);
        let cells = grid.neighbourhood(Position::new(0, 0), 3, true);
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn radius_zero_is_the_cell_itself() {
        let grid = SpatialGrid::new(4, 4);
        assert_eq!(
            grid.neighbourhood(Position::new(2, 3), 0, true),
            vec![Position::new(2, 3)]
        );
        assert!(grid.neighbourhood(Position::new(2, 3), 0, false).is_empty());
    }

    #[test]
    fn place_moves_between_cells() {
        let mut grid = SpatialGrid::new(3, 3);
        let a = AgentId(0);
        let b = AgentId(1);
        grid.place(a, Position::new(1, 1));
        grid.place(b, Position::new(1, 1));
        assert_eq!(grid.occupants(Position::new(1, 1)), &[a, b]);

        grid.place(a, Position::new(2, 0));
        assert_eq!(grid.occupants(Position::new(1, 1)), &[b]);
        assert_eq!(grid.occupants(Position::new(2, 0)), &[a]);
        assert_eq!(grid.location(a), Some(Position::new(2, 0)));
        assert!(grid.is_empty(Position::new(0, 0)));
    }

    #[test]
    fn place_in_same_cell_is_idempotent() {
        let mut grid = SpatialGrid::new(3, 3);
        let a = AgentId(0);
        grid.place(a, Position::new(1, 2));
        grid.place(a, Position::new(1, 2));
        assert_eq!(grid.occupants(Position::new(1, 2)), &[a]);
    }

    #[test]
    #[should_panic(expected = "outside the 3x3 grid")]
    fn place_out_of_range_panics() {
        let mut grid = SpatialGrid::new(3, 3);
        grid.place(AgentId(0), Position::new(3, 0));
    }

    #[test]
    #[should_panic(expected = "grid dimensions must be positive")]
    fn zero_sized_grid_panics() {
        SpatialGrid::new(0, 4);
    }
}
