//! Rectangular walled room on a fixed tile grid
//!
//! The boundary is lined with static walls except for a gap in the middle
//! of each side; enemies enter through those gaps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GRID_CELL, ROOM_GRID, SPAWN_GAP_HALF};
use crate::{cell_center, grid_index};

/// Wall sprite variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallVariant {
    Corner,
    Horizontal,
    Vertical,
}

/// A static boundary wall occupying one tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub pos: Vec2,
    pub variant: WallVariant,
    pub grid_idx: (i32, i32),
}

impl Wall {
    fn at(idx: (i32, i32), variant: WallVariant) -> Self {
        let pos = cell_center(idx);
        Self {
            pos,
            variant,
            grid_idx: grid_index(pos),
        }
    }
}

/// Room geometry and static occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub grid_w: usize,
    pub grid_h: usize,
    pub cell: f32,
    pub walls: Vec<Wall>,
    pub spawn_pos: Vec<Vec2>,
    occupancy: Vec<bool>,
}

impl Default for Room {
    fn default() -> Self {
        Self::new(ROOM_GRID, ROOM_GRID)
    }
}

impl Room {
    /// Build a walled room of `grid_w x grid_h` tiles with spawn gaps
    pub fn new(grid_w: usize, grid_h: usize) -> Self {
        let mut room = Self::empty(grid_w, grid_h);
        let (w, h) = (grid_w as i32, grid_h as i32);
        let mid_x = w / 2;
        let mid_y = h / 2;
        let gap = SPAWN_GAP_HALF as i32;
        let in_x_gap = |i: i32| (i - mid_x).abs() <= gap;
        let in_y_gap = |j: i32| (j - mid_y).abs() <= gap;

        for i in 0..w {
            for j in [0, h - 1] {
                let corner = i == 0 || i == w - 1;
                if corner {
                    room.add_wall(Wall::at((i, j), WallVariant::Corner));
                } else if in_x_gap(i) {
                    room.spawn_pos.push(cell_center((i, j)));
                } else {
                    room.add_wall(Wall::at((i, j), WallVariant::Horizontal));
                }
            }
        }
        for j in 1..h - 1 {
            for i in [0, w - 1] {
                if in_y_gap(j) {
                    room.spawn_pos.push(cell_center((i, j)));
                } else {
                    room.add_wall(Wall::at((i, j), WallVariant::Vertical));
                }
            }
        }
        room
    }

    /// A room with no walls and no spawn gaps
    pub fn empty(grid_w: usize, grid_h: usize) -> Self {
        Self {
            grid_w,
            grid_h,
            cell: GRID_CELL,
            walls: Vec::new(),
            spawn_pos: Vec::new(),
            occupancy: vec![false; grid_w * grid_h],
        }
    }

    fn add_wall(&mut self, wall: Wall) {
        self.occupy(wall.grid_idx);
        self.walls.push(wall);
    }

    pub fn width(&self) -> f32 {
        self.grid_w as f32 * self.cell
    }

    pub fn height(&self) -> f32 {
        self.grid_h as f32 * self.cell
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width() / 2.0, self.height() / 2.0)
    }

    pub fn in_bounds(&self, idx: (i32, i32)) -> bool {
        idx.0 >= 0 && idx.1 >= 0 && (idx.0 as usize) < self.grid_w && (idx.1 as usize) < self.grid_h
    }

    fn slot(&self, idx: (i32, i32)) -> Option<usize> {
        self.in_bounds(idx)
            .then(|| idx.1 as usize * self.grid_w + idx.0 as usize)
    }

    /// True if the cell is inside the room and nothing occupies it
    pub fn is_free(&self, idx: (i32, i32)) -> bool {
        self.slot(idx).is_some_and(|s| !self.occupancy[s])
    }

    pub fn is_occupied(&self, idx: (i32, i32)) -> bool {
        self.slot(idx).is_some_and(|s| self.occupancy[s])
    }

    /// Mark a cell occupied; returns false if it was already taken or out of bounds
    pub fn occupy(&mut self, idx: (i32, i32)) -> bool {
        match self.slot(idx) {
            Some(s) if !self.occupancy[s] => {
                self.occupancy[s] = true;
                true
            }
            _ => false,
        }
    }

    pub fn release(&mut self, idx: (i32, i32)) {
        if let Some(s) = self.slot(idx) {
            self.occupancy[s] = false;
        }
    }

    /// All occupied cells, row-major
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter(|(_, taken)| **taken)
            .map(|(s, _)| ((s % self.grid_w) as i32, (s / self.grid_w) as i32))
    }

    /// Clamp a point to the room rectangle shrunk by `margin`
    pub fn clamp_inside(&self, pos: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(margin, self.width() - margin),
            pos.y.clamp(margin, self.height() - margin),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_match_occupancy() {
        let room = Room::new(20, 16);
        let mut from_walls: Vec<_> = room.walls.iter().map(|w| w.grid_idx).collect();
        from_walls.sort();
        let mut occupied: Vec<_> = room.occupied_cells().collect();
        occupied.sort();
        assert_eq!(from_walls, occupied);
    }

    #[test]
    fn test_spawn_gaps_on_each_side() {
        let room = Room::new(20, 20);
        // 3 gap tiles per side
        assert_eq!(room.spawn_pos.len(), 12);
        for pos in &room.spawn_pos {
            let idx = grid_index(*pos);
            assert!(!room.is_occupied(idx));
            assert!(idx.0 == 0 || idx.1 == 0 || idx.0 == 19 || idx.1 == 19);
        }
    }

    #[test]
    fn test_corner_variants() {
        let room = Room::new(10, 10);
        let corner = room.walls.iter().find(|w| w.grid_idx == (0, 0)).unwrap();
        assert_eq!(corner.variant, WallVariant::Corner);
        let side = room.walls.iter().find(|w| w.grid_idx == (0, 2)).unwrap();
        assert_eq!(side.variant, WallVariant::Vertical);
        let top = room.walls.iter().find(|w| w.grid_idx == (2, 9)).unwrap();
        assert_eq!(top.variant, WallVariant::Horizontal);
    }

    #[test]
    fn test_occupy_release() {
        let mut room = Room::empty(5, 5);
        assert!(room.is_free((2, 2)));
        assert!(room.occupy((2, 2)));
        assert!(!room.occupy((2, 2)));
        assert!(!room.is_free((2, 2)));
        room.release((2, 2));
        assert!(room.is_free((2, 2)));
        assert!(!room.is_free((5, 0)));
        assert!(!room.occupy((-1, 0)));
    }
}
