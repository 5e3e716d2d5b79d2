use std::collections::HashSet;

use crate::rng::Rng;
use crate::types::{Cell, Direction, Vec2};

/// Row-major grid of cells. `x` is the column and `y` the row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
    reachable: Option<Vec<bool>>,
}

impl Board {
    pub fn new(rows: i32, cols: i32) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![Cell::Wall; (rows * cols) as usize],
            reachable: None,
        }
    }

    /// Builds a board from rendered rows. Unknown characters become walls and
    /// short rows are padded with walls.
    pub fn from_tiles<S: AsRef<str>>(tiles: &[S]) -> Self {
        let rows = tiles.len() as i32;
        let cols = tiles
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0) as i32;
        let mut board = Self::new(rows, cols);
        for (y, row) in tiles.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                let cell = Cell::from_tile_char(ch).unwrap_or(Cell::Wall);
                board.set_cell(x as i32, y as i32, cell);
            }
        }
        board
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.cols && y < self.rows
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some((y * self.cols + x) as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Cell {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(Cell::Wall)
    }

    pub fn cell_at(&self, pos: Vec2) -> Cell {
        self.cell(pos.x, pos.y)
    }

    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
        }
    }

    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) != Cell::Wall
    }

    pub fn is_valid_move(&self, x: i32, y: i32, dir: Direction) -> bool {
        if dir == Direction::None {
            return false;
        }
        let next = Vec2::new(x, y).step(dir);
        self.is_open(next.x, next.y)
    }

    /// Open neighbours in right, left, down, up order.
    pub fn valid_moves(&self, x: i32, y: i32) -> Vec<Vec2> {
        let origin = Vec2::new(x, y);
        Direction::MOVES
            .iter()
            .filter(|dir| self.is_valid_move(x, y, **dir))
            .map(|dir| origin.step(*dir))
            .collect()
    }

    pub fn valid_directions(&self, x: i32, y: i32) -> Vec<Direction> {
        Direction::MOVES
            .iter()
            .copied()
            .filter(|dir| self.is_valid_move(x, y, *dir))
            .collect()
    }

    pub fn set_reachable(&mut self, cells: &HashSet<Vec2>) {
        let mut mask = vec![false; self.cells.len()];
        for pos in cells {
            if let Some(idx) = self.index(pos.x, pos.y) {
                mask[idx] = true;
            }
        }
        self.reachable = Some(mask);
    }

    fn is_spawnable(&self, x: i32, y: i32) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        if self.cells[idx] == Cell::Wall {
            return false;
        }
        if let Some(mask) = &self.reachable {
            if !mask[idx] {
                return false;
            }
        }
        !self.valid_moves(x, y).is_empty()
    }

    /// Samples uniformly until it lands on an open cell the player could walk
    /// away from. Falls back to a row-major scan after `rows * cols * 8` misses.
    pub fn random_reachable_position(&self, rng: &mut Rng) -> Vec2 {
        let attempts = self.rows * self.cols * 8;
        for _ in 0..attempts {
            let x = rng.int(0, self.cols - 1);
            let y = rng.int(0, self.rows - 1);
            if self.is_spawnable(x, y) {
                return Vec2::new(x, y);
            }
        }
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.is_spawnable(x, y) {
                    return Vec2::new(x, y);
                }
            }
        }
        self.find_all_open().first().copied().unwrap_or_default()
    }

    fn find_all_open(&self) -> Vec<Vec2> {
        self.positions()
            .filter(|pos| self.is_open(pos.x, pos.y))
            .collect()
    }

    fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Vec2::new(x, y)))
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    pub fn find_first(&self, cell: Cell) -> Option<Vec2> {
        self.positions().find(|pos| self.cell_at(*pos) == cell)
    }

    pub fn find_all(&self, cell: Cell) -> Vec<Vec2> {
        self.positions()
            .filter(|pos| self.cell_at(*pos) == cell)
            .collect()
    }

    pub fn to_tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols as usize)
            .map(|row| row.iter().map(|cell| cell.tile_char()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::rng::Rng;

    fn arb_cell() -> impl Strategy<Value = Cell> {
        prop_oneof![
            Just(Cell::Empty),
            Just(Cell::Wall),
            Just(Cell::Dot),
            Just(Cell::PowerDot),
            Just(Cell::GhostSpawn),
            Just(Cell::PlayerSpawn),
        ]
    }

    fn sample() -> Board {
        Board::from_tiles(&[
            "#####", //
            "#P..#", //
            "#.#o#", //
            "#####",
        ])
    }

    #[test]
    fn tiles_round_trip_through_the_renderer() {
        let board = sample();
        assert_eq!(board.rows(), 4);
        assert_eq!(board.cols(), 5);
        assert_eq!(board.to_tiles(), vec!["#####", "#P..#", "#.#o#", "#####"]);
        assert_eq!(board.count(Cell::Dot), 3);
        assert_eq!(board.find_first(Cell::PlayerSpawn), Some(Vec2::new(1, 1)));
        assert_eq!(board.find_all(Cell::PowerDot), vec![Vec2::new(3, 2)]);
    }

    #[test]
    fn moves_are_listed_right_left_down_up() {
        let board = sample();
        assert_eq!(
            board.valid_moves(2, 1),
            vec![Vec2::new(3, 1), Vec2::new(1, 1)]
        );
        assert_eq!(
            board.valid_moves(1, 1),
            vec![Vec2::new(2, 1), Vec2::new(1, 2)]
        );
        assert!(!board.is_valid_move(1, 1, Direction::Up));
        assert!(!board.is_valid_move(1, 1, Direction::None));
        assert!(!board.is_valid_move(0, 0, Direction::Left));
    }

    #[test]
    fn random_position_has_an_exit() {
        let board = sample();
        let mut rng = Rng::new(5);
        for _ in 0..200 {
            let pos = board.random_reachable_position(&mut rng);
            assert_ne!(board.cell_at(pos), Cell::Wall);
            assert!(!board.valid_moves(pos.x, pos.y).is_empty());
        }
    }

    #[test]
    fn random_position_respects_the_reachability_mask() {
        let mut board = Board::from_tiles(&[
            "#######", //
            "#..#..#", //
            "#######",
        ]);
        let left: HashSet<Vec2> = [Vec2::new(1, 1), Vec2::new(2, 1)].into_iter().collect();
        board.set_reachable(&left);
        let mut rng = Rng::new(9);
        for _ in 0..200 {
            let pos = board.random_reachable_position(&mut rng);
            assert!(left.contains(&pos), "{pos:?} is outside the mask");
        }
    }

    #[test]
    fn random_position_terminates_on_a_sealed_board() {
        let board = Board::new(10, 10);
        let mut rng = Rng::new(1);
        assert_eq!(board.random_reachable_position(&mut rng), Vec2::new(0, 0));
    }

    proptest! {
        #[test]
        fn out_of_range_reads_are_walls_and_writes_are_ignored(
            x in prop_oneof![(-500i32..0), (20i32..500)],
            y in prop_oneof![(-500i32..0), (15i32..500)],
            cell in arb_cell(),
        ) {
            let mut board = Board::new(15, 20);
            board.set_cell(1, 1, Cell::Dot);
            let before = board.clone();
            prop_assert_eq!(board.cell(x, y), Cell::Wall);
            board.set_cell(x, y, cell);
            prop_assert_eq!(board, before);
        }

        #[test]
        fn in_range_writes_are_read_back(
            x in 0i32..20,
            y in 0i32..15,
            cell in arb_cell(),
        ) {
            let mut board = Board::new(15, 20);
            board.set_cell(x, y, cell);
            prop_assert_eq!(board.cell(x, y), cell);
        }
    }
}
