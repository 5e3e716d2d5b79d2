use std::collections::HashSet;

use crate::board::Board;
use crate::constants::get_ghost_base_size;
use crate::pathfinding::reachable_where;
use crate::rng::Rng;
use crate::types::{Cell, MazeType, Vec2};

/// Walled ghost house centred on the board with a single door on its bottom edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostBase {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
    pub door: Vec2,
}

impl GhostBase {
    pub fn for_board(rows: i32, cols: i32) -> Self {
        let (height, width) = get_ghost_base_size(rows, cols);
        let top = rows / 2 - height / 2;
        let left = cols / 2 - width / 2;
        Self {
            top,
            left,
            width,
            height,
            door: Vec2::new(left + width / 2, top + height - 1),
        }
    }

    /// Anywhere inside the footprint, walls and door included.
    pub fn covers(&self, pos: Vec2) -> bool {
        pos.y >= self.top
            && pos.y < self.top + self.height
            && pos.x >= self.left
            && pos.x < self.left + self.width
    }

    pub fn is_perimeter(&self, pos: Vec2) -> bool {
        self.covers(pos)
            && (pos.y == self.top
                || pos.y == self.top + self.height - 1
                || pos.x == self.left
                || pos.x == self.left + self.width - 1)
    }

    pub fn is_interior(&self, pos: Vec2) -> bool {
        self.covers(pos) && !self.is_perimeter(pos)
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedMaze {
    pub board: Board,
    pub player_spawn: Vec2,
    pub ghost_spawns: Vec<Vec2>,
    pub base: GhostBase,
    pub dot_count: i32,
}

/// Geometry shared by every carving stage.
#[derive(Clone, Copy, Debug)]
pub struct MazeLayout {
    rows: i32,
    cols: i32,
    half_cols: i32,
    base: GhostBase,
}

impl MazeLayout {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            half_cols: cols / 2 + 1,
            base: GhostBase::for_board(rows, cols),
        }
    }

    fn spawn_col(&self) -> i32 {
        self.cols / 2
    }

    fn in_base(&self, x: i32, y: i32) -> bool {
        self.base.covers(Vec2::new(x, y))
    }

    fn protected(&self, x: i32, y: i32) -> bool {
        self.in_base(x, y) || (y == 1 && (x - self.spawn_col()).abs() <= 1)
    }
}

pub fn generate(rows: i32, cols: i32, maze_type: MazeType, rng: &mut Rng) -> GeneratedMaze {
    match maze_type {
        MazeType::Classic | MazeType::Hybrid | MazeType::Blocky | MazeType::RecursiveDivision => {
            generate_hybrid(rows, cols, rng)
        }
    }
}

fn generate_hybrid(rows: i32, cols: i32, rng: &mut Rng) -> GeneratedMaze {
    let layout = MazeLayout::new(rows, cols);
    let mut board = Board::new(rows, cols);

    carve_left_half(&mut board, &layout, rng);
    mirror_left_half(&mut board, &layout);
    open_loops(&mut board, &layout, rng);

    let door = layout.base.door;
    board.set_cell(door.x, door.y, Cell::Empty);
    if door.y + 1 < rows - 1 {
        board.set_cell(door.x, door.y + 1, Cell::Empty);
    }
    remove_dead_ends(&mut board, &layout);

    seal_border(&mut board);
    stamp_ghost_base(&mut board, &layout);
    let spawn = reserve_player_spawn(&mut board, &layout);
    link_spawn_to_base(&mut board, &layout, spawn);
    let dot_count = place_dots(&mut board, spawn);

    let player_spawn = board.find_first(Cell::PlayerSpawn).unwrap_or(spawn);
    let ghost_spawns = board.find_all(Cell::GhostSpawn);

    GeneratedMaze {
        board,
        player_spawn,
        ghost_spawns,
        base: layout.base,
        dot_count,
    }
}

fn carve_left_half(board: &mut Board, layout: &MazeLayout, rng: &mut Rng) {
    let rows = layout.rows;
    let half_cols = layout.half_cols;
    let mut visited: HashSet<Vec2> = HashSet::new();

    let start = Vec2::new(
        1 + rng.int(0, ((half_cols - 2) / 2 - 1).max(0)) * 2,
        1 + rng.int(0, ((rows - 2) / 2 - 1).max(0)) * 2,
    );
    visited.insert(start);
    board.set_cell(start.x, start.y, Cell::Empty);
    let mut stack = vec![start];

    const STEPS: [(i32, i32); 4] = [(0, 2), (0, -2), (2, 0), (-2, 0)];
    while let Some(&current) = stack.last() {
        let options: Vec<(i32, i32)> = STEPS
            .iter()
            .copied()
            .filter(|(dx, dy)| {
                let nx = current.x + dx;
                let ny = current.y + dy;
                ny > 0
                    && ny < rows - 1
                    && nx > 0
                    && nx < half_cols - 1
                    && !visited.contains(&Vec2::new(nx, ny))
                    && !layout.in_base(nx, ny)
            })
            .collect();

        if options.is_empty() {
            stack.pop();
            continue;
        }

        let (dx, dy) = options[rng.pick_index(options.len())];
        let next = Vec2::new(current.x + dx, current.y + dy);
        let between = Vec2::new(current.x + dx / 2, current.y + dy / 2);
        if layout.in_base(between.x, between.y) {
            stack.pop();
            continue;
        }
        board.set_cell(between.x, between.y, Cell::Empty);
        board.set_cell(next.x, next.y, Cell::Empty);
        visited.insert(next);
        stack.push(next);
    }
}

fn mirror_left_half(board: &mut Board, layout: &MazeLayout) {
    for y in 1..layout.rows - 1 {
        for x in 1..layout.half_cols {
            let mirror_x = layout.cols - 1 - x;
            if !layout.protected(mirror_x, y) {
                let cell = board.cell(x, y);
                board.set_cell(mirror_x, y, cell);
            }
        }
    }
}

fn open_loops(board: &mut Board, layout: &MazeLayout, rng: &mut Rng) {
    let loops = layout.rows * layout.cols / 12;
    for _ in 0..loops {
        let y = rng.int(1, layout.rows - 2);
        let x = rng.int(1, (layout.half_cols - 2).max(1));
        if board.cell(x, y) != Cell::Wall || layout.protected(x, y) {
            continue;
        }
        board.set_cell(x, y, Cell::Empty);
        let mirror_x = layout.cols - 1 - x;
        if !layout.protected(mirror_x, y) {
            board.set_cell(mirror_x, y, Cell::Empty);
        }
    }
}

/// Carves the last wall next to every empty cell that has exactly one empty
/// neighbour, repeating until a pass changes nothing. Returns the number of
/// cells carved.
pub fn remove_dead_ends(board: &mut Board, layout: &MazeLayout) -> usize {
    let mut carved = 0;
    loop {
        let mut changed = false;
        for y in 1..layout.rows - 1 {
            for x in 1..layout.cols - 1 {
                if board.cell(x, y) != Cell::Empty || layout.protected(x, y) {
                    continue;
                }
                let mut open = 0;
                let mut last_wall = None;
                for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    match board.cell(x + dx, y + dy) {
                        Cell::Empty => open += 1,
                        Cell::Wall => last_wall = Some(Vec2::new(x + dx, y + dy)),
                        _ => {}
                    }
                }
                if open == 1 {
                    if let Some(wall) = last_wall {
                        board.set_cell(wall.x, wall.y, Cell::Empty);
                        carved += 1;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return carved;
        }
    }
}

fn seal_border(board: &mut Board) {
    let rows = board.rows();
    let cols = board.cols();
    for y in 0..rows {
        board.set_cell(0, y, Cell::Wall);
        board.set_cell(cols - 1, y, Cell::Wall);
    }
    for x in 0..cols {
        board.set_cell(x, 0, Cell::Wall);
        board.set_cell(x, rows - 1, Cell::Wall);
    }
}

fn stamp_ghost_base(board: &mut Board, layout: &MazeLayout) {
    let base = layout.base;
    for y in base.top..base.top + base.height {
        for x in base.left..base.left + base.width {
            let pos = Vec2::new(x, y);
            let cell = if base.is_perimeter(pos) {
                Cell::Wall
            } else {
                Cell::GhostSpawn
            };
            board.set_cell(x, y, cell);
        }
    }
    board.set_cell(base.door.x, base.door.y, Cell::GhostSpawn);

    for y in base.top - 1..=base.top + base.height {
        for x in base.left - 1..=base.left + base.width {
            let on_border = y <= 0 || x <= 0 || y >= layout.rows - 1 || x >= layout.cols - 1;
            if on_border || base.covers(Vec2::new(x, y)) {
                continue;
            }
            board.set_cell(x, y, Cell::Empty);
        }
    }
}

fn reserve_player_spawn(board: &mut Board, layout: &MazeLayout) -> Vec2 {
    let col = layout.spawn_col();
    for x in col - 1..=col + 1 {
        board.set_cell(x, 1, Cell::PlayerSpawn);
    }
    Vec2::new(col, 1)
}

fn walkable_before_dots(cell: Cell) -> bool {
    matches!(cell, Cell::Empty | Cell::PowerDot | Cell::PlayerSpawn)
}

/// Small boards can wall the spawn strip off from the rest of the maze. When the
/// corridor above the ghost house is out of reach, open the spawn column down to it.
fn link_spawn_to_base(board: &mut Board, layout: &MazeLayout, spawn: Vec2) {
    let above_base = Vec2::new(layout.base.door.x, layout.base.top - 1);
    let reachable = reachable_where(board, spawn, walkable_before_dots);
    if reachable.contains(&above_base) {
        return;
    }
    for y in 2..=above_base.y {
        board.set_cell(above_base.x, y, Cell::Empty);
    }
}

fn place_dots(board: &mut Board, spawn: Vec2) -> i32 {
    let reachable = reachable_where(board, spawn, walkable_before_dots);
    let rows = board.rows();
    let cols = board.cols();
    let mut dot_count = 0;
    for y in 1..rows - 1 {
        for x in 1..cols - 1 {
            if board.cell(x, y) == Cell::Empty && reachable.contains(&Vec2::new(x, y)) {
                board.set_cell(x, y, Cell::Dot);
                dot_count += 1;
            }
        }
    }
    for (x, y) in [(1, 1), (cols - 2, 1), (1, rows - 2), (cols - 2, rows - 2)] {
        if board.cell(x, y) == Cell::Dot {
            board.set_cell(x, y, Cell::PowerDot);
        }
    }
    board.set_reachable(&reachable);
    dot_count
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::pathfinding::reachable_from;
    use crate::rng::Rng;

    fn assert_maze_invariants(maze: &GeneratedMaze, label: &str) {
        let board = &maze.board;
        let rows = board.rows();
        let cols = board.cols();

        for x in 0..cols {
            assert_eq!(board.cell(x, 0), Cell::Wall, "{label}: top border open at {x}");
            assert_eq!(board.cell(x, rows - 1), Cell::Wall, "{label}: bottom border open at {x}");
        }
        for y in 0..rows {
            assert_eq!(board.cell(0, y), Cell::Wall, "{label}: left border open at {y}");
            assert_eq!(board.cell(cols - 1, y), Cell::Wall, "{label}: right border open at {y}");
        }

        let base = maze.base;
        let openings: Vec<Vec2> = (base.top..base.top + base.height)
            .flat_map(|y| (base.left..base.left + base.width).map(move |x| Vec2::new(x, y)))
            .filter(|pos| base.is_perimeter(*pos) && board.cell_at(*pos) != Cell::Wall)
            .collect();
        assert_eq!(openings, vec![base.door], "{label}: base must have one door");
        assert_eq!(base.door.y, base.top + base.height - 1);

        let reachable = reachable_from(board, maze.player_spawn);
        for y in 0..rows {
            for x in 0..cols {
                let cell = board.cell(x, y);
                if matches!(cell, Cell::Dot | Cell::PowerDot) {
                    assert!(
                        reachable.contains(&Vec2::new(x, y)),
                        "{label}: dot is unreachable at ({x},{y})"
                    );
                }
            }
        }

        let dots = (board.count(Cell::Dot) + board.count(Cell::PowerDot)) as i32;
        assert_eq!(dots, maze.dot_count, "{label}: dot count mismatch");
        assert!(maze.dot_count > 0, "{label}: maze has no dots");
    }

    #[test]
    fn generated_mazes_hold_structural_invariants() {
        for seed in 0..60u64 {
            for (rows, cols) in [(10, 10), (20, 20), (15, 31), (40, 25)] {
                let mut rng = Rng::new(seed);
                let maze = generate(rows, cols, MazeType::Hybrid, &mut rng);
                assert_maze_invariants(&maze, &format!("seed={seed} {rows}x{cols}"));
            }
        }
    }

    #[test]
    fn spawn_strip_and_base_are_where_expected() {
        let mut rng = Rng::new(3);
        let maze = generate(20, 20, MazeType::Hybrid, &mut rng);
        assert_eq!(maze.player_spawn, Vec2::new(9, 1));
        assert_eq!(maze.board.count(Cell::PlayerSpawn), 3);
        assert_eq!(
            maze.base,
            GhostBase {
                top: 9,
                left: 9,
                width: 3,
                height: 3,
                door: Vec2::new(10, 11),
            }
        );
        assert_eq!(maze.ghost_spawns, vec![Vec2::new(10, 10), Vec2::new(10, 11)]);
        assert_eq!(maze.board.cell(10, 12), Cell::Dot);
    }

    #[test]
    fn wide_boards_get_a_wider_base() {
        let mut rng = Rng::new(8);
        let maze = generate(30, 30, MazeType::Hybrid, &mut rng);
        assert_eq!((maze.base.height, maze.base.width), (3, 5));
        assert_eq!(maze.ghost_spawns.len(), 4);
    }

    #[test]
    fn same_seed_builds_the_same_maze() {
        let a = generate(25, 25, MazeType::Hybrid, &mut Rng::new(77));
        let b = generate(25, 25, MazeType::Hybrid, &mut Rng::new(77));
        assert_eq!(a.board, b.board);
        let c = generate(25, 25, MazeType::Blocky, &mut Rng::new(77));
        assert_eq!(a.board, c.board);
    }

    #[test]
    fn dead_end_removal_reaches_a_fixpoint() {
        let mut board = Board::from_tiles(&[
            "#########",
            "#   #   #",
            "# ### # #",
            "#     # #",
            "#########",
        ]);
        let layout = MazeLayout::new(board.rows(), board.cols());
        let first = remove_dead_ends(&mut board, &layout);
        assert!(first > 0);
        assert_eq!(remove_dead_ends(&mut board, &layout), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn any_valid_size_yields_a_sound_maze(
            rows in 10i32..=60,
            cols in 10i32..=60,
            seed in any::<u64>(),
        ) {
            let maze = generate(rows, cols, MazeType::Hybrid, &mut Rng::new(seed));
            assert_maze_invariants(&maze, &format!("seed={seed} {rows}x{cols}"));
            let mut board = maze.board.clone();
            let layout = MazeLayout::new(rows, cols);
            remove_dead_ends(&mut board, &layout);
            prop_assert_eq!(remove_dead_ends(&mut board, &layout), 0);
        }
    }
}
