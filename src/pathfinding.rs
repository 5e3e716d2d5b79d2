//! Breadth-first search over board connectivity.
//! Used by returning ghosts, the maze generator and the autopilot.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::board::Board;
use crate::types::{Cell, Vec2};

/// Shortest four-directional path from `start` to `goal`, excluding `start`
/// and including `goal`. Empty when the goal is the start or unreachable.
pub fn shortest_path(board: &Board, start: Vec2, goal: Vec2) -> Vec<Vec2> {
    if start == goal || !board.is_open(goal.x, goal.y) {
        return Vec::new();
    }
    search(board, start, &HashSet::new(), |pos, _| pos == goal).unwrap_or_default()
}

/// Every open cell connected to `start`, including `start` itself when open.
pub fn reachable_from(board: &Board, start: Vec2) -> HashSet<Vec2> {
    reachable_where(board, start, |cell| cell != Cell::Wall)
}

/// Flood fill restricted to cells whose contents satisfy `passable`.
pub fn reachable_where<F>(board: &Board, start: Vec2, passable: F) -> HashSet<Vec2>
where
    F: Fn(Cell) -> bool,
{
    let mut visited = HashSet::new();
    if !board.in_bounds(start.x, start.y) || !passable(board.cell_at(start)) {
        return visited;
    }

    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for next in board.valid_moves(current.x, current.y) {
            if passable(board.cell_at(next)) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited
}

/// Path to the closest cell (other than `start`) whose contents satisfy
/// `predicate`. Ties resolve by neighbour order.
pub fn nearest_matching<F>(board: &Board, start: Vec2, predicate: F) -> Option<Vec<Vec2>>
where
    F: Fn(Cell) -> bool,
{
    nearest_matching_avoiding(board, start, &HashSet::new(), predicate)
}

/// Like [`nearest_matching`] but never routes through `avoid`.
pub fn nearest_matching_avoiding<F>(
    board: &Board,
    start: Vec2,
    avoid: &HashSet<Vec2>,
    predicate: F,
) -> Option<Vec<Vec2>>
where
    F: Fn(Cell) -> bool,
{
    search(board, start, avoid, |pos, cell| pos != start && predicate(cell))
}

fn search<F>(board: &Board, start: Vec2, avoid: &HashSet<Vec2>, is_goal: F) -> Option<Vec<Vec2>>
where
    F: Fn(Vec2, Cell) -> bool,
{
    let mut came_from: HashMap<Vec2, Vec2> = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if is_goal(current, board.cell_at(current)) {
            return Some(reconstruct_path(&came_from, start, current));
        }
        for next in board.valid_moves(current.x, current.y) {
            if avoid.contains(&next) || !visited.insert(next) {
                continue;
            }
            came_from.insert(next, current);
            queue.push_back(next);
        }
    }
    None
}

fn reconstruct_path(came_from: &HashMap<Vec2, Vec2>, start: Vec2, goal: Vec2) -> Vec<Vec2> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(prev) => current = *prev,
            None => break,
        }
    }
    path.reverse();
    path
}
