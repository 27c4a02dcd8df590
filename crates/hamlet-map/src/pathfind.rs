//! Weighted shortest paths over the tile grid.
//!
//! Best-first search on `f = g + h` with `h` the Manhattan distance.
//! Every step costs at least 1 and moves are 4-directional, so `h`
//! never overestimates and never drops by more than one step's cost:
//! a cell is final the first time it is popped.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hamlet_core::GridCell;

use crate::grid::TileGrid;

const NO_PARENT: usize = usize::MAX;

/// Cheapest 4-directional route from `start` to `goal`.
///
/// The result excludes `start` and ends at `goal`. It is empty when
/// `start == goal`, when either endpoint is off the grid, when `goal`
/// is impassable, or when no route exists. Ties on `f` expand in
/// insertion order.
pub fn find_path(grid: &TileGrid, start: GridCell, goal: GridCell) -> Vec<GridCell> {
    if start == goal {
        return Vec::new();
    }
    let (Some(start_idx), Some(goal_idx)) = (grid.index(start), grid.index(goal)) else {
        return Vec::new();
    };
    if !grid.cost_of(goal).is_passable() {
        return Vec::new();
    }

    let n = grid.cell_count();
    let mut best = vec![u32::MAX; n];
    let mut parent = vec![NO_PARENT; n];
    let mut closed = vec![false; n];
    // (f, insertion sequence, cell index); the sequence makes ties FIFO.
    let mut open: BinaryHeap<Reverse<(u32, u64, usize)>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    best[start_idx] = 0;
    open.push(Reverse((start.manhattan(goal), seq, start_idx)));

    while let Some(Reverse((_, _, idx))) = open.pop() {
        if closed[idx] {
            continue;
        }
        closed[idx] = true;
        if idx == goal_idx {
            return reconstruct(grid, &parent, start_idx, goal_idx);
        }
        let cell = grid.cell_at(idx);
        let g = best[idx];
        for (nb, step) in grid.passable_neighbours(cell) {
            let Some(ni) = grid.index(nb) else {
                continue;
            };
            if closed[ni] {
                continue;
            }
            let tentative = g.saturating_add(step);
            if tentative < best[ni] {
                best[ni] = tentative;
                parent[ni] = idx;
                seq += 1;
                open.push(Reverse((tentative.saturating_add(nb.manhattan(goal)), seq, ni)));
            }
        }
    }
    Vec::new()
}

fn reconstruct(grid: &TileGrid, parent: &[usize], start_idx: usize, goal_idx: usize) -> Vec<GridCell> {
    let mut path = Vec::new();
    let mut cur = goal_idx;
    while cur != start_idx && cur != NO_PARENT {
        path.push(grid.cell_at(cur));
        cur = parent[cur];
    }
    path.reverse();
    path
}

/// Total entry cost of walking `path` from `start`.
///
/// `None` if a step is not between adjacent cells or enters an
/// impassable cell.
pub fn path_cost(grid: &TileGrid, start: GridCell, path: &[GridCell]) -> Option<u32> {
    let mut prev = start;
    let mut total: u32 = 0;
    for &cell in path {
        if prev.manhattan(cell) != 1 {
            return None;
        }
        total = total.checked_add(grid.cost_of(cell).finite()?)?;
        prev = cell;
    }
    Some(total)
}
