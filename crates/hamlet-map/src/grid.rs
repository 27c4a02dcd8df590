//! Cost-annotated rectangular tile grid.

use hamlet_core::GridCell;
use smallvec::SmallVec;

use crate::landmark::LandmarkRegistry;
use crate::terrain::{Cost, TerrainTable};

/// Rectangular array of terrain codes with a precomputed cost per cell.
///
/// Every row has the same length: rows shorter than the widest row are
/// padded with the terrain table's fill code. Landmark cells cost 1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    codes: Vec<char>,
    costs: Vec<Cost>,
}

impl TileGrid {
    /// A grid with no cells ("no map").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse map text.
    ///
    /// If the text contains a `[Map]` header, only the lines between it
    /// and the next `[Section]` header are read. Blank lines are
    /// dropped. Text without any non-blank line yields an empty grid.
    pub fn parse(text: &str, terrain: &TerrainTable, registry: &LandmarkRegistry) -> Self {
        let rows = grid_rows(text);
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Self::empty();
        }
        let height = rows.len();
        let mut codes = Vec::with_capacity(width * height);
        for row in &rows {
            let len = row.chars().count();
            codes.extend(row.chars());
            codes.extend(std::iter::repeat(terrain.fill).take(width - len));
        }
        let costs = codes
            .iter()
            .map(|&code| {
                if registry.is_landmark_code(code) {
                    Cost::Finite(1)
                } else {
                    terrain.cost_of(code)
                }
            })
            .collect();
        Self {
            width,
            height,
            codes,
            costs,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total cells.
    pub fn cell_count(&self) -> usize {
        self.codes.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether `cell` lies inside the grid.
    pub fn contains(&self, cell: GridCell) -> bool {
        self.index(cell).is_some()
    }

    /// Row-major index of `cell`.
    pub fn index(&self, cell: GridCell) -> Option<usize> {
        let col = usize::try_from(cell.col).ok()?;
        let row = usize::try_from(cell.row).ok()?;
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    /// Cell at a row-major index.
    pub fn cell_at(&self, index: usize) -> GridCell {
        let col = (index % self.width.max(1)) as i32;
        let row = (index / self.width.max(1)) as i32;
        GridCell::new(col, row)
    }

    /// Terrain code at `cell`.
    pub fn code_at(&self, cell: GridCell) -> Option<char> {
        self.index(cell).map(|i| self.codes[i])
    }

    /// Cost of entering `cell`; out-of-bounds cells are impassable.
    pub fn cost_of(&self, cell: GridCell) -> Cost {
        self.index(cell).map_or(Cost::Impassable, |i| self.costs[i])
    }

    /// In-bounds passable neighbours of `cell` with their entry cost,
    /// in expansion order (up, down, left, right).
    pub fn passable_neighbours(&self, cell: GridCell) -> SmallVec<[(GridCell, u32); 4]> {
        cell.neighbours()
            .into_iter()
            .filter_map(|nb| self.cost_of(nb).finite().map(|c| (nb, c)))
            .collect()
    }

    /// Every cell with its code, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (GridCell, char)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .map(|(i, &code)| (self.cell_at(i), code))
    }
}

fn is_section_header(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 2 && t.starts_with('[') && t.ends_with(']')
}

fn grid_rows(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let body = match lines.iter().position(|l| l.trim() == "[Map]") {
        Some(header) => {
            let rest = &lines[header + 1..];
            let end = rest
                .iter()
                .position(|l| is_section_header(l))
                .unwrap_or(rest.len());
            &rest[..end]
        }
        None => &lines[..],
    };
    body.iter()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TileGrid {
        TileGrid::parse(text, &TerrainTable::default(), &LandmarkRegistry::village())
    }

    #[test]
    fn dimensions_and_codes() {
        let g = parse("..#\n:B.\n");
        assert_eq!((g.width(), g.height()), (3, 2));
        assert_eq!(g.code_at(GridCell::new(2, 0)), Some('#'));
        assert_eq!(g.code_at(GridCell::new(1, 1)), Some('B'));
        assert_eq!(g.code_at(GridCell::new(3, 0)), None);
    }

    #[test]
    fn landmark_cells_cost_one() {
        let g = parse("..\n.B");
        assert_eq!(g.cost_of(GridCell::new(1, 1)), Cost::Finite(1));
        assert_eq!(g.cost_of(GridCell::new(0, 0)), Cost::Finite(5));
    }

    #[test]
    fn short_rows_are_padded_with_grass() {
        let g = parse(":::\n:\n");
        assert_eq!(g.width(), 3);
        assert_eq!(g.code_at(GridCell::new(2, 1)), Some('.'));
        assert_eq!(g.cost_of(GridCell::new(2, 1)), Cost::Finite(5));
    }

    #[test]
    fn blank_lines_and_crlf_are_dropped() {
        let g = parse("\r\n..\r\n\r\n..\r\n\r\n\r\n");
        assert_eq!((g.width(), g.height()), (2, 2));
        assert_eq!(g.code_at(GridCell::new(1, 1)), Some('.'));
    }

    #[test]
    fn empty_text_yields_empty_grid() {
        assert!(parse("").is_empty());
        assert!(parse("\n   \n\t\n").is_empty());
        assert!(parse("[Map]\n[Legend]\n").is_empty());
    }

    #[test]
    fn only_map_section_is_read() {
        let text = "[Buildings]\nB: barn\n\n[Map]\n.B\n::\n[Notes]\nxx\n";
        let g = parse(text);
        assert_eq!((g.width(), g.height()), (2, 2));
        assert_eq!(g.code_at(GridCell::new(0, 1)), Some(':'));
    }

    #[test]
    fn out_of_bounds_is_impassable() {
        let g = parse("..");
        assert_eq!(g.cost_of(GridCell::new(-1, 0)), Cost::Impassable);
        assert_eq!(g.cost_of(GridCell::new(0, 1)), Cost::Impassable);
    }

    #[test]
    fn passable_neighbours_skip_walls_and_edges() {
        let g = parse(".T\n#.");
        let n = g.passable_neighbours(GridCell::new(0, 0));
        assert_eq!(n.as_slice(), &[(GridCell::new(0, 1), 2)]);
    }

    #[test]
    fn cells_iterate_row_major() {
        let g = parse("ab\ncd");
        let cells: Vec<_> = g.cells().collect();
        assert_eq!(cells[1], (GridCell::new(1, 0), 'b'));
        assert_eq!(cells[2], (GridCell::new(0, 1), 'c'));
    }
}
