//! [`TownMap`]: a loaded grid together with its landmarks.

use hamlet_core::GridCell;

use crate::grid::TileGrid;
use crate::landmark::{Landmark, LandmarkRegistry, Landmarks};
use crate::terrain::{Cost, TerrainTable};

/// A loaded map. Immutable; reloading builds a new one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TownMap {
    grid: TileGrid,
    landmarks: Landmarks,
}

impl TownMap {
    /// Parse `text` and scan it for landmark codes.
    ///
    /// Never fails: text with no rows yields an empty grid and no
    /// landmarks, which callers treat as "no map".
    pub fn load(text: &str, registry: &LandmarkRegistry, terrain: &TerrainTable) -> Self {
        let grid = TileGrid::parse(text, terrain, registry);
        let mut landmarks = Landmarks::default();
        for (cell, code) in grid.cells() {
            if let Some(def) = registry.by_code(code) {
                landmarks.record(def, cell);
            }
        }
        Self { grid, landmarks }
    }

    /// The tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Landmarks found in the grid.
    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    /// Cost of entering `cell`.
    pub fn cost_of(&self, cell: GridCell) -> Cost {
        self.grid.cost_of(cell)
    }

    /// Landmark occupying `cell`, if any.
    pub fn landmark_at(&self, cell: GridCell) -> Option<&Landmark> {
        self.landmarks.at(cell)
    }

    /// Split into grid and landmarks.
    pub fn into_parts(self) -> (TileGrid, Landmarks) {
        (self.grid, self.landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::village::VILLAGE_MAP;
    use hamlet_core::LandmarkKey;

    fn load(text: &str) -> TownMap {
        TownMap::load(text, &LandmarkRegistry::village(), &TerrainTable::default())
    }

    #[test]
    fn landmarks_are_found() {
        let m = load("...\n.C.\n..B");
        assert_eq!(m.landmarks().len(), 2);
        let factory = m.landmarks().get(&LandmarkKey::new("factory")).unwrap();
        assert_eq!(factory.cell, GridCell::new(1, 1));
        assert_eq!(
            m.landmark_at(GridCell::new(2, 2)).map(|l| l.key.as_str()),
            Some("barn")
        );
        assert!(m.landmark_at(GridCell::new(0, 0)).is_none());
    }

    #[test]
    fn empty_map_has_no_landmarks() {
        let m = load("");
        assert!(m.grid().is_empty());
        assert!(m.landmarks().is_empty());
    }

    #[test]
    fn village_has_every_building() {
        let m = load(VILLAGE_MAP);
        assert_eq!((m.grid().width(), m.grid().height()), (60, 25));
        for key in [
            "barn", "library", "inspector", "forge", "factory", "hall", "scriptorium",
            "apothecary", "market",
        ] {
            assert!(
                m.landmarks().get(&LandmarkKey::new(key)).is_some(),
                "missing {key}"
            );
        }
    }

    #[test]
    fn decorative_landmarks_are_flagged() {
        let m = load(VILLAGE_MAP);
        let market = m.landmarks().get(&LandmarkKey::new("market")).unwrap();
        assert!(market.is_decorative());
    }
}
