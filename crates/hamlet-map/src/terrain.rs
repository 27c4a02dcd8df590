//! Terrain codes and their movement costs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{check_code, MapError};

/// Cost of entering a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cost {
    /// Enterable at this cost (always at least 1).
    Finite(u32),
    /// Never enterable.
    Impassable,
}

impl Cost {
    /// The finite cost, if any.
    pub fn finite(self) -> Option<u32> {
        match self {
            Self::Finite(c) => Some(c),
            Self::Impassable => None,
        }
    }

    /// Whether an agent may step onto the cell.
    pub fn is_passable(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

/// Movement cost per terrain code.
///
/// Codes absent from the table are impassable. Landmark codes are not
/// listed here: every landmark cell costs 1 regardless of this table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTable {
    /// Cost of each passable code.
    pub costs: BTreeMap<char, u32>,
    /// Code assumed for cells past the end of a short row. Default: `.`.
    pub fill: char,
}

impl Default for TerrainTable {
    /// Paved ground (`:` cobblestone, `+` plaza, `=` bridge) costs 1,
    /// worn path `#` costs 2, grass `.`, farmland `A` and the fountain
    /// `K` cost 5.
    fn default() -> Self {
        let costs = [(':', 1), ('+', 1), ('=', 1), ('#', 2), ('.', 5), ('A', 5), ('K', 5)]
            .into_iter()
            .collect();
        Self { costs, fill: '.' }
    }
}

impl TerrainTable {
    /// Cost of a bare terrain code.
    pub fn cost_of(&self, code: char) -> Cost {
        self.costs
            .get(&code)
            .map_or(Cost::Impassable, |&c| Cost::Finite(c))
    }

    /// Set or replace the cost of `code`.
    pub fn with_cost(mut self, code: char, cost: u32) -> Self {
        self.costs.insert(code, cost);
        self
    }

    /// Check that every code is usable and every cost is at least 1.
    pub fn validate(&self) -> Result<(), MapError> {
        check_code(self.fill)?;
        for (&code, &cost) in &self.costs {
            check_code(code)?;
            if cost == 0 {
                return Err(MapError::ZeroCost { code });
            }
        }
        Ok(())
    }
}
