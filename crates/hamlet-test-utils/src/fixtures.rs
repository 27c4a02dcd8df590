//! Maps with known geometry.
//!
//! - [`grass_map`]: `width` × `height` of grass (cost 5).
//! - [`scenario_a_map`]: 3×3 grass with the factory (`C`, role
//!   `worker`) in the centre.
//! - [`pen_map`]: barn and factory joined by a paved road, barn in a
//!   paved yard so pen wanders have room.
//! - [`island_map`]: the factory cut off by water.

use hamlet_map::{LandmarkRegistry, TerrainTable, TownMap};

/// Load `text` with the village registry and default terrain.
pub fn load(text: &str) -> TownMap {
    TownMap::load(text, &LandmarkRegistry::village(), &TerrainTable::default())
}

/// Grass-only text of the given size.
pub fn grass_map(width: usize, height: usize) -> String {
    let row = ".".repeat(width);
    vec![row; height].join("\n")
}

pub fn scenario_a_map() -> &'static str {
    "...\n.C.\n..."
}

pub fn pen_map() -> &'static str {
    concat!(
        ":::.......\n",
        ":B::::::C.\n",
        ":::.......\n",
    )
}

pub fn island_map() -> &'static str {
    concat!(
        "B::~~~\n",
        "...~C~\n",
        "...~~~\n",
    )
}
