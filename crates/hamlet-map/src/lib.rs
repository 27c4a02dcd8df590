//! Tile map model and pathfinding for hamlet.
//!
//! A map is plain text, one character per cell. [`TownMap::load`]
//! turns it into a cost-annotated [`TileGrid`] plus the [`Landmarks`]
//! found in it; [`find_path`] routes between cells over the grid's
//! 4-connected neighbourhood.
//!
//! Landmark codes and terrain costs are data ([`LandmarkRegistry`],
//! [`TerrainTable`]), passed in explicitly rather than read from
//! global tables.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod landmark;
pub mod map;
pub mod pathfind;
pub mod terrain;
pub mod village;

pub use error::MapError;
pub use grid::TileGrid;
pub use landmark::{Landmark, LandmarkDef, LandmarkRegistry, Landmarks};
pub use map::TownMap;
pub use pathfind::{find_path, path_cost};
pub use terrain::{Cost, TerrainTable};
pub use village::VILLAGE_MAP;
