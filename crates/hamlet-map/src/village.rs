//! The bundled village map.

/// A 60×25 village containing every building in
/// [`LandmarkRegistry::village`](crate::LandmarkRegistry::village).
///
/// The legend sections are informational; only `[Map]` is parsed.
pub const VILLAGE_MAP: &str = include_str!("village.map");
