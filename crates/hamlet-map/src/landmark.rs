//! Landmark registry (configuration) and located landmarks (per map).

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use hamlet_core::{GridCell, LandmarkKey, Role};

use crate::error::{check_code, MapError};

// ── LandmarkDef ────────────────────────────────────────────────────

/// Registry entry: how a landmark is written in map text and which
/// roles it attracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkDef {
    /// Single-character map code.
    pub code: char,
    /// Stable key agents use to refer to the landmark.
    pub key: LandmarkKey,
    /// Display label.
    pub label: String,
    /// Roles routed here. Empty means decorative.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl LandmarkDef {
    /// Build a definition.
    pub fn new(code: char, key: &str, label: &str, roles: &[&str]) -> Self {
        Self {
            code,
            key: LandmarkKey::new(key),
            label: label.to_string(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        }
    }

    /// Decorative landmarks are never a pathing target.
    pub fn is_decorative(&self) -> bool {
        self.roles.is_empty()
    }
}

// ── LandmarkRegistry ───────────────────────────────────────────────

/// Immutable table of landmark definitions.
///
/// When several definitions list the same role, the one registered
/// last wins the role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkDef>", into = "Vec<LandmarkDef>")]
pub struct LandmarkRegistry {
    defs: IndexMap<char, LandmarkDef>,
    role_targets: IndexMap<Role, LandmarkKey>,
}

impl LandmarkRegistry {
    /// Build a registry, rejecting duplicate codes or keys.
    pub fn new(defs: Vec<LandmarkDef>) -> Result<Self, MapError> {
        for (i, def) in defs.iter().enumerate() {
            check_code(def.code)?;
            let earlier = &defs[..i];
            if earlier.iter().any(|d| d.code == def.code) {
                return Err(MapError::DuplicateCode { code: def.code });
            }
            if earlier.iter().any(|d| d.key == def.key) {
                return Err(MapError::DuplicateKey {
                    key: def.key.clone(),
                });
            }
        }
        Ok(Self::assemble(defs))
    }

    fn assemble(defs: Vec<LandmarkDef>) -> Self {
        let mut role_targets = IndexMap::new();
        for def in &defs {
            for role in &def.roles {
                role_targets.insert(role.clone(), def.key.clone());
            }
        }
        Self {
            defs: defs.into_iter().map(|d| (d.code, d)).collect(),
            role_targets,
        }
    }

    /// The village registry: seven role buildings and two decorative ones.
    pub fn village() -> Self {
        let defs = vec![
            LandmarkDef::new('B', "barn", "Cozy Barn", &["idle", "complete", "error"]),
            LandmarkDef::new('L', "library", "Grand Archive", &["researcher"]),
            LandmarkDef::new('I', "inspector", "Inspector's Tower", &["reviewer"]),
            LandmarkDef::new('F', "forge", "Steam Forge", &["generic"]),
            LandmarkDef::new('C', "factory", "Cog Factory", &["worker"]),
            LandmarkDef::new('H', "hall", "Town Hall", &["orchestrator"]),
            LandmarkDef::new('W', "scriptorium", "The Scriptorium", &["writer"]),
            LandmarkDef::new('S', "apothecary", "Apothecary", &[]),
            LandmarkDef::new('M', "market", "Market", &[]),
        ];
        Self::assemble(defs)
    }

    /// Definition for a map code.
    pub fn by_code(&self, code: char) -> Option<&LandmarkDef> {
        self.defs.get(&code)
    }

    /// Definition for a key.
    pub fn by_key(&self, key: &LandmarkKey) -> Option<&LandmarkDef> {
        self.defs.values().find(|d| &d.key == key)
    }

    /// Whether `code` denotes a landmark.
    pub fn is_landmark_code(&self, code: char) -> bool {
        self.defs.contains_key(&code)
    }

    /// Key of the landmark registered for `role`.
    pub fn landmark_for_role(&self, role: &Role) -> Option<&LandmarkKey> {
        self.role_targets.get(role)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LandmarkDef> {
        self.defs.values()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry has no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for LandmarkRegistry {
    fn default() -> Self {
        Self::village()
    }
}

impl TryFrom<Vec<LandmarkDef>> for LandmarkRegistry {
    type Error = MapError;

    fn try_from(defs: Vec<LandmarkDef>) -> Result<Self, MapError> {
        Self::new(defs)
    }
}

impl From<LandmarkRegistry> for Vec<LandmarkDef> {
    fn from(registry: LandmarkRegistry) -> Self {
        registry.defs.into_values().collect()
    }
}

// ── Landmarks ──────────────────────────────────────────────────────

/// A landmark placed on a loaded map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Landmark {
    /// Registry key.
    pub key: LandmarkKey,
    /// Display label.
    pub label: String,
    /// Cell agents route to.
    pub cell: GridCell,
    /// Roles it attracts; empty for decorative landmarks.
    pub roles: Vec<Role>,
}

impl Landmark {
    /// Decorative landmarks are never a pathing target.
    pub fn is_decorative(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Landmarks found while scanning a map, computed once per load.
///
/// If a code appears in several cells, the last one in row-major
/// order is the landmark's routing cell; every occurrence still
/// answers [`Landmarks::at`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Landmarks {
    by_key: IndexMap<LandmarkKey, Landmark>,
    by_cell: HashMap<GridCell, LandmarkKey>,
}

impl Landmarks {
    /// Record an occurrence of `def` at `cell`.
    pub(crate) fn record(&mut self, def: &LandmarkDef, cell: GridCell) {
        self.by_key.insert(
            def.key.clone(),
            Landmark {
                key: def.key.clone(),
                label: def.label.clone(),
                cell,
                roles: def.roles.clone(),
            },
        );
        self.by_cell.insert(cell, def.key.clone());
    }

    /// Landmark by key.
    pub fn get(&self, key: &LandmarkKey) -> Option<&Landmark> {
        self.by_key.get(key)
    }

    /// Landmark occupying `cell`.
    pub fn at(&self, cell: GridCell) -> Option<&Landmark> {
        self.by_cell.get(&cell).and_then(|k| self.by_key.get(k))
    }

    /// Landmarks in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.by_key.values()
    }

    /// Number of distinct landmarks.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the map placed no landmarks.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn village_role_lookup() {
        let r = LandmarkRegistry::village();
        assert_eq!(
            r.landmark_for_role(&Role::new("worker")),
            Some(&LandmarkKey::new("factory"))
        );
        assert_eq!(
            r.landmark_for_role(&Role::new("complete")),
            Some(&LandmarkKey::new("barn"))
        );
        assert_eq!(r.landmark_for_role(&Role::new("painter")), None);
        assert!(r.by_code('M').is_some_and(LandmarkDef::is_decorative));
    }

    #[test]
    fn village_matches_validated_construction() {
        let rebuilt = LandmarkRegistry::new(Vec::from(LandmarkRegistry::village())).unwrap();
        assert_eq!(rebuilt, LandmarkRegistry::village());
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let defs = vec![
            LandmarkDef::new('B', "barn", "Barn", &["idle"]),
            LandmarkDef::new('B', "byre", "Byre", &[]),
        ];
        assert_eq!(
            LandmarkRegistry::new(defs),
            Err(MapError::DuplicateCode { code: 'B' })
        );
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let defs = vec![
            LandmarkDef::new('B', "barn", "Barn", &["idle"]),
            LandmarkDef::new('Y', "barn", "Other barn", &[]),
        ];
        assert_eq!(
            LandmarkRegistry::new(defs),
            Err(MapError::DuplicateKey {
                key: LandmarkKey::new("barn")
            })
        );
    }

    #[test]
    fn later_definition_wins_a_shared_role() {
        let defs = vec![
            LandmarkDef::new('F', "forge", "Forge", &["worker"]),
            LandmarkDef::new('C', "factory", "Factory", &["worker"]),
        ];
        let r = LandmarkRegistry::new(defs).unwrap();
        assert_eq!(
            r.landmark_for_role(&Role::new("worker")),
            Some(&LandmarkKey::new("factory"))
        );
    }

    #[test]
    fn registry_deserializes_from_list() {
        let json = r#"[{"code":"Q","key":"quarry","label":"Quarry","roles":["miner"]}]"#;
        let r: LandmarkRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(r.len(), 1);
        assert!(r.is_landmark_code('Q'));
        let dup = r#"[{"code":"Q","key":"a","label":"A"},{"code":"Q","key":"b","label":"B"}]"#;
        assert!(serde_json::from_str::<LandmarkRegistry>(dup).is_err());
    }

    #[test]
    fn last_occurrence_is_routing_cell() {
        let def = LandmarkDef::new('B', "barn", "Barn", &["idle"]);
        let mut l = Landmarks::default();
        l.record(&def, GridCell::new(0, 0));
        l.record(&def, GridCell::new(4, 2));
        assert_eq!(l.len(), 1);
        assert_eq!(l.get(&def.key).map(|x| x.cell), Some(GridCell::new(4, 2)));
        assert!(l.at(GridCell::new(0, 0)).is_some());
    }
}
