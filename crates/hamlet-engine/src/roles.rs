//! Role inference from worker names.

use serde::{Deserialize, Serialize};

use hamlet_core::Role;

/// Assigns `role` to any name containing one of `patterns`
/// (case-insensitive).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    /// Role assigned on match.
    pub role: Role,
    /// Substrings to look for.
    pub patterns: Vec<String>,
}

impl RoleRule {
    fn new(role: &str, patterns: &[&str]) -> Self {
        Self {
            role: Role::new(role),
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| !p.is_empty() && lowered.contains(&p.to_lowercase()))
    }
}

/// Ordered rules; the first match wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleRules {
    /// Rules in priority order.
    pub rules: Vec<RoleRule>,
    /// Role for names no rule matches. Default: `generic`.
    pub fallback: Role,
}

impl Default for RoleRules {
    fn default() -> Self {
        Self {
            rules: vec![
                RoleRule::new("orchestrator", &["orchestrat"]),
                RoleRule::new("researcher", &["research"]),
                RoleRule::new("worker", &["worker", "build", "implement"]),
                RoleRule::new("reviewer", &["review", "crossfire"]),
                RoleRule::new("writer", &["writ", "spec", "document"]),
            ],
            fallback: Role::generic(),
        }
    }
}

impl RoleRules {
    /// Role for a worker named `name`.
    pub fn infer(&self, name: &str) -> Role {
        let lowered = name.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lowered))
            .map_or_else(|| self.fallback.clone(), |r| r.role.clone())
    }
}
