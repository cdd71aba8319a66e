//! Static mob catalog.
//!
//! The catalog is a JSON array of [`MobDefinition`]s loaded once at
//! startup. Every entry is validated on load so the rest of the tracker can
//! rely on positive durations and in-range condition values.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use hunt_types::{MobDefinition, MobId};

/// Errors that can occur when loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file from disk.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the catalog JSON.
    #[error("failed to parse catalog JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Two entries share the same mob code.
    #[error("duplicate mob id {0}")]
    DuplicateMob(MobId),

    /// An entry failed validation.
    #[error("invalid mob {mob}: {reason}")]
    InvalidMob {
        /// Offending mob.
        mob: MobId,
        /// What is wrong with it.
        reason: String,
    },
}

/// Validated, read-only mob catalog keyed by mob code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MobCatalog {
    mobs: BTreeMap<MobId, MobDefinition>,
}

impl MobCatalog {
    /// Load and validate the catalog file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on I/O, parse, or validation failure.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&contents)?;
        tracing::info!(path = %path.display(), mobs = catalog.len(), "Mob catalog loaded");
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on parse or validation failure.
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<MobDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(entries)
    }

    /// Build a catalog from already-parsed definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateMob`] or
    /// [`CatalogError::InvalidMob`] if an entry fails validation.
    pub fn from_definitions(
        entries: impl IntoIterator<Item = MobDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut mobs = BTreeMap::new();
        for mob in entries {
            validate(&mob)?;
            if mobs.contains_key(&mob.id) {
                return Err(CatalogError::DuplicateMob(mob.id));
            }
            mobs.insert(mob.id.clone(), mob);
        }
        Ok(Self { mobs })
    }

    /// Look up a mob by code.
    pub fn get(&self, id: &MobId) -> Option<&MobDefinition> {
        self.mobs.get(id)
    }

    /// All mobs in code order.
    pub fn iter(&self) -> impl Iterator<Item = &MobDefinition> {
        self.mobs.values()
    }

    /// Number of mobs in the catalog.
    pub fn len(&self) -> usize {
        self.mobs.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty()
    }
}

fn validate(mob: &MobDefinition) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidMob {
        mob: mob.id.clone(),
        reason: reason.to_owned(),
    };

    if mob.id.rank() != Some(mob.rank) {
        return Err(invalid("mob code does not match its rank"));
    }
    if mob.repop_seconds == 0 {
        return Err(invalid("repop_seconds must be positive"));
    }
    if mob.max_repop_seconds < mob.repop_seconds {
        return Err(invalid("max_repop_seconds must not be below repop_seconds"));
    }

    let mut point_ids = BTreeSet::new();
    for point in &mob.spawn_points {
        if !point_ids.insert(point.id.as_str()) {
            return Err(invalid("spawn point ids must be unique"));
        }
    }

    if let Some(condition) = &mob.condition {
        let hours_ok = condition
            .time_ranges
            .iter()
            .chain(&condition.first_night_ranges)
            .all(|r| r.start < 24 && r.end < 24);
        if !hours_ok {
            return Err(invalid("hour ranges must lie within 0..24"));
        }
        let seeds_ok = condition
            .weather_seed_ranges
            .iter()
            .all(|r| r.min <= r.max && r.max <= 99);
        if !seeds_ok {
            return Err(invalid("weather seed ranges must lie within 0..=99"));
        }
        if condition.weather_duration_minutes.is_some() && !condition.involves_weather() {
            return Err(invalid("weather duration needs weather seed ranges"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {
            "id": "62001",
            "name": "Night Stalker",
            "rank": "S",
            "area": "Old Forest",
            "repop_seconds": 302400,
            "max_repop_seconds": 475200,
            "condition": {
                "moon_phase": "full-moon",
                "time_ranges": [{ "start": 0, "end": 3 }]
            },
            "spawn_points": [
                { "id": "p1", "x": 10.5, "y": 22.1, "ranks": ["S", "A"] },
                { "id": "p2", "x": 18.0, "y": 30.4, "ranks": ["A"] }
            ]
        },
        {
            "id": "41001",
            "name": "Field Beast",
            "rank": "A",
            "area": "Old Forest",
            "repop_seconds": 14400,
            "max_repop_seconds": 21600
        }
    ]"#;

    #[test]
    fn parses_valid_catalog() {
        let catalog = MobCatalog::parse(CATALOG);
        assert!(catalog.is_ok());
        let catalog = catalog.unwrap_or_default();
        assert_eq!(catalog.len(), 2);
        let stalker = catalog.get(&MobId::from("62001"));
        assert!(stalker.is_some_and(|m| m.condition.is_some() && m.spawn_points.len() == 2));
        let beast = catalog.get(&MobId::from("41001"));
        assert!(beast.is_some_and(|m| m.condition.is_none() && m.spawn_points.is_empty()));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"[
            { "id": "41001", "name": "A", "rank": "A", "area": "X", "repop_seconds": 1, "max_repop_seconds": 2 },
            { "id": "41001", "name": "B", "rank": "A", "area": "X", "repop_seconds": 1, "max_repop_seconds": 2 }
        ]"#;
        assert!(matches!(MobCatalog::parse(json), Err(CatalogError::DuplicateMob(_))));
    }

    #[test]
    fn rejects_zero_repop() {
        let json = r#"[
            { "id": "41001", "name": "A", "rank": "A", "area": "X", "repop_seconds": 0, "max_repop_seconds": 2 }
        ]"#;
        assert!(matches!(MobCatalog::parse(json), Err(CatalogError::InvalidMob { .. })));
    }

    #[test]
    fn rejects_max_below_repop() {
        let json = r#"[
            { "id": "41001", "name": "A", "rank": "A", "area": "X", "repop_seconds": 10, "max_repop_seconds": 5 }
        ]"#;
        assert!(matches!(MobCatalog::parse(json), Err(CatalogError::InvalidMob { .. })));
    }

    #[test]
    fn rejects_rank_mismatch() {
        let json = r#"[
            { "id": "62001", "name": "A", "rank": "A", "area": "X", "repop_seconds": 1, "max_repop_seconds": 2 }
        ]"#;
        assert!(matches!(MobCatalog::parse(json), Err(CatalogError::InvalidMob { .. })));
    }

    #[test]
    fn rejects_out_of_range_hours() {
        let json = r#"[
            { "id": "62001", "name": "A", "rank": "S", "area": "X", "repop_seconds": 1, "max_repop_seconds": 2,
              "condition": { "time_ranges": [{ "start": 20, "end": 24 }] } }
        ]"#;
        assert!(matches!(MobCatalog::parse(json), Err(CatalogError::InvalidMob { .. })));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(MobCatalog::parse("{"), Err(CatalogError::Json { .. })));
    }

    #[test]
    fn bundled_catalog_is_valid() {
        let catalog = MobCatalog::parse(include_str!("../../../data/mobs.json"));
        assert!(catalog.is_ok_and(|c| c.len() == 6));
    }
}
