//! In-memory merge of shared documents over the static catalog.
//!
//! A [`Projection`] holds one [`MobRecord`] per catalog mob. Static fields
//! come from the catalog once; status and suppression fields are replaced
//! from rank bucket and location documents as they change. A document
//! that does not exist yet reads as all-defaults.

use std::collections::BTreeMap;
use std::sync::Arc;

use hunt_core::MobCatalog;
use hunt_types::{
    ChangeEvent, Collection, MobDefinition, MobId, MobLocationState, MobStatus, MobStatusDocument,
    Rank,
};
use serde::de::DeserializeOwned;

use crate::error::ProjectionError;

/// Merged state of one mob.
#[derive(Debug, Clone, PartialEq)]
pub struct MobRecord {
    /// Static catalog entry.
    pub definition: MobDefinition,
    /// Confirmed kill state from the mob's rank bucket.
    pub status: MobStatus,
    /// Suppression marks and retention.
    pub location: MobLocationState,
}

impl MobRecord {
    fn new(definition: MobDefinition) -> Self {
        Self {
            definition,
            status: MobStatus::default(),
            location: MobLocationState::default(),
        }
    }
}

/// Projected state of every catalog mob.
#[derive(Debug, Clone)]
pub struct Projection {
    catalog: Arc<MobCatalog>,
    mobs: BTreeMap<MobId, MobRecord>,
}

impl Projection {
    /// A projection with every catalog mob at its defaults.
    pub fn new(catalog: Arc<MobCatalog>) -> Self {
        let mobs = catalog
            .iter()
            .map(|mob| (mob.id.clone(), MobRecord::new(mob.clone())))
            .collect();
        Self { catalog, mobs }
    }

    /// The catalog this projection was built from.
    pub fn catalog(&self) -> &Arc<MobCatalog> {
        &self.catalog
    }

    /// Merged record of one mob.
    pub fn get(&self, mob_id: &MobId) -> Option<&MobRecord> {
        self.mobs.get(mob_id)
    }

    /// Every record, in mob id order.
    pub fn iter(&self) -> impl Iterator<Item = &MobRecord> {
        self.mobs.values()
    }

    /// Number of projected mobs.
    pub fn len(&self) -> usize {
        self.mobs.len()
    }

    /// Whether the catalog was empty.
    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty()
    }

    /// Replace the status of every mob in `rank`'s bucket.
    ///
    /// Mobs missing from the document are reset to defaults. Returns the
    /// mobs whose status changed.
    pub fn merge_bucket(&mut self, rank: Rank, document: &MobStatusDocument) -> Vec<MobId> {
        let mut changed = Vec::new();
        for (id, record) in &mut self.mobs {
            if record.definition.rank != rank {
                continue;
            }
            let status = document.mobs.get(id).cloned().unwrap_or_default();
            if record.status != status {
                record.status = status;
                changed.push(id.clone());
            }
        }
        changed
    }

    /// Replace a mob's suppression state. Returns whether it changed.
    pub fn merge_location(&mut self, mob_id: &MobId, state: MobLocationState) -> bool {
        let Some(record) = self.mobs.get_mut(mob_id) else {
            tracing::debug!(%mob_id, "Location change for mob outside the catalog");
            return false;
        };
        if record.location == state {
            return false;
        }
        record.location = state;
        true
    }

    /// Apply one store change. Returns the mobs whose projected fields
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Malformed`] if the document body cannot
    /// be decoded. Nothing is merged in that case.
    pub fn apply(&mut self, event: &ChangeEvent) -> Result<Vec<MobId>, ProjectionError> {
        let collection = event.collection();
        let key = event.key();
        let body = match event {
            ChangeEvent::Added { document, .. } | ChangeEvent::Modified { document, .. } => {
                Some(document)
            }
            ChangeEvent::Removed { .. } => None,
        };

        match collection {
            Collection::MobStatus => {
                let Some(rank) = Rank::from_status_document(key) else {
                    tracing::debug!(key, "Ignoring unknown status bucket");
                    return Ok(Vec::new());
                };
                let document: MobStatusDocument = decode(collection, key, body)?;
                Ok(self.merge_bucket(rank, &document))
            }
            Collection::MobLocations => {
                let mob_id = MobId::from(key);
                let state: MobLocationState = decode(collection, key, body)?;
                Ok(if self.merge_location(&mob_id, state) {
                    vec![mob_id]
                } else {
                    Vec::new()
                })
            }
            Collection::Reports => Ok(Vec::new()),
        }
    }

    /// Take every dynamic field from `fresh`, keeping this projection's
    /// static fields. Returns the mobs that changed.
    pub fn replace_from(&mut self, fresh: Self) -> Vec<MobId> {
        let mut changed = Vec::new();
        let mut fresh = fresh.mobs;
        for (id, record) in &mut self.mobs {
            let Some(update) = fresh.remove(id) else {
                continue;
            };
            if record.status != update.status || record.location != update.location {
                record.status = update.status;
                record.location = update.location;
                changed.push(id.clone());
            }
        }
        changed
    }
}

fn decode<T: DeserializeOwned + Default>(
    collection: Collection,
    key: &str,
    body: Option<&serde_json::Value>,
) -> Result<T, ProjectionError> {
    body.map_or_else(
        || Ok(T::default()),
        |value| {
            T::deserialize(value).map_err(|source| ProjectionError::Malformed {
                collection,
                key: key.to_owned(),
                source,
            })
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use hunt_types::{PointMarks, SpawnPoint};
    use serde_json::json;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn mob(id: &str, rank: Rank) -> MobDefinition {
        MobDefinition {
            id: MobId::from(id),
            name: format!("Mob {id}"),
            rank,
            area: String::from("Test Area"),
            repop_seconds: 3_600,
            max_repop_seconds: 7_200,
            condition: None,
            spawn_points: vec![SpawnPoint {
                id: String::from("p1"),
                x: 0.0,
                y: 0.0,
                ranks: vec![rank],
            }],
        }
    }

    fn projection() -> Projection {
        let catalog = MobCatalog::from_definitions([
            mob("62001", Rank::S),
            mob("62002", Rank::S),
            mob("41001", Rank::A),
        ])
        .unwrap();
        Projection::new(Arc::new(catalog))
    }

    fn bucket(entries: &[(&str, i64)]) -> MobStatusDocument {
        MobStatusDocument {
            mobs: entries
                .iter()
                .map(|(id, kill)| {
                    (
                        MobId::from(*id),
                        MobStatus {
                            current_kill_time: Some(at(*kill)),
                            ..MobStatus::default()
                        },
                    )
                })
                .collect(),
            updated_at: None,
        }
    }

    #[test]
    fn starts_with_defaults() {
        let projection = projection();
        assert_eq!(projection.len(), 3);
        let record = projection.get(&MobId::from("62001")).unwrap();
        assert_eq!(record.status, MobStatus::default());
        assert!(record.location.points.is_empty());
    }

    #[test]
    fn bucket_merge_reports_only_changed_mobs() {
        let mut projection = projection();
        let changed = projection.merge_bucket(Rank::S, &bucket(&[("62001", 100)]));
        assert_eq!(changed, vec![MobId::from("62001")]);

        // Same content again changes nothing.
        let changed = projection.merge_bucket(Rank::S, &bucket(&[("62001", 100)]));
        assert!(changed.is_empty());

        let changed = projection.merge_bucket(Rank::S, &bucket(&[("62001", 100), ("62002", 50)]));
        assert_eq!(changed, vec![MobId::from("62002")]);
    }

    #[test]
    fn bucket_merge_leaves_static_fields_alone() {
        let mut projection = projection();
        projection.merge_bucket(Rank::S, &bucket(&[("62001", 100)]));
        let record = projection.get(&MobId::from("62001")).unwrap();
        assert_eq!(record.definition.name, "Mob 62001");
        assert_eq!(record.definition.repop_seconds, 3_600);
    }

    #[test]
    fn other_bucket_is_untouched() {
        let mut projection = projection();
        let changed = projection.merge_bucket(Rank::A, &bucket(&[("62001", 100)]));
        assert!(changed.is_empty());
        assert_eq!(
            projection.get(&MobId::from("62001")).unwrap().status,
            MobStatus::default()
        );
    }

    #[test]
    fn apply_decodes_events() {
        let mut projection = projection();
        let document = serde_json::to_value(bucket(&[("41001", 100)])).unwrap();
        let changed = projection
            .apply(&ChangeEvent::Modified {
                collection: Collection::MobStatus,
                key: String::from("a_latest"),
                document,
            })
            .unwrap();
        assert_eq!(changed, vec![MobId::from("41001")]);

        let mut state = MobLocationState::default();
        state.points.insert(
            String::from("p1"),
            PointMarks {
                suppressed_at: Some(at(200)),
                unsuppressed_at: None,
            },
        );
        let changed = projection
            .apply(&ChangeEvent::Added {
                collection: Collection::MobLocations,
                key: String::from("41001"),
                document: serde_json::to_value(&state).unwrap(),
            })
            .unwrap();
        assert_eq!(changed, vec![MobId::from("41001")]);

        let changed = projection
            .apply(&ChangeEvent::Removed {
                collection: Collection::MobLocations,
                key: String::from("41001"),
            })
            .unwrap();
        assert_eq!(changed, vec![MobId::from("41001")]);
        assert!(projection.get(&MobId::from("41001")).unwrap().location.points.is_empty());
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut projection = projection();
        let report = projection
            .apply(&ChangeEvent::Added {
                collection: Collection::Reports,
                key: String::from("r1"),
                document: json!({"anything": true}),
            })
            .unwrap();
        assert!(report.is_empty());

        let stranger = projection
            .apply(&ChangeEvent::Added {
                collection: Collection::MobLocations,
                key: String::from("69999"),
                document: json!({}),
            })
            .unwrap();
        assert!(stranger.is_empty());
    }

    #[test]
    fn malformed_document_is_rejected() {
        let mut projection = projection();
        let result = projection.apply(&ChangeEvent::Modified {
            collection: Collection::MobStatus,
            key: String::from("s_latest"),
            document: json!({"mobs": 42}),
        });
        assert!(matches!(result, Err(ProjectionError::Malformed { .. })));
    }

    #[test]
    fn replace_from_diffs_dynamic_fields() {
        let mut projection = projection();
        projection.merge_bucket(Rank::S, &bucket(&[("62001", 100)]));

        let mut fresh = projection.clone();
        fresh.merge_bucket(Rank::S, &bucket(&[("62001", 100), ("62002", 300)]));

        let changed = projection.replace_from(fresh);
        assert_eq!(changed, vec![MobId::from("62002")]);
        assert_eq!(
            projection.get(&MobId::from("62002")).unwrap().status.current_kill_time,
            Some(at(300))
        );
    }
}
