use dashmap::DashMap;
use foundation::WorldVersionId;
use sqlx::{PgPool, Row};

use crate::error::DemError;

#[derive(Debug, Clone, PartialEq)]
pub struct WorldVersion {
    pub id: WorldVersionId,
    pub version: String,
    pub is_active: bool,
}

/// Read-through snapshot of `world_versions`, loaded once at process start.
/// Callers get constant-time lookup instead of a database round trip per
/// request; the table is read-only to the core so a snapshot never goes
/// stale in a way the core cares about.
#[derive(Default)]
pub struct WorldVersionCache {
    by_version: DashMap<String, WorldVersion>,
}

impl WorldVersionCache {
    pub fn new() -> Self {
        Self {
            by_version: DashMap::new(),
        }
    }

    pub async fn load(pool: &PgPool) -> Result<Self, DemError> {
        let rows = sqlx::query("SELECT id, version, is_active FROM world_versions")
            .fetch_all(pool)
            .await?;

        let cache = Self::new();
        for row in rows {
            let id: i64 = row.get("id");
            let version: String = row.get("version");
            let is_active: bool = row.get("is_active");
            cache.by_version.insert(
                version.clone(),
                WorldVersion {
                    id: WorldVersionId::new(id),
                    version,
                    is_active,
                },
            );
        }
        Ok(cache)
    }

    pub fn get(&self, version: &str) -> Option<WorldVersion> {
        self.by_version.get(version).map(|v| v.clone())
    }

    pub fn active_versions(&self) -> Vec<WorldVersion> {
        self.by_version
            .iter()
            .filter(|entry| entry.value().is_active)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Test/startup helper to seed a version without a round trip.
    pub fn insert(&self, version: WorldVersion) {
        self.by_version.insert(version.version.clone(), version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_version_is_none() {
        let cache = WorldVersionCache::new();
        assert_eq!(cache.get("v1"), None);
    }

    #[test]
    fn active_versions_filters_inactive() {
        let cache = WorldVersionCache::new();
        cache.insert(WorldVersion {
            id: WorldVersionId::new(1),
            version: "v1".to_string(),
            is_active: true,
        });
        cache.insert(WorldVersion {
            id: WorldVersionId::new(2),
            version: "v2".to_string(),
            is_active: false,
        });

        let active = cache.active_versions();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].version, "v1");
    }
}
