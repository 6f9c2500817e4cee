//! Directory-backed cache storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use pf_core::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;

/// One persisted result subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Model kind and node that produced the entry.
    pub namespace: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub fields: BTreeMap<String, Value>,
}

/// Whether a lookup was served from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Flat directory of `<key>.json` entries.
///
/// Entries never expire. Writers are not coordinated; the last writer of a
/// key wins, which is harmless while computations are deterministic.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root_dir: PathBuf,
}

impl CacheStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let root_dir = root_dir.into();
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Cache shared by every run of the project file at `project_path`.
    pub fn for_project(project_path: &Path) -> CacheResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| CacheError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".plantflow").join("cache"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root_dir.join(format!("{}.json", key))
    }

    /// Read the entry for `key`, or `None` when absent.
    pub fn load(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let entry: CacheEntry =
            serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        if entry.key != key.as_str() {
            return Err(CacheError::Corrupt {
                key: key.to_string(),
                reason: format!("entry is labelled {}", entry.key),
            });
        }
        Ok(Some(entry))
    }

    /// Persist `entry`, replacing any previous entry under the same key.
    pub fn store(&self, entry: &CacheEntry) -> CacheResult<()> {
        let key = CacheKey::parse(&entry.key)?;
        let path = self.entry_path(&key);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, serde_json::to_string_pretty(entry)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Delete one entry; returns whether it existed.
    pub fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete every entry; returns how many were removed.
    pub fn clear(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if self.remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        let mut keys = Vec::new();
        if !self.root_dir.exists() {
            return Ok(keys);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(key) = CacheKey::parse(stem)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// All readable entries, ordered by key. Unreadable entries are skipped.
    pub fn list(&self) -> CacheResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            match self.load(&key) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable cache entry"),
            }
        }
        Ok(entries)
    }

    /// Return the cached `fields` for `key`, computing and storing them on a
    /// miss.
    ///
    /// Only `fields` are kept; anything else `compute` returns is dropped. A
    /// stored entry lacking one of `fields` is reported as corrupt.
    pub fn get_or_compute<E, F>(
        &self,
        key: &CacheKey,
        namespace: &str,
        fields: &[String],
        compute: F,
    ) -> Result<(BTreeMap<String, Value>, CacheOutcome), E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Result<BTreeMap<String, Value>, E>,
    {
        if let Some(entry) = self.load(key)? {
            let subset = narrow(entry.fields, fields).map_err(|field| CacheError::Corrupt {
                key: key.to_string(),
                reason: format!("missing field '{}'", field),
            })?;
            debug!(key = %key, namespace, "cache hit");
            return Ok((subset, CacheOutcome::Hit));
        }

        debug!(key = %key, namespace, "cache miss");
        let computed = compute()?;
        let subset = narrow(computed, fields).map_err(|field| CacheError::MissingField { field })?;
        let entry = CacheEntry {
            key: key.to_string(),
            namespace: namespace.to_string(),
            created_at: Utc::now().to_rfc3339(),
            fields: subset.clone(),
        };
        self.store(&entry)?;
        Ok((subset, CacheOutcome::Miss))
    }
}

/// Keep exactly `fields` from `values`, or name the first one missing.
fn narrow(
    mut values: BTreeMap<String, Value>,
    fields: &[String],
) -> Result<BTreeMap<String, Value>, String> {
    fields
        .iter()
        .map(|f| {
            values
                .remove(f)
                .map(|v| (f.clone(), v))
                .ok_or_else(|| f.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_drops_extras_and_reports_missing() {
        let values = BTreeMap::from([
            ("a".to_string(), Value::Scalar(1.0)),
            ("b".to_string(), Value::Scalar(2.0)),
        ]);
        let kept = narrow(values.clone(), &["a".to_string()]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(narrow(values, &["c".to_string()]), Err("c".to_string()));
    }
}
