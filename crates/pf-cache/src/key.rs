//! Content-addressed cache keys.

use core::fmt;
use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use sha2::{Digest, Sha256};

use crate::error::{CacheError, CacheResult};

/// Hex-encoded SHA-256 digest identifying one cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validate a key read back from storage or the command line.
    pub fn parse(s: &str) -> CacheResult<Self> {
        let s = s.trim();
        if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(CacheKey(s.to_string()))
        } else {
            Err(CacheError::InvalidKey(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuild `value` with every object's keys in sorted order.
fn canonical(value: &Json) -> Json {
    match value {
        Json::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for k in keys {
                sorted.insert(k.clone(), canonical(&map[k]));
            }
            Json::Object(sorted)
        }
        Json::Array(items) => Json::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Key for a result determined by `config` and `scenario`, scoped to
/// `namespace` (model kind and node name) so identical configurations of
/// unrelated nodes never share an entry.
pub fn compute_cache_key(
    namespace: &str,
    config: &Json,
    scenario: &BTreeMap<String, Json>,
) -> CacheKey {
    let mut hasher = Sha256::new();

    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);

    let config_json = canonical(config).to_string();
    hasher.update(config_json.as_bytes());
    hasher.update([0u8]);

    for (name, value) in scenario {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(canonical(value).to_string().as_bytes());
        hasher.update([0u8]);
    }

    let result = hasher.finalize();
    CacheKey(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario(life: u32) -> BTreeMap<String, Json> {
        BTreeMap::from([("plant_life".to_string(), json!(life))])
    }

    #[test]
    fn key_stability() {
        let config = json!({"wind_capacity_kw": 1000.0, "solar_capacity_kw": 500.0});
        let a = compute_cache_key("hybrid_plant/hybrid", &config, &scenario(30));
        let b = compute_cache_key("hybrid_plant/hybrid", &config, &scenario(30));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(CacheKey::parse(a.as_str()).unwrap(), a);
    }

    #[test]
    fn key_ignores_field_order() {
        let a: Json = serde_json::from_str(r#"{"a": 1, "b": {"x": 1, "y": 2}}"#).unwrap();
        let b: Json = serde_json::from_str(r#"{"b": {"y": 2, "x": 1}, "a": 1}"#).unwrap();
        assert_eq!(
            compute_cache_key("ns", &a, &BTreeMap::new()),
            compute_cache_key("ns", &b, &BTreeMap::new())
        );
    }

    #[test]
    fn key_differs_by_scenario_and_namespace() {
        let config = json!({"wind_capacity_kw": 1000.0});
        let base = compute_cache_key("hybrid_plant/a", &config, &scenario(30));
        assert_ne!(base, compute_cache_key("hybrid_plant/a", &config, &scenario(25)));
        assert_ne!(base, compute_cache_key("hybrid_plant/b", &config, &scenario(30)));
    }

    #[test]
    fn malformed_keys_rejected() {
        assert!(CacheKey::parse("abc").is_err());
        assert!(CacheKey::parse(&"G".repeat(64)).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn key_ignores_insertion_order(
                fields in prop::collection::btree_map("[a-z_]{1,12}", -1.0e9f64..1.0e9, 1..12),
                life in 1u32..60,
            ) {
                let forward: Map<String, Json> =
                    fields.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
                let backward: Map<String, Json> =
                    fields.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
                let a = compute_cache_key("ns", &Json::Object(forward), &scenario(life));
                let b = compute_cache_key("ns", &Json::Object(backward), &scenario(life));
                prop_assert_eq!(&a, &b);
                prop_assert!(CacheKey::parse(a.as_str()).is_ok());
            }

            #[test]
            fn key_tracks_scenario(life in 1u32..60, other in 1u32..60) {
                let config = json!({"solar_capacity_kw": 100.0});
                let a = compute_cache_key("ns", &config, &scenario(life));
                let b = compute_cache_key("ns", &config, &scenario(other));
                prop_assert_eq!(a == b, life == other);
            }
        }
    }
}

