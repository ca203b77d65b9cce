use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Worker threads for parallel index builds; 0 = rayon's default pool.
    #[serde(default)]
    pub parallelism: usize,
    #[serde(default = "default_true")]
    pub optimize_bitmaps: bool,
    /// Default for `only_visible` when a caller doesn't say (CLI `distinct`).
    #[serde(default = "default_true")]
    pub cascade_distinct: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 0,
            optimize_bitmaps: true,
            cascade_distinct: true,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let parallelism = env_parse("GF_PARALLELISM").unwrap_or(d.parallelism);
        let optimize_bitmaps = env_parse("GF_OPTIMIZE_BITMAPS").unwrap_or(d.optimize_bitmaps);
        let cascade_distinct = env_parse("GF_CASCADE_DISTINCT").unwrap_or(d.cascade_distinct);
        Self {
            parallelism,
            optimize_bitmaps,
            cascade_distinct,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
