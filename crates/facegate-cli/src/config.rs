use facegate_core::store::DEFAULT_HOLDING_DIR;
use std::path::PathBuf;
use std::str::FromStr;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the per-employee corpus (default: ./TrainedFaces).
    pub corpus_dir: PathBuf,
    /// Holding area for probe snapshots, relative to the corpus root.
    pub holding_dir: String,
    /// Haar cascade XML used for face detection.
    pub cascade_path: PathBuf,
    /// Eigenface distance above which a probe counts as unknown.
    pub match_threshold: f64,
    /// Eigenface components to keep; 0 keeps all of them.
    pub eigen_components: i32,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            corpus_dir: lookup("FACEGATE_CORPUS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("TrainedFaces")),
            holding_dir: lookup("FACEGATE_HOLDING_DIR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOLDING_DIR.to_string()),
            cascade_path: lookup("FACEGATE_CASCADE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("haarcascade_frontalface_default.xml")),
            match_threshold: parse_or(&lookup, "FACEGATE_MATCH_THRESHOLD", f64::MAX),
            eigen_components: parse_or(&lookup, "FACEGATE_EIGEN_COMPONENTS", 0),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.corpus_dir, PathBuf::from("TrainedFaces"));
        assert_eq!(c.holding_dir, "UnknownEmployeeFolder");
        assert_eq!(c.cascade_path, PathBuf::from("haarcascade_frontalface_default.xml"));
        assert_eq!(c.match_threshold, f64::MAX);
        assert_eq!(c.eigen_components, 0);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("FACEGATE_CORPUS_DIR", "/srv/faces"),
            ("FACEGATE_HOLDING_DIR", "probes"),
            ("FACEGATE_CASCADE_PATH", "/opt/cascade.xml"),
            ("FACEGATE_MATCH_THRESHOLD", " 3500.5 "),
            ("FACEGATE_EIGEN_COMPONENTS", "80"),
        ]);
        assert_eq!(c.corpus_dir, PathBuf::from("/srv/faces"));
        assert_eq!(c.holding_dir, "probes");
        assert_eq!(c.cascade_path, PathBuf::from("/opt/cascade.xml"));
        assert_eq!(c.match_threshold, 3500.5);
        assert_eq!(c.eigen_components, 80);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let c = config(&[
            ("FACEGATE_MATCH_THRESHOLD", "close"),
            ("FACEGATE_EIGEN_COMPONENTS", "-"),
            ("FACEGATE_HOLDING_DIR", "  "),
        ]);
        assert_eq!(c.match_threshold, f64::MAX);
        assert_eq!(c.eigen_components, 0);
        assert_eq!(c.holding_dir, "UnknownEmployeeFolder");
    }
}
