//! Matrix expansion
//!
//! Expands a job's `strategy.matrix` declaration into concrete axis-value
//! combinations. Exclude rules filter the generated cross product before
//! include entries are appended as extra combinations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One concrete assignment of matrix axis names to values
pub type Combination = HashMap<String, serde_yaml::Value>;

/// A job matrix: named axes plus explicit include/exclude combinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Matrix {
    /// Extra combinations appended after expansion
    #[serde(default)]
    pub include: Vec<Combination>,

    /// Combinations removed from the generated cross product
    #[serde(default)]
    pub exclude: Vec<Combination>,

    /// Axis name to ordered values
    #[serde(flatten)]
    pub axes: HashMap<String, Vec<serde_yaml::Value>>,
}

impl Matrix {
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.include.is_empty()
    }

    /// Expand into one combination per cross-product entry.
    ///
    /// Excludes apply to generated combinations only; includes are appended
    /// verbatim afterwards and are never excluded. A matrix with no axes
    /// expands to a single empty combination.
    pub fn expand(&self) -> Vec<Combination> {
        let mut names: Vec<&String> = self.axes.keys().collect();
        names.sort();

        let mut combinations: Vec<Combination> = vec![HashMap::new()];
        for name in names {
            let values = &self.axes[name];
            let mut next = Vec::with_capacity(combinations.len() * values.len());
            for combination in &combinations {
                for value in values {
                    let mut extended = combination.clone();
                    extended.insert(name.clone(), value.clone());
                    next.push(extended);
                }
            }
            combinations = next;
        }

        combinations.retain(|combination| {
            !self
                .exclude
                .iter()
                .any(|excluded| matches_combination(excluded, combination))
        });

        combinations.extend(self.include.iter().cloned());
        combinations
    }
}

/// An exclude entry matches when every key it names carries the same value
/// on the combination.
fn matches_combination(excluded: &Combination, combination: &Combination) -> bool {
    !excluded.is_empty()
        && excluded
            .iter()
            .all(|(key, value)| combination.get(key) == Some(value))
}

/// Render a matrix value the way it appears in env vars and run names
pub fn value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(yaml: &str) -> Matrix {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_cross_product() {
        let m = matrix("os: [a, b]\nflag: [x, y]\n");
        let combos = m.expand();
        assert_eq!(combos.len(), 4);
    }

    #[test]
    fn test_exclude_removes_matching_combination() {
        let m = matrix("os: [a, b]\nflag: [x, y]\nexclude:\n  - os: a\n    flag: x\n");
        let combos = m.expand();
        assert_eq!(combos.len(), 3);
        assert!(!combos.iter().any(|c| {
            value_to_string(&c["os"]) == "a" && value_to_string(&c["flag"]) == "x"
        }));
    }

    #[test]
    fn test_include_appends_after_exclude() {
        let m = matrix(
            "os: [a, b]\nflag: [x, y]\nexclude:\n  - os: a\n    flag: x\ninclude:\n  - os: c\n    extra: z\n",
        );
        let combos = m.expand();
        assert_eq!(combos.len(), 4);
        assert!(combos
            .iter()
            .any(|c| c.contains_key("extra") && value_to_string(&c["os"]) == "c"));
    }

    #[test]
    fn test_partial_exclude_matches_all_named_keys() {
        // Excluding on one axis removes every combination carrying that value.
        let m = matrix("os: [a, b]\nflag: [x, y]\nexclude:\n  - os: a\n");
        let combos = m.expand();
        assert_eq!(combos.len(), 2);
        assert!(combos.iter().all(|c| value_to_string(&c["os"]) == "b"));
    }

    #[test]
    fn test_empty_matrix_yields_one_combination() {
        let m = Matrix::default();
        assert!(m.is_empty());
        let combos = m.expand();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_value_rendering() {
        let m = matrix("version: [12, 14.1, stable, true]\n");
        let combos = m.expand();
        let rendered: Vec<String> = combos
            .iter()
            .map(|c| value_to_string(&c["version"]))
            .collect();
        assert!(rendered.contains(&"12".to_string()));
        assert!(rendered.contains(&"14.1".to_string()));
        assert!(rendered.contains(&"stable".to_string()));
        assert!(rendered.contains(&"true".to_string()));
    }
}
