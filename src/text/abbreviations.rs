use std::collections::{BTreeMap, HashMap};

/// Built-in abbreviation expansions.
const BUILTIN_ABBREVIATIONS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("cs", "csharp"),
    // keeps "java" from ever being rewritten by a lemma lookup
    ("java", "java"),
];

/// Case-insensitive abbreviation → canonical expansion table
#[derive(Debug, Clone)]
pub struct AbbreviationTable {
    entries: HashMap<String, String>,
}

impl AbbreviationTable {
    /// Empty table (no expansions at all)
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Built-in table with `overrides` merged on top
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::default();
        for (abbreviation, expansion) in overrides {
            table.insert(abbreviation, expansion);
        }
        table
    }

    pub fn insert(&mut self, abbreviation: &str, expansion: &str) {
        self.entries
            .insert(abbreviation.to_lowercase(), expansion.to_string());
    }

    /// Expansion for `word`, matched exactly but case-insensitively
    pub fn expand(&self, word: &str) -> Option<&str> {
        self.entries.get(&word.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AbbreviationTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (abbreviation, expansion) in BUILTIN_ABBREVIATIONS {
            table.insert(abbreviation, expansion);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_expansions() {
        let table = AbbreviationTable::default();
        assert_eq!(table.expand("js"), Some("javascript"));
        assert_eq!(table.expand("PY"), Some("python"));
        assert_eq!(table.expand("Java"), Some("java"));
        assert_eq!(table.expand("rust"), None);
    }

    #[test]
    fn test_overrides_merge() {
        let mut overrides = BTreeMap::new();
        overrides.insert("K8s".to_string(), "kubernetes".to_string());
        overrides.insert("js".to_string(), "ecmascript".to_string());

        let table = AbbreviationTable::with_overrides(&overrides);
        assert_eq!(table.expand("k8s"), Some("kubernetes"));
        assert_eq!(table.expand("js"), Some("ecmascript"));
        assert_eq!(table.expand("ts"), Some("typescript"));
    }

    #[test]
    fn test_no_partial_matches() {
        let table = AbbreviationTable::default();
        assert_eq!(table.expand("jsx"), None);
        assert_eq!(table.expand("j"), None);
    }
}
