use serde::{Deserialize, Serialize};

/// A locale the catalogs are kept in.
///
/// `name` is what the model is told to translate into, `code` is the
/// directory name under the locales root.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub source: bool,
}

impl Language {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self { name: name.into(), code: code.into(), source: false }
    }

    pub fn source(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self { name: name.into(), code: code.into(), source: true }
    }

    /// Languages shipped with the project: English strings in code, Italian and French catalogs.
    pub fn default_table() -> Vec<Language> {
        vec![
            Language::source("English", "en"),
            Language::new("Italian", "it"),
            Language::new("French", "fr"),
        ]
    }

    /// Find a language by code; unknown codes get the code as their display name.
    pub fn lookup(table: &[Language], code: &str) -> Language {
        table
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .cloned()
            .unwrap_or_else(|| Language::new(code, code))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        let table = Language::default_table();
        assert_eq!(Language::lookup(&table, "IT").name, "Italian");

        let de = Language::lookup(&table, "de");
        assert_eq!(de.name, "de");
        assert!(!de.source);
    }

    #[test]
    fn display_includes_code() {
        assert_eq!(Language::new("French", "fr").to_string(), "French (fr)");
    }
}
