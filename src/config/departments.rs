//! Department catalog.
//!
//! The ledger only stores department short codes. Display names come from the
//! `[[departments]]` entries in `config.toml`; codes missing from the catalog are
//! shown as-is.

use serde::Deserialize;

/// One `[[departments]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DepartmentConfig {
    /// Short code as stored on the ledger, e.g. `"MOH"`
    pub id: String,
    /// English display name
    pub name: String,
    /// Malay display name
    #[serde(default)]
    pub name_ms: Option<String>,
}

/// Lookup table from department code to display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentCatalog {
    entries: Vec<DepartmentConfig>,
}

impl DepartmentCatalog {
    /// Builds a catalog from configured entries.
    #[must_use]
    pub const fn new(entries: Vec<DepartmentConfig>) -> Self {
        Self { entries }
    }

    /// Configured entry for a code, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DepartmentConfig> {
        self.entries.iter().find(|d| d.id == id)
    }

    /// English name, falling back to the code itself.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |d| d.name.as_str())
    }

    /// Malay name, when configured.
    #[must_use]
    pub fn localized_name(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|d| d.name_ms.as_deref())
    }

    /// Number of configured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry(id: &str, name: &str, name_ms: &str) -> DepartmentConfig {
    DepartmentConfig {
        id: id.to_string(),
        name: name.to_string(),
        name_ms: Some(name_ms.to_string()),
    }
}

/// Catalog used when `config.toml` has no `[[departments]]` entries.
#[must_use]
pub fn default_departments() -> Vec<DepartmentConfig> {
    vec![
        entry("MOH", "Ministry of Health", "Kementerian Kesihatan"),
        entry("MOE", "Ministry of Education", "Kementerian Pendidikan"),
        entry("MOT", "Ministry of Transport", "Kementerian Pengangkutan"),
        entry("MOF", "Ministry of Finance", "Kementerian Kewangan"),
        entry("MOD", "Ministry of Defence", "Kementerian Pertahanan"),
        entry("MOHA", "Ministry of Home Affairs", "Kementerian Dalam Negeri"),
        entry(
            "MOSTI",
            "Ministry of Science, Technology and Innovation",
            "Kementerian Sains, Teknologi dan Inovasi",
        ),
        entry(
            "MOTAC",
            "Ministry of Tourism, Arts and Culture",
            "Kementerian Pelancongan, Seni dan Budaya",
        ),
    ]
}

impl Default for DepartmentCatalog {
    fn default() -> Self {
        Self::new(default_departments())
    }
}
