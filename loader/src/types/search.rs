use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field values a package must have, used to query the catalog.
///
/// Missing values are stored as empty strings so the option set always covers every
/// identifying field.
pub type SearchOptions = BTreeMap<String, String>;

/// Interchangeable field values, keyed by field name.
///
/// For example `{"department": [["DfE", "DCSF"]]}` lets a package from `DfE` be matched with one
/// still recorded under the old name `DCSF`. Synonyms are only consulted while searching.
pub type SynonymTable = BTreeMap<String, Vec<Vec<String>>>;

/// Results of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total number of hits reported by the catalog.
    pub count: usize,
    /// Names or ids of the matching packages.
    #[serde(default)]
    pub results: Vec<String>,
}
