use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Framework;

/// A starting point for a new project.
///
/// Templates are read-only input; their contents are not validated beyond
/// this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub framework: Framework,
    pub entry_file: String,
    pub files: BTreeMap<String, String>,
}
