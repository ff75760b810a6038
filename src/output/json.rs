//! Machine-readable result list
//!
//! The serialized form is also accepted by `--overrides`, so a later run can
//! pin exactly the versions this run produced.

use crate::domain::{RunLog, SemanticVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// One successfully changed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub package_id: String,
    pub previous_version: SemanticVersion,
    pub updated_version: SemanticVersion,
}

/// Proceeded operations, de-duplicated by (id, updated version)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultList {
    entries: Vec<ResultEntry>,
}

impl ResultList {
    pub fn from_log(log: &RunLog) -> Self {
        let mut seen = HashSet::new();
        let entries = log
            .proceeded()
            .filter_map(|op| {
                let updated = op.updated_version.clone()?;
                seen.insert((op.package_id.to_ascii_lowercase(), updated.clone()))
                    .then(|| ResultEntry {
                        package_id: op.package_id.clone(),
                        previous_version: op.previous_version.clone(),
                        updated_version: updated,
                    })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.entries)?;
        writeln!(writer)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        std::fs::write(path, buffer)
    }
}
