//! Read-only patient store backed by a JSON file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::error::DataSourceError;
use crate::patient::PatientRecord;

/// Reader for the BGSi patient file.
///
/// Nothing is cached: every call re-reads the file, so edits on disk show up
/// on the next page render.
#[derive(Debug, Clone)]
pub struct PatientStore {
    path: PathBuf,
}

impl PatientStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in file order
    pub fn load_all(&self) -> Result<Vec<PatientRecord>, DataSourceError> {
        let bytes = std::fs::read(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => DataSourceError::NotFound {
                path: self.path.clone(),
            },
            _ => DataSourceError::Unreadable {
                path: self.path.clone(),
                source,
            },
        })?;

        let records: Vec<PatientRecord> =
            serde_json::from_slice(&bytes).map_err(|source| DataSourceError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Patient store loaded");
        Ok(records)
    }

    /// Names for the patient selector, in file order
    pub fn names(&self) -> Result<Vec<String>, DataSourceError> {
        Ok(self.load_all()?.into_iter().map(|p| p.name).collect())
    }

    /// First record whose name matches exactly (ignoring surrounding whitespace)
    pub fn find_by_name(&self, name: &str) -> Result<PatientRecord, DataSourceError> {
        let wanted = name.trim();
        self.load_all()?
            .into_iter()
            .find(|p| p.name.trim() == wanted)
            .ok_or_else(|| DataSourceError::Lookup(wanted.to_string()))
    }

    /// Any one record, chosen uniformly
    pub fn pick_random(&self) -> Result<PatientRecord, DataSourceError> {
        let records = self.load_all()?;
        records
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(DataSourceError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"nama": "Siti", "tb_bb": "155/68", "rsid_data": "rs4149056", "kondisi_saat_ini": "Type 2 Diabetes"},
        {"nama": "Budi", "rsid_data": "rs1801133, rs7903146", "kondisi_saat_ini": "Hipertensi", "usia": 61}
    ]"#;

    fn store_with(contents: &str) -> (tempfile::NamedTempFile, PatientStore) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let store = PatientStore::new(file.path());
        (file, store)
    }

    #[test]
    fn test_load_all_and_names() {
        let (_file, store) = store_with(SAMPLE);
        assert_eq!(store.load_all().unwrap().len(), 2);
        assert_eq!(store.names().unwrap(), vec!["Siti", "Budi"]);
    }

    #[test]
    fn test_find_by_name() {
        let (_file, store) = store_with(SAMPLE);
        let siti = store.find_by_name(" Siti ").unwrap();
        assert_eq!(siti.rsid, "rs4149056");
        assert_eq!(siti.diagnosis, "Type 2 Diabetes");

        let missing = store.find_by_name("Rina").unwrap_err();
        assert!(matches!(missing, DataSourceError::Lookup(name) if name == "Rina"));
    }

    #[test]
    fn test_pick_random_returns_a_stored_record() {
        let (_file, store) = store_with(SAMPLE);
        let picked = store.pick_random().unwrap();
        assert!(["Siti", "Budi"].contains(&picked.name.as_str()));
    }

    #[test]
    fn test_pick_random_on_empty_store() {
        let (_file, store) = store_with("[]");
        assert!(matches!(store.pick_random(), Err(DataSourceError::Empty)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PatientStore::new(dir.path().join("data_genetik.json"));
        assert!(matches!(store.load_all(), Err(DataSourceError::NotFound { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let (_file, store) = store_with("{ not json");
        assert!(matches!(store.load_all(), Err(DataSourceError::Malformed { .. })));
    }

    #[test]
    fn test_reread_on_every_call() {
        let (file, store) = store_with(SAMPLE);
        assert_eq!(store.names().unwrap().len(), 2);

        std::fs::write(
            file.path(),
            r#"[{"nama": "Rina", "rsid_data": "rs429358", "kondisi_saat_ini": "Dislipidemia"}]"#,
        )
        .unwrap();
        assert_eq!(store.names().unwrap(), vec!["Rina"]);
    }
}
