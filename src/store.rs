//! Physical overlay store: one YAML document per spike id in a flat
//! directory.
//!
//! Writes are temp-file-then-rename so a reader never observes a partially
//! written entry. Concurrent writes to the same id are last-writer-wins.
use crate::error::{Result, SpikeError};
use crate::model::{Origin, TemplateSpec};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound for a stored document. Oversized payloads are rejected before
/// any byte hits disk.
pub const MAX_DOC_BYTES: usize = 256 * 1024;

const DOC_EXT: &str = "yaml";

#[derive(Debug, Clone)]
pub struct SpikeStore {
    root: PathBuf,
}

impl SpikeStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<SpikeStore> {
        fs::create_dir_all(root)
            .map_err(|err| SpikeError::io(format!("create store root {}", root.display()), err))?;
        Ok(SpikeStore {
            root: root.to_path_buf(),
        })
    }

    /// Default store root under the platform data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fluorite")
            .join("spikes")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, id: &str) -> bool {
        match self.doc_path(id) {
            Ok(path) => path.is_file(),
            Err(_) => false,
        }
    }

    /// Read and parse a stored document. `Ok(None)` on a plain miss.
    pub fn read(&self, id: &str) -> Result<Option<TemplateSpec>> {
        let Some(raw) = self.read_raw(id)? else {
            return Ok(None);
        };
        let mut spec: TemplateSpec = serde_yaml::from_str(&raw)
            .map_err(|err| SpikeError::Validation(format!("parse stored spike {id}: {err}")))?;
        spec.id = id.to_string();
        spec.origin = Origin::Physical;
        Ok(Some(spec))
    }

    /// Raw document read-back for the `spec://<id>` resource. Byte-for-byte
    /// what the last upsert wrote.
    pub fn read_raw(&self, id: &str) -> Result<Option<String>> {
        let path = self.doc_path(id)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SpikeError::io(format!("read {}", path.display()), err)),
        }
    }

    /// Validate and atomically write a document. All-or-nothing: a failed
    /// write leaves any existing entry untouched.
    pub fn write(&self, id: &str, doc: &str) -> Result<()> {
        if doc.len() > MAX_DOC_BYTES {
            return Err(SpikeError::Validation(format!(
                "document for {id} is {} bytes, cap is {MAX_DOC_BYTES}",
                doc.len()
            )));
        }
        let path = self.doc_path(id)?;
        let tmp_path = self
            .root
            .join(format!(".{id}.{DOC_EXT}.tmp"));
        fs::write(&tmp_path, doc)
            .map_err(|err| SpikeError::io(format!("write {}", tmp_path.display()), err))?;
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(SpikeError::io(format!("publish {}", path.display()), err));
        }
        tracing::info!(id, bytes = doc.len(), "spike stored");
        Ok(())
    }

    /// Serialize and write a spec under its own id.
    pub fn write_spec(&self, spec: &TemplateSpec) -> Result<()> {
        let doc = serde_yaml::to_string(spec)
            .map_err(|err| SpikeError::Validation(format!("serialize spike {}: {err}", spec.id)))?;
        self.write(&spec.id, &doc)
    }

    /// All stored ids in lexicographic order (the store's stable enumeration
    /// order; a flat directory keeps no insertion log).
    pub fn ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let entries = fs::read_dir(&self.root)
            .map_err(|err| SpikeError::io(format!("read {}", self.root.display()), err))?;
        for entry in entries {
            let entry =
                entry.map_err(|err| SpikeError::io(format!("read {}", self.root.display()), err))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(id) = name.strip_suffix(&format!(".{DOC_EXT}")) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn doc_path(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(format!("{id}.{DOC_EXT}")))
    }
}

/// Ids become file names, so the charset is restricted to keep every document
/// inside the storage root. No separators, no dots, no traversal.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SpikeError::Validation("spike id must not be empty".to_string()));
    }
    if id.len() > 200 {
        return Err(SpikeError::Validation(format!(
            "spike id is {} chars, cap is 200",
            id.len()
        )));
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        return Err(SpikeError::Validation(format!(
            "spike id {id:?} may only contain lowercase alphanumerics, '-' and '_'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn upsert_round_trips_raw_document() {
        let dir = tempdir().unwrap();
        let store = SpikeStore::open(dir.path()).unwrap();
        let doc = "id: gen-express-route-basic-ts\nname: Custom route\ntags: [express]\n";
        store.write("gen-express-route-basic-ts", doc).unwrap();
        let raw = store.read_raw("gen-express-route-basic-ts").unwrap().unwrap();
        assert_eq!(raw, doc);
    }

    #[test]
    fn read_parses_and_marks_physical_origin() {
        let dir = tempdir().unwrap();
        let store = SpikeStore::open(dir.path()).unwrap();
        store
            .write("gen-express-route-basic-ts", "name: Custom route\n")
            .unwrap();
        let spec = store.read("gen-express-route-basic-ts").unwrap().unwrap();
        assert_eq!(spec.origin, Origin::Physical);
        assert_eq!(spec.id, "gen-express-route-basic-ts");
    }

    #[test]
    fn rejects_traversal_and_separator_ids() {
        for id in ["../escape", "a/b", "a\\b", "..", ".hidden", "UPPER"] {
            assert!(validate_id(id).is_err(), "{id} should be rejected");
        }
        validate_id("strike-nextjs-route-typed-ts").unwrap();
    }

    #[test]
    fn rejects_oversized_documents() {
        let dir = tempdir().unwrap();
        let store = SpikeStore::open(dir.path()).unwrap();
        let doc = "x".repeat(MAX_DOC_BYTES + 1);
        let err = store.write("gen-express-route-basic-ts", &doc).unwrap_err();
        assert!(matches!(err, SpikeError::Validation(_)));
        assert!(!store.contains("gen-express-route-basic-ts"));
    }

    #[test]
    fn ids_are_sorted_and_skip_temp_files() {
        let dir = tempdir().unwrap();
        let store = SpikeStore::open(dir.path()).unwrap();
        store.write("gen-vue-component-basic-ts", "name: b\n").unwrap();
        store.write("gen-express-route-basic-ts", "name: a\n").unwrap();
        fs::write(dir.path().join(".stray.yaml.tmp"), "junk").unwrap();
        assert_eq!(
            store.ids().unwrap(),
            vec![
                "gen-express-route-basic-ts".to_string(),
                "gen-vue-component-basic-ts".to_string()
            ]
        );
    }
}
