//! On-disk format for the vector index
//!
//! A directory holding `index.bin` (bincode header plus the flat vector
//! array) and `passages.json` (the parallel passage array). The header
//! carries a SHA-256 of the passage file so a mismatched pair is rejected.
//! Both files are written to temporaries in the same directory and renamed
//! into place.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::Passage;

use super::flat::VectorIndex;

pub const INDEX_FILE: &str = "index.bin";
pub const PASSAGES_FILE: &str = "passages.json";

const MAGIC: [u8; 4] = *b"KSVI";
const FORMAT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
struct StoredIndex {
    magic: [u8; 4],
    version: u32,
    dimensions: u64,
    model_id: String,
    count: u64,
    passages_sha256: [u8; 32],
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Write the index into `dir`, replacing any previous index
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let passage_bytes = serde_json::to_vec(self.passages())?;
        let stored = StoredIndex {
            magic: MAGIC,
            version: FORMAT_VERSION,
            dimensions: self.dimensions() as u64,
            model_id: self.model_id().to_string(),
            count: self.len() as u64,
            passages_sha256: Sha256::digest(&passage_bytes).into(),
            vectors: self.raw_vectors().to_vec(),
        };
        let index_bytes = bincode::serde::encode_to_vec(&stored, bincode::config::standard())
            .map_err(|e| Error::corrupt_index(dir, format!("failed to encode index: {}", e)))?;

        // Stage both files before replacing either
        let index_tmp = write_temp(dir, &index_bytes)?;
        let passages_tmp = write_temp(dir, &passage_bytes)?;

        passages_tmp
            .persist(dir.join(PASSAGES_FILE))
            .map_err(|e| Error::Io(e.error))?;
        index_tmp
            .persist(dir.join(INDEX_FILE))
            .map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "Persisted {} vectors ({} dims) to {}",
            self.len(),
            self.dimensions(),
            dir.display()
        );
        Ok(dir.to_path_buf())
    }

    /// Read an index from `dir`, requiring `expected_dimensions`
    pub fn load(dir: impl AsRef<Path>, expected_dimensions: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let index_path = dir.join(INDEX_FILE);
        let passages_path = dir.join(PASSAGES_FILE);

        if !index_path.is_file() || !passages_path.is_file() {
            return Err(Error::IndexNotFound(dir.to_path_buf()));
        }

        let index_bytes = std::fs::read(&index_path)?;
        let (stored, _): (StoredIndex, usize) =
            bincode::serde::decode_from_slice(&index_bytes, bincode::config::standard())
                .map_err(|e| Error::corrupt_index(&index_path, e.to_string()))?;

        if stored.magic != MAGIC {
            return Err(Error::corrupt_index(&index_path, "not a vector index file"));
        }
        if stored.version != FORMAT_VERSION {
            return Err(Error::corrupt_index(
                &index_path,
                format!(
                    "unsupported format version {} (expected {})",
                    stored.version, FORMAT_VERSION
                ),
            ));
        }

        let dimensions = stored.dimensions as usize;
        if dimensions != expected_dimensions {
            return Err(Error::DimensionMismatch {
                expected: expected_dimensions,
                actual: dimensions,
            });
        }

        let count = stored.count as usize;
        if dimensions == 0 || stored.vectors.len() != count * dimensions {
            return Err(Error::corrupt_index(
                &index_path,
                format!(
                    "{} values stored for {} vectors of {} dims",
                    stored.vectors.len(),
                    count,
                    dimensions
                ),
            ));
        }
        if stored.vectors.iter().any(|v| !v.is_finite()) {
            return Err(Error::corrupt_index(&index_path, "non-finite vector values"));
        }

        let passage_bytes = std::fs::read(&passages_path)?;
        let digest: [u8; 32] = Sha256::digest(&passage_bytes).into();
        if digest != stored.passages_sha256 {
            return Err(Error::corrupt_index(
                &passages_path,
                "passage file does not match the vector index",
            ));
        }
        let passages: Vec<Passage> = serde_json::from_slice(&passage_bytes)
            .map_err(|e| Error::corrupt_index(&passages_path, e.to_string()))?;
        if passages.len() != count {
            return Err(Error::corrupt_index(
                &passages_path,
                format!("{} passages for {} vectors", passages.len(), count),
            ));
        }

        tracing::info!(
            "Loaded {} vectors ({} dims, model {}) from {}",
            count,
            dimensions,
            stored.model_id,
            dir.display()
        );
        Ok(VectorIndex::from_parts(
            dimensions,
            stored.model_id,
            stored.vectors,
            passages,
        ))
    }
}

fn write_temp(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use crate::types::SourceRef;

    fn sample() -> VectorIndex {
        let entries = (0..4)
            .map(|i| {
                IndexEntry::new(
                    vec![i as f32, 1.0, -0.5],
                    Passage {
                        text: format!("passage {}", i),
                        source: SourceRef::new("manual.pdf", Some(i + 1)),
                        chunk_index: 0,
                        char_start: 0,
                        char_end: 9,
                    },
                )
            })
            .collect();
        VectorIndex::build(3, "test-model", entries).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample();
        index.persist(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path(), 3).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.model_id(), "test-model");
        assert_eq!(loaded.raw_vectors(), index.raw_vectors());

        let query = [0.7, 0.2, 0.1];
        assert_eq!(
            loaded.search(&query, 4).unwrap(),
            index.search(&query, 4).unwrap()
        );
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path().join("absent"), 3),
            Err(Error::IndexNotFound(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_at_load() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path(), 384),
            Err(Error::DimensionMismatch { expected: 384, actual: 3 })
        ));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"not bincode").unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path(), 3),
            Err(Error::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_passage_count_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();
        std::fs::write(dir.path().join(PASSAGES_FILE), b"[]").unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path(), 3),
            Err(Error::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_persist_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();
        sample().persist(dir.path()).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![INDEX_FILE, PASSAGES_FILE]);
    }

    #[test]
    fn test_passages_from_another_build_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();

        let mut other: Vec<Passage> = sample().passages().to_vec();
        for passage in &mut other {
            passage.text = passage.text.replace("passage", "stale");
        }
        std::fs::write(
            dir.path().join(PASSAGES_FILE),
            serde_json::to_vec(&other).unwrap(),
        )
        .unwrap();

        match VectorIndex::load(dir.path(), 3) {
            Err(Error::CorruptIndex { path, .. }) => {
                assert_eq!(path, dir.path().join(PASSAGES_FILE))
            }
            other => panic!("expected a corrupt index, got {:?}", other.map(|i| i.len())),
        }
    }
}
