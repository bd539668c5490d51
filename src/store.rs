//! On-disk stores: document texts and index artifacts.
//!
//! Layout under the configured data directory:
//!
//! ```text
//! <data_dir>/docs/<doc_id>.txt      cleaned document text
//! <data_dir>/index/chunks.jsonl     full chunk records (with text)
//! <data_dir>/index/metadata.jsonl   chunk metadata, matrix row order
//! <data_dir>/index/embeddings.mat   dense f32 matrix, little-endian
//! <data_dir>/index/vectors.idx      id-keyed vector index records
//! <data_dir>/index/manifest.json    build-time manifest
//! ```
//!
//! Every write goes through [`write_atomic`] (temp file + rename), so a
//! crash mid-rebuild never leaves a half-written artifact behind; readers
//! see either the old file or the new one.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::models::IndexManifest;

pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const METADATA_FILE: &str = "metadata.jsonl";
pub const MATRIX_FILE: &str = "embeddings.mat";
pub const INDEX_FILE: &str = "vectors.idx";
pub const MANIFEST_FILE: &str = "manifest.json";

const MATRIX_MAGIC: &[u8; 4] = b"CIMX";
const INDEX_MAGIC: &[u8; 4] = b"CIVX";
const FORMAT_VERSION: u8 = 1;

/// Write `bytes` to `path` atomically: write a sibling temp file, then
/// rename over the destination. Creates parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// ============ Document store ============

/// Store a document's cleaned text as `<docs_dir>/<doc_id>.txt`.
pub fn save_document_text(docs_dir: &Path, doc_id: &str, text: &str) -> Result<PathBuf> {
    let path = docs_dir.join(format!("{doc_id}.txt"));
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}

/// Load a stored document's text; unknown ids are a typed condition, not a
/// raw IO error.
pub fn load_document_text(docs_dir: &Path, doc_id: &str) -> Result<String> {
    let path = docs_dir.join(format!("{doc_id}.txt"));
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(EngineError::DocumentNotFound(doc_id.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// List stored document ids (`.txt` stems), sorted for deterministic
/// rebuild order.
pub fn list_documents(docs_dir: &Path) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    if !docs_dir.exists() {
        return Ok(ids);
    }
    for entry in fs::read_dir(docs_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}

// ============ JSONL records ============

/// Write records as newline-delimited JSON.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    write_atomic(path, &buf)
}

/// Read newline-delimited JSON records, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

// ============ Embedding matrix ============

/// Write the dense embedding matrix: magic, version, `u32` row count,
/// `u32` dims, then row-major little-endian `f32` data.
pub fn write_matrix(path: &Path, rows: &[Vec<f32>], dims: usize) -> Result<()> {
    let mut buf = Vec::with_capacity(13 + rows.len() * dims * 4);
    buf.extend_from_slice(MATRIX_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(dims as u32).to_le_bytes());
    for row in rows {
        if row.len() != dims {
            return Err(EngineError::DimensionMismatch {
                expected: dims,
                actual: row.len(),
            });
        }
        for v in row {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    write_atomic(path, &buf)
}

/// Read the matrix back; returns `(rows, dims)`.
pub fn read_matrix(path: &Path) -> Result<(Vec<Vec<f32>>, usize)> {
    let bytes = fs::read(path)?;
    let mut cursor = Cursor::new(&bytes, path);
    cursor.expect_magic(MATRIX_MAGIC)?;
    cursor.expect_version()?;
    let n_rows = cursor.read_u32()? as usize;
    let dims = cursor.read_u32()? as usize;

    let mut rows = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        rows.push(cursor.read_f32_vec(dims)?);
    }
    Ok((rows, dims))
}

// ============ Vector index records ============

/// Write the id-keyed vector index: header as the matrix, then per row a
/// `u16` id length, the id bytes, and the row's vector. `ids` and `rows`
/// are parallel and in matrix row order.
pub fn write_vector_index(
    path: &Path,
    ids: &[String],
    rows: &[Vec<f32>],
    dims: usize,
) -> Result<()> {
    if ids.len() != rows.len() {
        return Err(EngineError::Corrupt(format!(
            "vector index has {} ids but {} rows",
            ids.len(),
            rows.len()
        )));
    }
    let mut buf = Vec::new();
    buf.extend_from_slice(INDEX_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(dims as u32).to_le_bytes());
    for (id, row) in ids.iter().zip(rows) {
        if row.len() != dims {
            return Err(EngineError::DimensionMismatch {
                expected: dims,
                actual: row.len(),
            });
        }
        let id_bytes = id.as_bytes();
        let id_len = u16::try_from(id_bytes.len())
            .map_err(|_| EngineError::Corrupt(format!("chunk id too long: {id}")))?;
        buf.extend_from_slice(&id_len.to_le_bytes());
        buf.extend_from_slice(id_bytes);
        for v in row {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    write_atomic(path, &buf)
}

/// Read the vector index back; returns `(entries, dims)` in stored order.
pub fn read_vector_index(path: &Path) -> Result<(Vec<(String, Vec<f32>)>, usize)> {
    let bytes = fs::read(path)?;
    let mut cursor = Cursor::new(&bytes, path);
    cursor.expect_magic(INDEX_MAGIC)?;
    cursor.expect_version()?;
    let n_rows = cursor.read_u32()? as usize;
    let dims = cursor.read_u32()? as usize;

    let mut entries = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let id_len = cursor.read_u16()? as usize;
        let id = cursor.read_string(id_len)?;
        let vector = cursor.read_f32_vec(dims)?;
        entries.push((id, vector));
    }
    Ok((entries, dims))
}

// ============ Manifest ============

pub fn write_manifest(path: &Path, manifest: &IndexManifest) -> Result<()> {
    let json = serde_json::to_vec_pretty(manifest)?;
    write_atomic(path, &json)
}

pub fn read_manifest(path: &Path) -> Result<IndexManifest> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

// ============ Binary decode helper ============

/// Bounds-checked reader over an artifact's bytes. Truncated or mangled
/// files surface as [`EngineError::Corrupt`] naming the file.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self { bytes, pos: 0, path }
    }

    fn corrupt(&self, what: &str) -> EngineError {
        EngineError::Corrupt(format!("{}: {}", self.path.display(), what))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| self.corrupt("unexpected end of file"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn expect_magic(&mut self, magic: &[u8; 4]) -> Result<()> {
        if self.take(4)? != magic {
            return Err(self.corrupt("bad magic"));
        }
        Ok(())
    }

    fn expect_version(&mut self) -> Result<()> {
        let version = self.take(1)?[0];
        if version != FORMAT_VERSION {
            return Err(self.corrupt(&format!("unsupported format version {version}")));
        }
        Ok(())
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_string(&mut self, len: usize) -> Result<String> {
        let b = self.take(len)?;
        String::from_utf8(b.to_vec()).map_err(|_| self.corrupt("id is not valid UTF-8"))
    }

    fn read_f32_vec(&mut self, dims: usize) -> Result<Vec<f32>> {
        let b = self.take(dims * 4)?;
        Ok(b.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}
