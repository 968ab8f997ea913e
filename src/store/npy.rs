// Embedding store — NumPy `.npy` matrix plus an id sidecar.
//
// The matrix is written as NPY v1.0, little-endian f32, C order, so the
// original notebooks can still `np.load` it. Row i belongs to the document
// whose id is element i of `<name>.ids.json`. Loading refuses files whose
// row count and id count disagree.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex_lite::Regex;
use tracing::debug;

use crate::error::PipelineError;

const MAGIC: &[u8] = b"\x93NUMPY";

static SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'shape':\s*\(\s*(\d+)\s*,\s*(\d+)\s*,?\s*\)").expect("valid shape pattern")
});

/// Path of the id sidecar for an `.npy` file: `embeddings.npy` →
/// `embeddings.ids.json`.
pub fn ids_path(npy_path: &Path) -> PathBuf {
    npy_path.with_extension("ids.json")
}

/// Embedding rows keyed by document id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbeddings {
    pub ids: Vec<String>,
    pub dim: usize,
    pub vectors: Vec<Vec<f32>>,
}

impl StoredEmbeddings {
    /// Pair ids with vectors, checking counts and widths agree.
    pub fn new(ids: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(PipelineError::Misaligned {
                left: "ids".into(),
                right: "embeddings".into(),
                detail: format!("{} ids for {} vectors", ids.len(), vectors.len()),
            }
            .into());
        }
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        if dim == 0 && !vectors.is_empty() {
            anyhow::bail!("embedding rows must not be empty");
        }
        if let Some(pos) = vectors.iter().position(|v| v.len() != dim) {
            return Err(PipelineError::Misaligned {
                left: "embeddings".into(),
                right: "embeddings".into(),
                detail: format!(
                    "row {pos} has width {} but row 0 has width {dim}",
                    vectors[pos].len()
                ),
            }
            .into());
        }
        Ok(Self { ids, dim, vectors })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Vectors for `ids`, in that order. Every id must be present.
    pub fn aligned_to(&self, ids: &[String]) -> Result<Vec<Vec<f32>>> {
        let index: HashMap<&str, usize> = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        ids.iter()
            .map(|id| {
                index
                    .get(id.as_str())
                    .map(|&i| self.vectors[i].clone())
                    .ok_or_else(|| {
                        anyhow::Error::from(PipelineError::Misaligned {
                            left: "cleaned".into(),
                            right: "embeddings".into(),
                            detail: format!("no embedding for document {id}"),
                        })
                    })
            })
            .collect()
    }

    /// Write the matrix to `path` and the ids beside it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_npy_header(&mut file, self.len(), self.dim)?;

        let mut data = Vec::with_capacity(self.len() * self.dim * 4);
        for v in &self.vectors {
            for x in v {
                data.extend_from_slice(&x.to_le_bytes());
            }
        }
        file.write_all(&data)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let ids_file = ids_path(path);
        let json = serde_json::to_string(&self.ids).context("Failed to serialize embedding ids")?;
        std::fs::write(&ids_file, json)
            .with_context(|| format!("Failed to write {}", ids_file.display()))?;

        debug!(rows = self.len(), dim = self.dim, path = %path.display(), "Saved embeddings");
        Ok(())
    }

    /// Load a matrix and its id sidecar.
    pub fn load(path: &Path) -> Result<Self> {
        let ids_file = ids_path(path);
        for p in [path, ids_file.as_path()] {
            if !p.exists() {
                return Err(PipelineError::missing(p).into());
            }
        }

        let mut bytes = Vec::new();
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let (rows, dim, offset) =
            parse_npy_header(&bytes).with_context(|| format!("Invalid npy file {}", path.display()))?;

        if dim == 0 && rows > 0 {
            anyhow::bail!("{} declares {rows} rows of width 0", path.display());
        }
        let expected = rows
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .with_context(|| format!("{} declares an oversized shape ({rows}, {dim})", path.display()))?;

        let body = &bytes[offset..];
        if body.len() != expected {
            anyhow::bail!(
                "{} declares shape ({rows}, {dim}) but holds {} bytes of data",
                path.display(),
                body.len()
            );
        }

        let flat: Vec<f32> = body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let vectors: Vec<Vec<f32>> = if rows == 0 {
            Vec::new()
        } else {
            flat.chunks(dim).map(<[f32]>::to_vec).collect()
        };

        let ids: Vec<String> = serde_json::from_str(
            &std::fs::read_to_string(&ids_file)
                .with_context(|| format!("Failed to read {}", ids_file.display()))?,
        )
        .with_context(|| format!("Failed to parse {}", ids_file.display()))?;

        if ids.len() != rows {
            return Err(PipelineError::Misaligned {
                left: ids_file.display().to_string(),
                right: path.display().to_string(),
                detail: format!("{} ids for {rows} rows", ids.len()),
            }
            .into());
        }

        Ok(Self { ids, dim, vectors })
    }
}

fn write_npy_header(w: &mut impl Write, rows: usize, dim: usize) -> Result<()> {
    let dict = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {dim}), }}");
    // magic(6) + version(2) + header_len(2) + dict + padding + '\n' ≡ 0 mod 64
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header = format!("{dict}{}\n", " ".repeat(padding));

    w.write_all(MAGIC)?;
    w.write_all(&[1, 0])?;
    w.write_all(&(header.len() as u16).to_le_bytes())?;
    w.write_all(header.as_bytes())?;
    Ok(())
}

/// Returns (rows, dim, data offset).
fn parse_npy_header(bytes: &[u8]) -> Result<(usize, usize, usize)> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        anyhow::bail!("not an npy file");
    }
    let (header_len, start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        v => anyhow::bail!("unsupported npy version {v}"),
    };
    let end = start + header_len;
    let header = std::str::from_utf8(bytes.get(start..end).context("truncated npy header")?)
        .context("npy header is not UTF-8")?;

    if !header.contains("'descr': '<f4'") {
        anyhow::bail!("expected little-endian f32 data, header was {header}");
    }
    if header.contains("'fortran_order': True") {
        anyhow::bail!("Fortran-ordered arrays are not supported");
    }
    let caps = SHAPE
        .captures(header)
        .with_context(|| format!("expected a 2-D shape in header {header}"))?;
    let rows: usize = caps[1].parse()?;
    let dim: usize = caps[2].parse()?;
    Ok((rows, dim, end))
}
