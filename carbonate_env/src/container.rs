//! Binary array container (`.cstr`) for named dense arrays.
//!
//! Format:
//! ```text
//! [magic: "CSTR"][version: 1 byte][entry count: u32 LE]
//! per entry:
//!   [name len: u16 LE][name: UTF-8][rank: u8][dims: rank × u64 LE]
//!   [data: product(dims) × f64 LE, row-major][crc32 of the entry: u32 LE]
//! ```
//!
//! Writes go to a temporary sibling file which is fsynced and renamed over
//! the target, so readers see either every array or none.

use crate::error::{CarbonateError, Result};
use crate::types::ArrayBundle;
use crc32fast::Hasher;
use ndarray::{ArrayD, IxDyn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Magic bytes at the start of every container.
pub const MAGIC: [u8; 4] = *b"CSTR";

/// Current container version.
const CONTAINER_VERSION: u8 = 1;

/// Upper bound on elements per entry accepted by the reader (1 Gi values).
const MAX_ENTRY_ELEMENTS: u64 = 1 << 30;

fn invalid_data(path: &Path, msg: impl Into<String>) -> CarbonateError {
    CarbonateError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into()),
    )
}

/// Encodes one entry (without its checksum).
fn encode_entry(name: &str, array: &ArrayD<f64>) -> std::io::Result<Vec<u8>> {
    let name_len = u16::try_from(name.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("array name too long: {} bytes", name.len()),
        )
    })?;
    let rank = u8::try_from(array.ndim()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("array {} has rank {}", name, array.ndim()),
        )
    })?;

    let mut out = Vec::with_capacity(2 + name.len() + 1 + 8 * array.ndim() + 8 * array.len());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(rank);
    for &dim in array.shape() {
        out.extend_from_slice(&(dim as u64).to_le_bytes());
    }
    // Logical iteration order is row-major regardless of memory layout.
    for &value in array.iter() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    Ok(out)
}

/// Atomic writer for array bundles.
///
/// Uses the write-to-temp-then-rename pattern.
pub struct ContainerWriter {
    final_path: PathBuf,
}

impl ContainerWriter {
    /// Creates a writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            final_path: path.into(),
        }
    }

    /// Writes every array of the bundle, or nothing on failure.
    pub fn write(&self, bundle: &ArrayBundle) -> Result<()> {
        let file_name = self
            .final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let temp_path = self
            .final_path
            .with_file_name(format!(".{}.tmp.{}", file_name, Uuid::new_v4()));

        match self.write_temp(&temp_path, bundle) {
            Ok(()) => fs::rename(&temp_path, &self.final_path).map_err(|e| {
                let _ = fs::remove_file(&temp_path);
                CarbonateError::io(&self.final_path, e)
            }),
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn write_temp(&self, temp_path: &Path, bundle: &ArrayBundle) -> Result<()> {
        let io_err = |e| CarbonateError::io(temp_path, e);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        let count = u32::try_from(bundle.len())
            .map_err(|_| invalid_data(temp_path, "too many arrays"))?;
        writer.write_all(&MAGIC).map_err(io_err)?;
        writer.write_all(&[CONTAINER_VERSION]).map_err(io_err)?;
        writer.write_all(&count.to_le_bytes()).map_err(io_err)?;

        for (name, array) in bundle.iter() {
            let entry = encode_entry(name, array).map_err(io_err)?;
            let mut hasher = Hasher::new();
            hasher.update(&entry);
            let crc = hasher.finalize();
            writer.write_all(&entry).map_err(io_err)?;
            writer.write_all(&crc.to_le_bytes()).map_err(io_err)?;
        }

        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
        Ok(())
    }
}

/// Reads a container back into a bundle, verifying every checksum.
pub fn read_container(path: impl AsRef<Path>) -> Result<ArrayBundle> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CarbonateError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let io_err = |e| CarbonateError::io(path, e);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(io_err)?;
    if magic != MAGIC {
        return Err(invalid_data(path, format!("bad magic {:?}", magic)));
    }
    let mut version = [0u8; 1];
    reader.read_exact(&mut version).map_err(io_err)?;
    if version[0] != CONTAINER_VERSION {
        return Err(invalid_data(
            path,
            format!(
                "unsupported container version: {} (expected {})",
                version[0], CONTAINER_VERSION
            ),
        ));
    }
    let mut count = [0u8; 4];
    reader.read_exact(&mut count).map_err(io_err)?;
    let count = u32::from_le_bytes(count);

    let mut bundle = ArrayBundle::new();
    for _ in 0..count {
        let mut hasher = Hasher::new();

        let mut name_len = [0u8; 2];
        reader.read_exact(&mut name_len).map_err(io_err)?;
        hasher.update(&name_len);
        let mut name = vec![0u8; u16::from_le_bytes(name_len) as usize];
        reader.read_exact(&mut name).map_err(io_err)?;
        hasher.update(&name);
        let name = String::from_utf8(name)
            .map_err(|_| invalid_data(path, "array name is not UTF-8"))?;

        let mut rank = [0u8; 1];
        reader.read_exact(&mut rank).map_err(io_err)?;
        hasher.update(&rank);

        let mut shape = Vec::with_capacity(rank[0] as usize);
        let mut elements: u64 = 1;
        for _ in 0..rank[0] {
            let mut dim = [0u8; 8];
            reader.read_exact(&mut dim).map_err(io_err)?;
            hasher.update(&dim);
            let dim = u64::from_le_bytes(dim);
            elements = elements.saturating_mul(dim);
            shape.push(dim as usize);
        }
        if elements > MAX_ENTRY_ELEMENTS {
            return Err(invalid_data(
                path,
                format!("array {} has {} elements, limit {}", name, elements, MAX_ENTRY_ELEMENTS),
            ));
        }

        let mut raw = vec![0u8; elements as usize * 8];
        reader.read_exact(&mut raw).map_err(io_err)?;
        hasher.update(&raw);

        let mut stored_crc = [0u8; 4];
        reader.read_exact(&mut stored_crc).map_err(io_err)?;
        let stored_crc = u32::from_le_bytes(stored_crc);
        let computed = hasher.finalize();
        if stored_crc != computed {
            return Err(invalid_data(
                path,
                format!(
                    "checksum mismatch in array {}: stored {:08x}, computed {:08x}",
                    name, stored_crc, computed
                ),
            ));
        }

        let data: Vec<f64> = raw
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_le_bytes(b)
            })
            .collect();
        let array = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| invalid_data(path, format!("array {}: {}", name, e)))?;
        bundle.insert(name, array);
    }
    Ok(bundle)
}
