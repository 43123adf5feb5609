//! Checkpoint file format: save/resume for both in-flight geodesic state
//! (slow-light multi-frame runs) and finished per-pixel samples.
//!
//! Layout, all little-endian:
//!
//! ```text
//! magic:   [u8; 4]   "BLK1"
//! version: u32
//! kind:    u8         0 = Geodesics, 1 = Samples
//! ndim:    u32
//! shape:   [u64; ndim]
//! payload: bincode-encoded body
//! ```
//!
//! A run either saves a checkpoint or resumes from one, never both in the
//! same invocation -- [`CheckpointRequest`] encodes that as an enum rather
//! than two independent booleans so the mutual exclusion is structural.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::CheckpointError;

const MAGIC: [u8; 4] = *b"BLK1";
const VERSION: u32 = 1;

/// What a checkpoint file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    /// In-flight geodesic integrator states, keyed by pixel, for resuming a
    /// slow-light run mid-frame.
    Geodesics,
    /// Finished per-pixel radiative-transfer samples (the image buffer).
    Samples,
}

impl CheckpointKind {
    fn tag(self) -> u8 {
        match self {
            CheckpointKind::Geodesics => 0,
            CheckpointKind::Samples => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CheckpointKind::Geodesics),
            1 => Some(CheckpointKind::Samples),
            _ => None,
        }
    }
}

/// A single run's checkpoint directive: exactly one of save-to or
/// resume-from a path, never both.
pub enum CheckpointRequest<'a> {
    None,
    SaveTo(&'a Path),
    ResumeFrom(&'a Path),
}

/// Write `payload` to `path` as a checkpoint of the given `kind` and
/// `shape` (e.g. `[height, width]` for an image buffer).
pub fn save<T: Serialize>(
    path: &Path,
    kind: CheckpointKind,
    shape: &[usize],
    payload: &T,
) -> Result<(), CheckpointError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&MAGIC)?;
    writer.write_u32::<LittleEndian>(VERSION)?;
    writer.write_u8(kind.tag())?;
    writer.write_u32::<LittleEndian>(shape.len() as u32)?;
    for &dim in shape {
        writer.write_u64::<LittleEndian>(dim as u64)?;
    }

    let body = bincode::serialize(payload)?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Read a checkpoint from `path`, validating its kind and shape against
/// `expected_kind`/`expected_shape` before decoding the payload.
pub fn load<T: DeserializeOwned>(
    path: &Path,
    expected_kind: CheckpointKind,
    expected_shape: &[usize],
) -> Result<T, CheckpointError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CheckpointError::BadMagic { expected: MAGIC, found: magic });
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(CheckpointError::UnsupportedVersion { expected: VERSION, found: version });
    }

    let tag = reader.read_u8()?;
    let kind = CheckpointKind::from_tag(tag).ok_or(CheckpointError::UnsupportedVersion {
        expected: expected_kind.tag() as u32,
        found: tag as u32,
    })?;
    if kind != expected_kind {
        return Err(CheckpointError::ShapeMismatch {
            checkpoint_dims: vec![kind.tag() as usize],
            renderer_dims: vec![expected_kind.tag() as usize],
        });
    }

    let ndim = reader.read_u32::<LittleEndian>()? as usize;
    let mut shape = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        shape.push(reader.read_u64::<LittleEndian>()? as usize);
    }
    if shape != expected_shape {
        return Err(CheckpointError::ShapeMismatch { checkpoint_dims: shape, renderer_dims: expected_shape.to_vec() });
    }

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    let payload = bincode::deserialize(&rest)?;
    Ok(payload)
}
