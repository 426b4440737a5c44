use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use super::traits::BundleStore;
use crate::tl_file::TranslationFile;
use crate::utils::{Result, TlError};

/// Marks a bundle as written by these tools
pub const PATCH_MARKER: [u8; 2] = [0x08, 0x04];

/// Bytes of the big-endian timestamp before the marker
const TIMESTAMP_LEN: usize = 5;
const MAX_TIMESTAMP: u64 = (1 << (TIMESTAMP_LEN * 8)) - 1;

/// Trailer appended to a patched bundle: a 5-byte big-endian timestamp
/// (the translation file's `modified`) and the marker. Without a timestamp
/// only the marker is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchTrailer {
    pub timestamp: Option<u64>,
}

impl PatchTrailer {
    /// Length of a trailer carrying a timestamp
    pub const LEN: usize = TIMESTAMP_LEN + PATCH_MARKER.len();

    pub fn new(timestamp: Option<u64>) -> Self {
        Self { timestamp }
    }

    /// Write the trailer at the end of `buf`
    ///
    /// # Arguments
    /// * `buf` - bundle bytes, usually without a previous trailer
    ///
    /// # Errors
    /// A timestamp that does not fit in the 5-byte field.
    pub fn append_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        if let Some(ts) = self.timestamp {
            if ts > MAX_TIMESTAMP {
                return Err(TlError::InvalidShape(format!(
                    "timestamp {ts} does not fit in {TIMESTAMP_LEN} bytes"
                )));
            }
            buf.write_uint::<BigEndian>(ts, TIMESTAMP_LEN)?;
        }
        buf.extend_from_slice(&PATCH_MARKER);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(Self::LEN);
        self.append_to(&mut buf)?;
        Ok(buf)
    }
}

/// Patch state read back from a bundle's last bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchState {
    pub patched: bool,
    /// Timestamp before the marker, only meaningful when patched
    pub timestamp: Option<u64>,
}

impl PatchState {
    /// Decode the trailer at the end of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.len().checked_sub(PatchTrailer::LEN) {
            Some(start) => Self::decode(&bytes[start..]),
            None => Self::default(),
        }
    }

    /// Decode exactly [`PatchTrailer::LEN`] bytes
    fn decode(tail: &[u8]) -> Self {
        if tail.len() != PatchTrailer::LEN || tail[TIMESTAMP_LEN..] != PATCH_MARKER {
            return Self::default();
        }
        let timestamp = Cursor::new(&tail[..TIMESTAMP_LEN])
            .read_uint::<BigEndian>(TIMESTAMP_LEN)
            .ok();
        Self {
            patched: true,
            timestamp,
        }
    }
}

/// Read the patch state of a bundle file. Unreadable or short files count
/// as unpatched.
pub fn read_patch_state(path: &Path) -> PatchState {
    let read_tail = || -> std::io::Result<[u8; PatchTrailer::LEN]> {
        let mut f = File::open(path)?;
        f.seek(SeekFrom::End(-(PatchTrailer::LEN as i64)))?;
        let mut tail = [0u8; PatchTrailer::LEN];
        f.read_exact(&mut tail)?;
        Ok(tail)
    };
    match read_tail() {
        Ok(tail) => PatchState::decode(&tail),
        Err(e) => {
            debug!("No patch state for {:?}: {}", path, e);
            PatchState::default()
        }
    }
}

/// Trailer stamped with a translation file's `modified` time
pub fn trailer_for(file: &TranslationFile) -> PatchTrailer {
    PatchTrailer::new(file.modified().and_then(|m| u64::try_from(m).ok()))
}

/// Bundles stored on disk as `<root>/<first two chars of name>/<name>`,
/// the game's data layout
#[derive(Debug, Clone)]
pub struct FsBundleStore {
    root: PathBuf,
}

impl FsBundleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of a bundle: `<root>/<first two chars>/<name>`
    pub fn bundle_path(&self, name: &str) -> PathBuf {
        let prefix = name.get(..2).unwrap_or(name);
        self.root.join(prefix).join(name)
    }
}

impl BundleStore for FsBundleStore {
    fn exists(&self, name: &str) -> bool {
        self.bundle_path(name).is_file()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.bundle_path(name))?)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.bundle_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    fn patch_state(&self, name: &str) -> Result<PatchState> {
        Ok(read_patch_state(&self.bundle_path(name)))
    }
}
