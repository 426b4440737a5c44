use super::bundle_io::{PatchState, PatchTrailer};
use crate::utils::Result;

/// Named blob storage for asset bundles
///
/// Implementations only move bytes; trailer handling is provided on top.
pub trait BundleStore {
    /// Whether a bundle with this name is stored
    fn exists(&self, name: &str) -> bool;

    /// Full contents of a bundle
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace the contents of a bundle
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Write a bundle followed by a patch trailer
    fn write_with_trailer(&self, name: &str, bytes: &[u8], trailer: &PatchTrailer) -> Result<()> {
        let mut data = Vec::with_capacity(bytes.len() + PatchTrailer::LEN);
        data.extend_from_slice(bytes);
        trailer.append_to(&mut data)?;
        self.write(name, &data)
    }

    /// Patch state from the stored bytes
    fn patch_state(&self, name: &str) -> Result<PatchState> {
        Ok(PatchState::from_bytes(&self.read(name)?))
    }
}
