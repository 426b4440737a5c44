//! Bundle storage
//!
//! The binary container format of asset bundles is handled elsewhere; this
//! layer only moves named blobs in and out of storage and reads or writes
//! the trailer that marks a bundle as patched.
pub mod bundle_io;
pub mod traits;

pub use bundle_io::{
    read_patch_state, trailer_for, FsBundleStore, PatchState, PatchTrailer, PATCH_MARKER,
};
pub use traits::BundleStore;
