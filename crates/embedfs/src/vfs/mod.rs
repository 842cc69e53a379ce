//! Read-side virtual filesystem.
//!
//! The VFS is what generated artifacts and scanned trees are served
//! through. Directories hold files by name and subdirectories as
//! [`DirResolver`]s. Files materialize their bytes lazily through a
//! [`DataPack`].
//!
//! All lookups normalize their input first, so `"/a/b/"`, `"a\\b"` and
//! `"a/./b"` resolve to the same place.

mod dir;
mod file;
mod table;

pub use dir::{DirResolver, VirtualDir};
pub use file::{DataPack, VirtualFile};
pub use table::VirtualFs;
