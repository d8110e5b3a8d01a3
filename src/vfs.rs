//! Virtual filesystem over the music root: sandboxed paths, listing entries
//! and the resolver that turns a directory into tracks.

mod list;
mod model;
mod path;

pub use list::{change_dir, list};
pub use model::{Directory, Entry, Track};
pub use path::{Root, VfsPath};
