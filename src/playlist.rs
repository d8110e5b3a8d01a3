//! Named track lists and the registry that owns them.

mod model;
mod registry;

pub use model::{Playlist, VFS_PLAYLIST, is_system_name};
pub use registry::PlaylistRegistry;
