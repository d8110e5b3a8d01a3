//! Virtual paths rooted at the configured music directory.
//!
//! A [`VfsPath`] is what clients see (`/Artist/Album/01.flac`); its physical
//! counterpart is always the music root joined with that string. Both
//! constructors normalise `.` and `..` before anything is joined or compared,
//! so no virtual path can ever resolve outside the root.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use path_absolutize::Absolutize;

use crate::error::{Error, Result};

/// The physical directory that backs the virtual `/`.
#[derive(Debug, Clone)]
pub struct Root {
    dir: Arc<PathBuf>,
}

impl Root {
    /// Relative roots are resolved against the current directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().absolutize()?.into_owned();
        Ok(Self { dir: Arc::new(dir) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The virtual `/`.
    pub fn top(&self) -> VfsPath {
        self.from_virtual("/")
    }

    /// Build a path from a root-relative string. Never fails and never
    /// touches the filesystem; `..` segments cannot climb above `/`.
    pub fn from_virtual(&self, virt: &str) -> VfsPath {
        VfsPath {
            root: Arc::clone(&self.dir),
            virt: normalize_virtual(virt),
        }
    }

    /// Build a path from an absolute physical location.
    ///
    /// The input is normalised lexically first, so `root/../etc` is rejected
    /// even though it starts with the root as a string.
    pub fn from_physical(&self, physical: impl AsRef<Path>) -> Result<VfsPath> {
        let physical = physical.as_ref();
        let normalized = physical.absolutize()?;
        let rel = normalized
            .strip_prefix(self.dir.as_path())
            .map_err(|_| Error::OutsideRoot(physical.to_path_buf()))?;

        let segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(VfsPath {
            root: Arc::clone(&self.dir),
            virt: format!("/{}", segments.join("/")),
        })
    }
}

/// A root-relative path. Ordering and equality use the virtual string only.
#[derive(Clone)]
pub struct VfsPath {
    root: Arc<PathBuf>,
    virt: String,
}

impl VfsPath {
    /// Root-relative form, always starting with `/`.
    pub fn virtual_path(&self) -> &str {
        &self.virt
    }

    /// Physical location under the music root.
    pub fn physical(&self) -> PathBuf {
        let rel = self.virt.trim_start_matches('/');
        if rel.is_empty() {
            self.root.as_path().to_path_buf()
        } else {
            self.root.join(rel)
        }
    }

    /// Resolve `arg` against this path: absolute arguments restart at `/`.
    pub fn join(&self, arg: &str) -> VfsPath {
        let virt = if arg.starts_with('/') {
            normalize_virtual(arg)
        } else {
            normalize_virtual(&format!("{}/{}", self.virt, arg))
        };
        VfsPath {
            root: Arc::clone(&self.root),
            virt,
        }
    }

    /// Last segment, empty for `/`.
    pub fn name(&self) -> &str {
        self.virt.rsplit('/').next().unwrap_or_default()
    }

    pub fn is_top(&self) -> bool {
        self.virt == "/"
    }
}

fn normalize_virtual(virt: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in virt.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.virt)
    }
}

impl fmt::Debug for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VfsPath").field(&self.virt).finish()
    }
}

impl PartialEq for VfsPath {
    fn eq(&self, other: &Self) -> bool {
        self.virt == other.virt
    }
}

impl Eq for VfsPath {}

impl Hash for VfsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.virt.hash(state);
    }
}

impl PartialOrd for VfsPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VfsPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.virt.cmp(&other.virt)
    }
}
