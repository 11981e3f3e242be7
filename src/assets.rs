//! Script and document sources
//!
//! Dataset scripts are looked up by an identifier such as `rent_a_house.sql`.
//! They may come from an asset directory on disk or from the copies bundled
//! into the binary.

use std::io;
use std::path::{Path, PathBuf};

/// Scripts compiled into the binary: (identifier, contents)
pub const BUNDLED_SCRIPTS: &[(&str, &str)] = &[(
    "rent_a_house.sql",
    include_str!("../assets/rent_a_house.sql"),
)];

/// Exercise document collection matching the bundled dataset
pub const BUNDLED_EXERCISES: &str = include_str!("../assets/exercises.json");

/// Anything that can hand out the text of a dataset script
pub trait ScriptSource {
    fn read_script(&self, id: &str) -> io::Result<String>;
}

/// Scripts stored as files under one directory
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ScriptSource for AssetDir {
    fn read_script(&self, id: &str) -> io::Result<String> {
        if !is_plain_file_name(id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid script name: {}", id),
            ));
        }
        std::fs::read_to_string(self.root.join(id))
    }
}

/// Scripts bundled with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledAssets;

impl ScriptSource for BundledAssets {
    fn read_script(&self, id: &str) -> io::Result<String> {
        BUNDLED_SCRIPTS
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, text)| text.to_string())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no bundled script named {}", id))
            })
    }
}

/// Asset directory first, bundled copies as fallback
#[derive(Debug, Clone, Default)]
pub struct LayeredAssets {
    dir: Option<AssetDir>,
}

impl LayeredAssets {
    pub fn new(dir: Option<AssetDir>) -> Self {
        Self { dir }
    }
}

impl ScriptSource for LayeredAssets {
    fn read_script(&self, id: &str) -> io::Result<String> {
        if let Some(dir) = &self.dir {
            match dir.read_script(id) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("{} not in {:?}, using bundled copy", id, dir.root());
                }
                other => return other,
            }
        }
        BundledAssets.read_script(id)
    }
}

/// In-memory scripts, mostly for tests and embedding
impl ScriptSource for std::collections::HashMap<String, String> {
    fn read_script(&self, id: &str) -> io::Result<String> {
        self.get(id).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no script named {}", id))
        })
    }
}

fn is_plain_file_name(id: &str) -> bool {
    let path = Path::new(id);
    !id.is_empty()
        && path.components().count() == 1
        && matches!(path.components().next(), Some(std::path::Component::Normal(_)))
}
