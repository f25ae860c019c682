//! Load settings, and the manifest file that lists which data files make up a game.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml;

use errors::Result;
use input_buffer::InputBuffer;


/// How strictly to treat data that the engine itself would only complain about in debug builds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// A module tag used twice on one template is a fatal error
    Strict,
    /// ...or just a warning, and both modules are kept
    Lenient,
}

impl Default for ValidationLevel {
    fn default() -> Self {
        ValidationLevel::Strict
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub validation: ValidationLevel,
}

impl LoadOptions {
    pub fn lenient() -> Self {
        LoadOptions { validation: ValidationLevel::Lenient }
    }
}


/// ```toml
/// validation = "lenient"
/// base = ["Data/INI/Default/Object.ini", "Data/INI/Object/AmericaVehicle.ini"]
/// overrides = ["Maps/Tournament Desert/map.ini"]
/// ```
///
/// Base files are loaded in order as ordinary definitions, then override files are loaded in order
/// as overrides.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub validation: ValidationLevel,
    pub base: Vec<PathBuf>,
    pub overrides: Vec<PathBuf>,
}

impl Manifest {
    pub fn from_str(text: &str) -> Result<Manifest> {
        Ok(toml::from_str(text)?)
    }

    /// Read a manifest, resolving relative paths against the directory it lives in
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
        let path = path.as_ref();
        let buffer = InputBuffer::new_from_file(path)?;
        let mut manifest = Manifest::from_str(&buffer.text())?;
        if let Some(dir) = path.parent() {
            manifest.resolve_against(dir);
        }
        Ok(manifest)
    }

    pub fn resolve_against(&mut self, dir: &Path) {
        for path in self.base.iter_mut().chain(self.overrides.iter_mut()) {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions { validation: self.validation }
    }
}
