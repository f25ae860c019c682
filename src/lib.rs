//! Loader for the object and upgrade definitions of SAGE-engine games (Generals, Zero Hour).
//!
//! Objects are assembled from modules: bodies, AI, draw modules and so on, each declared with a
//! class and a unique tag.  Templates inherit modules from a default template or a parent, and
//! later files (map overrides in particular) can add, remove or replace them by tag.  `Universe`
//! is the entry point; it owns the module registry, the templates and the upgrades.
extern crate bit_vec;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate memmap;
extern crate nom;
extern crate serde;
extern crate toml;

#[cfg(test)]
extern crate pretty_assertions;
#[cfg(test)]
extern crate tempfile;

pub mod config;
pub mod errors;
pub mod input_buffer;
pub mod kindof;
pub mod module;
pub mod parse;
pub mod thing;
pub mod universe;
pub mod upgrade;
pub mod util;

pub use config::{LoadOptions, Manifest, ValidationLevel};
pub use errors::{Error, ErrorKind, Result};
pub use input_buffer::InputBuffer;
pub use parse::LoadType;
pub use thing::{Diagnostic, ThingFactory, ThingTemplate};
pub use universe::{LoadSummary, Universe};
pub use upgrade::{UpgradeCenter, UpgradeMask, UpgradeTemplate};
