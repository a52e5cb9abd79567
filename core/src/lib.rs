//! Command-number index over shader combos.
//!
//! Every compiled variant ("combo") of every shader entry gets a position in
//! one contiguous command-number space, so compile work can be split between
//! workers by integer range alone:
//!
//! ```text
//! |-------- shader1 ----------||--- shader2 ---||-------- shader3 --------|
//! | 0 s s 3 s s s s 8 s 10 s s s| s s 2 3 4 s s s s| 0 s s s 4 s s s 8 9 s s s |
//!   0                        13   14          22   23                      35
//! ```
//!
//! Skipped combos (`s`) keep their command numbers; [`Configuration::next_combo`]
//! steps over them and across entry boundaries.
//!
//! # Example
//!
//! ```no_run
//! use shadercompile_core::{ComboHandle, Configuration};
//!
//! let config = Configuration::read("shaders.toml")?;
//! let mut command = 0;
//! let mut combo = ComboHandle::unbound();
//! while config.next_combo(&mut command, &mut combo, 1000)? {
//!     println!("{}", combo.command_line()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod combo;
mod config;
mod error;
mod format;
mod iter;
mod model;
mod section;
mod skip;
mod table;
mod validity;

pub use combo::ComboHandle;
pub use error::{ComboError, ConfigError, FormatError};
pub use iter::Combos;
pub use model::{CfgEntryInfo, ComboParam};
pub use skip::{SkipError, SkipRules};
pub use table::{Configuration, EntryDef};
pub use validity::{AllValid, ComboValidity};
