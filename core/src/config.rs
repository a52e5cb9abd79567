//! Configuration file loading.
//!
//! # Format
//!
//! ```toml
//! [[shader]]
//! name = "lightmapped_ps30"
//! file = "lightmapped_ps2x.fxc"
//! version = "ps_3_0"
//! skip = ["$BUMPMAP && $DETAIL == 2"]
//!
//! [[shader.static]]
//! name = "BUMPMAP"
//! min = 0
//! max = 1
//!
//! [[shader.static]]
//! name = "DETAIL"
//! min = 0
//! max = 2
//!
//! [[shader.dynamic]]
//! name = "FOG"
//! min = 0
//! max = 1
//! centroid = true
//! ```
//!
//! Entries are laid out in the order they appear in the file.

use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use serde::Deserialize;
use toml::Spanned;

use crate::error::ConfigError;
use crate::model::{ComboParam, combo_count};
use crate::skip::SkipRules;
use crate::table::{Configuration, EntryDef, check_params};
use crate::validity::{AllValid, ComboValidity};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, rename = "shader")]
    shaders: Vec<ShaderSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShaderSection {
    name: Spanned<String>,
    file: String,
    version: String,
    #[serde(default)]
    skip: Vec<Spanned<String>>,
    #[serde(default, rename = "static")]
    statics: Vec<ComboParam>,
    #[serde(default, rename = "dynamic")]
    dynamics: Vec<ComboParam>,
}

/// 1-based line and column of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, column)
}

impl Configuration {
    /// Read and parse a configuration file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Reading shader configuration");
        Self::parse(&source, path)
    }

    /// Parse configuration text. `origin` is only used in error messages.
    pub fn parse(source: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let origin = origin.as_ref();
        let file: ConfigFile = toml::from_str(source).map_err(|err| {
            let (line, column) = err
                .span()
                .map_or((1, 1), |span| line_col(source, span.start));
            ConfigError::Syntax {
                path: origin.to_path_buf(),
                line,
                column,
                message: err.message().trim().to_string(),
            }
        })?;

        let invalid = |offset: usize, message: String| ConfigError::Invalid {
            path: PathBuf::from(origin),
            line: line_col(source, offset).0,
            message,
        };

        let mut names = HashSet::new();
        let mut defs = Vec::with_capacity(file.shaders.len());
        let mut total = 0u64;

        for shader in file.shaders {
            let name_offset = shader.name.span().start;
            let name = shader.name.into_inner();

            if name.is_empty() {
                return Err(invalid(name_offset, "shader name must not be empty".to_string()));
            }
            if !names.insert(name.clone()) {
                return Err(invalid(name_offset, format!("shader '{name}' is declared twice")));
            }
            check_params(&shader.statics, &shader.dynamics)
                .map_err(|message| invalid(name_offset, format!("shader '{name}': {message}")))?;

            let num_combos = combo_count(&shader.statics)
                .zip(combo_count(&shader.dynamics))
                .and_then(|(statics, dynamics)| statics.checked_mul(dynamics))
                .ok_or_else(|| {
                    invalid(name_offset, format!("shader '{name}': combo count overflows 64 bits"))
                })?;
            total = total.checked_add(num_combos).ok_or_else(|| {
                invalid(
                    name_offset,
                    format!("shader '{name}': total command count overflows 64 bits"),
                )
            })?;

            let rules = SkipRules::compile(
                &shader
                    .skip
                    .iter()
                    .map(|expr| expr.get_ref().as_str())
                    .collect::<Vec<_>>(),
                &shader.statics,
                &shader.dynamics,
            )
            .map_err(|(index, err)| {
                let expr = &shader.skip[index];
                invalid(
                    expr.span().start,
                    format!(
                        "shader '{name}': skip expression \"{}\": {err}",
                        expr.get_ref()
                    ),
                )
            })?;

            let validity: Box<dyn ComboValidity> = if rules.is_empty() {
                Box::new(AllValid)
            } else {
                Box::new(rules)
            };

            defs.push(EntryDef {
                name,
                shader_file_name: shader.file,
                shader_version: shader.version,
                static_params: shader.statics,
                dynamic_params: shader.dynamics,
                validity,
            });
        }

        Self::from_entries(defs)
    }
}
