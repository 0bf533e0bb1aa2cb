//! Conversion job configuration.
//!
//! # Responsibility
//! - Decode the JSON job document read from a file or stdin.
//! - Resolve the `from` selector into the list of input files.
//!
//! # Invariants
//! - Glob patterns match file names only; the directory part of a selector
//!   is taken literally.

use glob::Pattern;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Document format on either side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Canonical document; written as a `.xmind` archive.
    #[default]
    #[serde(alias = "xmind")]
    Canonical,
    /// Flat records, one array per sheet, named by a facet map.
    Custom,
}

impl DocType {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Canonical => "xmind",
            Self::Custom => "records.json",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertConfig {
    /// `file:<path>`, `dir:<dir>/<glob>` or `recursive:<dir>/<glob>`.
    pub from: String,
    #[serde(default)]
    pub from_type: DocType,
    #[serde(default)]
    pub from_custom: HashMap<String, String>,
    /// Output directory; empty writes next to each input.
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub to_type: DocType,
    #[serde(default)]
    pub to_custom: HashMap<String, String>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    /// `from` has no recognized `kind:` prefix.
    IllegalSource(String),
    Pattern(glob::PatternError),
    /// An entry matched by the pattern could not be read.
    Walk(glob::GlobError),
    Io(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config: {err}"),
            Self::IllegalSource(from) => write!(
                f,
                "from `{from}` is illegal; expected file:<path>, dir:<glob> or recursive:<glob>"
            ),
            Self::Pattern(err) => write!(f, "invalid file pattern: {err}"),
            Self::Walk(err) => write!(f, "cannot list input files: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::IllegalSource(_) => None,
            Self::Pattern(err) => Some(err),
            Self::Walk(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<glob::PatternError> for ConfigError {
    fn from(value: glob::PatternError) -> Self {
        Self::Pattern(value)
    }
}

impl From<glob::GlobError> for ConfigError {
    fn from(value: glob::GlobError) -> Self {
        Self::Walk(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl ConvertConfig {
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn source(&self) -> Result<Source, ConfigError> {
        Source::parse(&self.from)
    }
}

/// Parsed `from` selector.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    /// Files directly inside `dir` whose name matches `pattern`.
    Dir { dir: PathBuf, pattern: Pattern },
    /// Files anywhere below `dir` whose name matches `pattern`.
    Recursive { dir: PathBuf, pattern: Pattern },
}

impl Source {
    pub fn parse(from: &str) -> Result<Self, ConfigError> {
        let Some((kind, input)) = from.split_once(':') else {
            return Err(ConfigError::IllegalSource(from.to_string()));
        };
        match kind {
            "file" => Ok(Self::File(PathBuf::from(input))),
            "dir" | "recursive" => {
                let path = Path::new(input);
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or_else(|| ConfigError::IllegalSource(from.to_string()))?;
                let pattern = Pattern::new(name)?;
                if kind == "dir" {
                    Ok(Self::Dir { dir, pattern })
                } else {
                    Ok(Self::Recursive { dir, pattern })
                }
            }
            _ => Err(ConfigError::IllegalSource(from.to_string())),
        }
    }

    /// Root that output paths are made relative to; `None` keeps outputs flat.
    pub fn base(&self) -> Option<&Path> {
        match self {
            Self::Recursive { dir, .. } => Some(dir),
            Self::File(_) | Self::Dir { .. } => None,
        }
    }

    /// Full glob expression for directory sources, `None` for a single file.
    ///
    /// The directory part is escaped so only the name pattern is interpreted.
    pub fn glob_expression(&self) -> Result<Option<String>, ConfigError> {
        let (dir, pattern, nested) = match self {
            Self::File(_) => return Ok(None),
            Self::Dir { dir, pattern } => (dir, pattern, false),
            Self::Recursive { dir, pattern } => (dir, pattern, true),
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| ConfigError::IllegalSource(dir.display().to_string()))?;
        let dir = Pattern::escape(dir.trim_end_matches('/'));
        Ok(Some(if nested {
            format!("{dir}/**/{}", pattern.as_str())
        } else {
            format!("{dir}/{}", pattern.as_str())
        }))
    }

    /// Input files in path order.
    ///
    /// # Errors
    /// - `Io` when the source directory cannot be read.
    /// - `Walk` when an entry below it cannot be read.
    pub fn files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let dir = match self {
            Self::File(path) => return Ok(vec![path.clone()]),
            Self::Dir { dir, .. } | Self::Recursive { dir, .. } => dir,
        };
        std::fs::read_dir(dir)?;
        let Some(expression) = self.glob_expression()? else {
            return Ok(Vec::new());
        };

        let mut files = Vec::new();
        for entry in glob::glob(&expression)? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
