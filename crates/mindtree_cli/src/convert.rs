//! Batch conversion between the canonical document and flat records.

use crate::config::{ConfigError, ConvertConfig, DocType, Source};
use log::info;
use mindtree_core::{load_file, save_file, CodecError, MapperError, SchemaMapper, Workbook};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub enum ConvertError {
    Config(ConfigError),
    /// A `fromCustom` or `toCustom` facet map is invalid.
    Mapping(MapperError),
    Codec { path: PathBuf, source: CodecError },
    Mapper { path: PathBuf, source: MapperError },
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "{err}"),
            Self::Codec { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Mapper { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Mapping(err) => Some(err),
            Self::Codec { source, .. } => Some(source),
            Self::Mapper { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for ConvertError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Converts every input selected by `config`; returns the written paths.
///
/// Stops at the first failing file.
pub fn run(config: &ConvertConfig) -> Result<Vec<PathBuf>, ConvertError> {
    let source = config.source()?;
    let files = source.files()?;
    let reader = mapper_for(config.from_type, &config.from_custom)?;
    let writer = mapper_for(config.to_type, &config.to_custom)?;

    let mut written = Vec::with_capacity(files.len());
    for input in files {
        let workbook = load(&input, reader.as_ref())?;
        let output = output_path(config, &source, &input)?;
        save(&output, &workbook, writer.as_ref())?;
        info!(
            "event=file_converted module=cli status=ok input={} output={} sheets={}",
            input.display(),
            output.display(),
            workbook.len()
        );
        written.push(output);
    }
    Ok(written)
}

fn mapper_for(
    doc_type: DocType,
    custom: &HashMap<String, String>,
) -> Result<Option<SchemaMapper>, ConvertError> {
    match doc_type {
        DocType::Canonical => Ok(None),
        DocType::Custom => SchemaMapper::from_pairs(custom.iter())
            .map(Some)
            .map_err(ConvertError::Mapping),
    }
}

fn load(path: &Path, mapper: Option<&SchemaMapper>) -> Result<Workbook, ConvertError> {
    let Some(mapper) = mapper else {
        return load_file(path).map_err(|source| ConvertError::Codec {
            path: path.to_path_buf(),
            source,
        });
    };
    let file = File::open(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    mapper
        .load_workbook(BufReader::new(file))
        .map_err(|source| ConvertError::Mapper {
            path: path.to_path_buf(),
            source,
        })
}

fn save(
    path: &Path,
    workbook: &Workbook,
    mapper: Option<&SchemaMapper>,
) -> Result<(), ConvertError> {
    let Some(mapper) = mapper else {
        return save_file(path, workbook).map_err(|source| ConvertError::Codec {
            path: path.to_path_buf(),
            source,
        });
    };
    let file = File::create(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    mapper
        .save_workbook(BufWriter::new(file), workbook, None)
        .map_err(|source| ConvertError::Mapper {
            path: path.to_path_buf(),
            source,
        })
}

/// Output location for `input`.
///
/// Without a target directory the file lands next to its input with a
/// timestamp suffix. With one, recursive sources keep their relative layout.
fn output_path(
    config: &ConvertConfig,
    source: &Source,
    input: &Path,
) -> Result<PathBuf, ConvertError> {
    let extension = config.to_type.extension();
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if config.to.is_empty() {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        return Ok(PathBuf::from(format!(
            "{}-{stamp}.{extension}",
            input.display()
        )));
    }

    let target = Path::new(&config.to);
    let dir = match source.base().and_then(|base| input.strip_prefix(base).ok()) {
        Some(relative) => relative
            .parent()
            .map(|parent| target.join(parent))
            .unwrap_or_else(|| target.to_path_buf()),
        None => target.to_path_buf(),
    };
    std::fs::create_dir_all(&dir).map_err(|source| ConvertError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir.join(format!("{name}.{extension}")))
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::config::ConvertConfig;
    use mindtree_core::load_file;
    use serde_json::{json, Value};
    use std::fs;

    #[test]
    fn custom_records_convert_to_canonical_and_back() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in.json");
        fs::write(
            &input,
            json!([[
                {"key": "1", "name": "root"},
                {"key": "2", "name": "child", "up": "1"}
            ]])
            .to_string(),
        )
        .unwrap();
        let out = root.path().join("out");

        let config: ConvertConfig = serde_json::from_value(json!({
            "from": format!("file:{}", input.display()),
            "fromType": "custom",
            "fromCustom": {"Id": "key", "Title": "name", "ParentId": "up"},
            "to": out.display().to_string()
        }))
        .unwrap();
        let written = run(&config).unwrap();
        assert_eq!(written, vec![out.join("in.json.xmind")]);
        assert_eq!(&fs::read(&written[0]).unwrap()[..2], b"PK");

        let canonical = load_file(&written[0]).unwrap();
        let sheet = canonical.sheet(0).unwrap();
        let central = sheet.topic(sheet.central()).unwrap();
        assert_eq!(central.title(), "root");
        assert_eq!(
            sheet.topic(central.children()[0]).unwrap().title(),
            "child"
        );

        let back: ConvertConfig = serde_json::from_value(json!({
            "from": format!("file:{}", written[0].display()),
            "toType": "custom",
            "to": out.display().to_string()
        }))
        .unwrap();
        let written = run(&back).unwrap();
        let records: Value = serde_json::from_slice(&fs::read(&written[0]).unwrap()).unwrap();
        assert_eq!(records[0][0]["title"], "root");
        assert_eq!(records[0][1]["parentid"], records[0][0]["id"]);
    }

    #[test]
    fn missing_input_reports_path() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("absent.json");
        let config: ConvertConfig = serde_json::from_value(json!({
            "from": format!("file:{}", input.display()),
            "to": root.path().display().to_string()
        }))
        .unwrap();
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
