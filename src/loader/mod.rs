//! Reads the declared model from model files.
//!
//! A source is `json:<path>` or `toml:<path>`; without a prefix the format is
//! taken from the file extension. A path may be a single file, a directory
//! (searched recursively) or a glob pattern. Tables from all sources are
//! merged in source order.

use crate::model::{qualified_name, DatabaseSchema};
use crate::util::{Result, SchemaError};
use glob::glob;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFormat {
    Json,
    Toml,
}

impl ModelFormat {
    fn extension(self) -> &'static str {
        match self {
            ModelFormat::Json => "json",
            ModelFormat::Toml => "toml",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ModelFormat::Json),
            "toml" => Some(ModelFormat::Toml),
            _ => None,
        }
    }
}

pub fn load_model_sources(sources: &[String]) -> Result<DatabaseSchema> {
    if sources.is_empty() {
        return Err(SchemaError::ParseError(
            "No model sources provided".to_string(),
        ));
    }

    let mut schemas = Vec::new();
    for source in sources {
        schemas.push(load_single_source(source)?);
    }

    merge_schemas(schemas)
}

fn load_single_source(source: &str) -> Result<DatabaseSchema> {
    let (format, path) = if let Some(path) = source.strip_prefix("json:") {
        (Some(ModelFormat::Json), path)
    } else if let Some(path) = source.strip_prefix("toml:") {
        (Some(ModelFormat::Toml), path)
    } else {
        (None, source)
    };

    let files = resolve_source(path, format)?;
    let mut schemas = Vec::new();
    for file in files {
        let format = match format.or_else(|| ModelFormat::from_path(&file)) {
            Some(format) => format,
            None => {
                return Err(SchemaError::ParseError(format!(
                    "Cannot tell the format of {}. \
                     Use 'json:' or 'toml:' as a source prefix.",
                    file.display()
                )))
            }
        };
        schemas.push(load_file(&file, format)?);
    }

    merge_schemas(schemas)
}

fn load_file(path: &Path, format: ModelFormat) -> Result<DatabaseSchema> {
    debug!(path = %path.display(), "loading model file");
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::ParseError(format!("Failed to read {}: {e}", path.display()))
    })?;

    match format {
        ModelFormat::Json => serde_json::from_str(&content).map_err(|e| {
            SchemaError::ParseError(format!("Invalid JSON model in {}: {e}", path.display()))
        }),
        ModelFormat::Toml => toml::from_str(&content).map_err(|e| {
            SchemaError::ParseError(format!("Invalid TOML model in {}: {e}", path.display()))
        }),
    }
}

/// Resolves a path to model files: a file, every matching file under a
/// directory, or the files a glob pattern matches.
fn resolve_source(source: &str, format: Option<ModelFormat>) -> Result<Vec<PathBuf>> {
    let path = Path::new(source);

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let mut files = Vec::new();
        let formats = match format {
            Some(format) => vec![format],
            None => vec![ModelFormat::Json, ModelFormat::Toml],
        };
        for format in formats {
            let pattern = path.join(format!("**/*.{}", format.extension()));
            files.extend(resolve_glob(pattern.to_str().unwrap_or(source)).unwrap_or_default());
        }
        if files.is_empty() {
            return Err(SchemaError::ParseError(format!(
                "No model files found in directory: {source}"
            )));
        }
        files.sort();
        return Ok(files);
    }

    let files = resolve_glob(source)?;
    if files.is_empty() {
        return Err(SchemaError::ParseError(format!(
            "No model files found matching pattern: {source}"
        )));
    }
    Ok(files)
}

fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern)
        .map_err(|e| SchemaError::ParseError(format!("Invalid glob pattern: {e}")))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SchemaError::ParseError(format!("Glob error: {e}")))?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn merge_schemas(schemas: Vec<DatabaseSchema>) -> Result<DatabaseSchema> {
    let mut merged = DatabaseSchema::new();
    let mut seen: HashSet<(Option<String>, String)> = HashSet::new();

    for schema in schemas {
        for table in schema.tables {
            if !seen.insert((table.schema.clone(), table.name.clone())) {
                return Err(SchemaError::ParseError(format!(
                    "Duplicate table \"{}\" from multiple sources",
                    qualified_name(table.schema.as_deref(), &table.name)
                )));
            }
            merged.tables.push(table);
        }
    }

    Ok(merged)
}
