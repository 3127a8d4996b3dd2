use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Document;
use tracing::debug;

use crate::AppPaths;

use super::database::{MonsterAppearance, MonsterId, MonsterStats, NpcSpawnDef, StatsCatalog};
use super::defs::{parse_defs_document, ParsedDef};
use super::discovery::discover_mod_sources;
use super::types::{ContentPlanError, ContentRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInMod,
    UnresolvedReference,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
struct Origin {
    mod_id: String,
    file_path: PathBuf,
}

#[derive(Default)]
struct MergedDefs {
    monsters: BTreeMap<String, MonsterStats>,
    appearances: BTreeMap<String, MonsterAppearance>,
    strings: BTreeMap<String, String>,
    spawns: BTreeMap<String, (NpcSpawnDef, Origin)>,
}

impl MergedDefs {
    // Cross-mod duplicates are intentional override points (last mod wins).
    fn insert(&mut self, def: ParsedDef, origin: &Origin) {
        match def {
            ParsedDef::Monster(monster) => {
                self.monsters.insert(monster.def_name.clone(), monster);
            }
            ParsedDef::Appearance(appearance) => {
                self.appearances
                    .insert(appearance.def_name.clone(), appearance);
            }
            ParsedDef::String { key, text } => {
                self.strings.insert(key, text);
            }
            ParsedDef::Spawn(spawn) => {
                self.spawns
                    .insert(spawn.def_name.clone(), (spawn, origin.clone()));
            }
        }
    }

    fn into_catalog(self) -> Result<StatsCatalog, ContentCompileError> {
        let mut spawns = Vec::with_capacity(self.spawns.len());
        for (spawn, origin) in self.spawns.into_values() {
            if !self.monsters.contains_key(&spawn.monster) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::UnresolvedReference,
                    message: format!(
                        "NpcSpawnDef '{}' references unknown MonsterDef '{}'",
                        spawn.def_name, spawn.monster
                    ),
                    mod_id: origin.mod_id,
                    file_path: origin.file_path,
                    location: None,
                });
            }
            spawns.push(spawn);
        }

        Ok(StatsCatalog::from_parts(
            self.monsters.into_values().collect(),
            self.appearances.into_values().collect(),
            self.strings.into_iter().collect(),
            spawns,
        ))
    }
}

pub fn compile_stats_catalog(
    app_paths: &AppPaths,
    request: &ContentRequest,
) -> Result<StatsCatalog, ContentCompileError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;

    let mut merged = MergedDefs::default();

    for source in sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            let defs = parse_xml(&source.mod_id, &xml_file, &raw)?;
            debug!(
                mod_id = %source.mod_id,
                mod_load_index = source.mod_load_index,
                file = %xml_file.display(),
                def_count = defs.len(),
                "content_file_parsed"
            );
            let origin = Origin {
                mod_id: source.mod_id.clone(),
                file_path: xml_file.clone(),
            };
            for def in defs {
                let identity = def.identity();
                if !seen_in_mod.insert(identity.clone()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate {} in mod '{}'; each mod may define a name only once",
                            identity, source.mod_id
                        ),
                        mod_id: source.mod_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                merged.insert(def, &origin);
            }
        }
    }

    merged.into_catalog()
}

fn parse_xml(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<ParsedDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    parse_defs_document(mod_id, file_path, &doc)
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<(String, PathBuf)>::new();
    collect_recursive(root, root, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn collect_recursive(
    root: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(root, &path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            files.push((normalize_rel_path(rel), path.clone()));
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: ContentPlanError, root: &Path) -> ContentCompileError {
    match error {
        ContentPlanError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}
