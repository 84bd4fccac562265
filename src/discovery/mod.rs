// File discovery utilities - some helpers reserved for future use
#![allow(dead_code)]

use crate::config::Config;
use crate::parser::{ParseError, PythonParser};
use ignore::WalkBuilder;
use miette::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Type of source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Python,
    Xml,
    Manifest,
}

impl FileType {
    /// Determine file type from path
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        if file_name == "__manifest__.py" {
            return Some(FileType::Manifest);
        }
        match path.extension()?.to_str()? {
            "py" => Some(FileType::Python),
            "xml" => Some(FileType::Xml),
            _ => None,
        }
    }

    pub fn is_python(&self) -> bool {
        matches!(self, FileType::Python)
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, FileType::Xml)
    }
}

/// Represents a discovered source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file
    pub path: PathBuf,

    /// Type of source file
    pub file_type: FileType,
}

impl SourceFile {
    pub fn new(path: PathBuf, file_type: FileType) -> Self {
        Self { path, file_type }
    }

    /// Load and return owned contents
    pub fn read_contents(&self) -> std::result::Result<String, ParseError> {
        std::fs::read_to_string(&self.path).map_err(|source| ParseError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Finds analyzable files in an addons tree.
///
/// Directories carrying a `__manifest__.py` are treated as addon modules: their
/// Python files are discovered by following `from . import` chains from each
/// `__init__.py`, and their XML files come from the manifest's `data` list, so
/// only code the framework would actually load is analyzed. Trees without any
/// manifest fall back to a plain extension scan.
pub struct ModuleFinder<'a> {
    config: &'a Config,
}

impl<'a> ModuleFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all source files under the given root
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning for addon modules in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };

        let mut parser = PythonParser::new();
        let mut files = Vec::new();
        for target in &targets {
            let manifests = self.scan_for(target, FileType::Manifest);
            if manifests.is_empty() {
                trace!(
                    "No manifests under {}, falling back to extension scan",
                    target.display()
                );
                files.extend(self.scan_all(target));
                continue;
            }
            for manifest in manifests {
                if let Some(module_dir) = manifest.path.parent() {
                    self.collect_module(module_dir, &manifest, &mut parser, &mut files);
                }
            }
        }

        debug!("Found {} files", files.len());
        Ok(files)
    }

    /// Find only Python model files
    pub fn find_python_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let files = self.find_files(root)?;
        Ok(files.into_iter().filter(|f| f.file_type.is_python()).collect())
    }

    /// Find only XML data files
    pub fn find_xml_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let files = self.find_files(root)?;
        Ok(files.into_iter().filter(|f| f.file_type.is_xml()).collect())
    }

    /// Collect one addon module's files from its manifest and init chain
    fn collect_module(
        &self,
        module_dir: &Path,
        manifest: &SourceFile,
        parser: &mut PythonParser,
        files: &mut Vec<SourceFile>,
    ) {
        debug!("Collecting addon module: {}", module_dir.display());
        files.push(manifest.clone());

        let mut visited = BTreeSet::new();
        self.follow_imports(module_dir, parser, files, &mut visited);

        match manifest.read_contents() {
            Ok(contents) => {
                for entry in parser.manifest_data(&contents) {
                    let path = module_dir.join(&entry);
                    if self.config.should_exclude(&path) {
                        continue;
                    }
                    if path.extension().and_then(|e| e.to_str()) != Some("xml") {
                        continue;
                    }
                    if path.is_file() {
                        files.push(SourceFile::new(path, FileType::Xml));
                    } else {
                        warn!("Manifest references missing data file: {}", path.display());
                    }
                }
            }
            Err(e) => warn!("Skipping manifest: {e}"),
        }
    }

    /// Follow `from . import x` chains starting at a package's `__init__.py`
    fn follow_imports(
        &self,
        package_dir: &Path,
        parser: &mut PythonParser,
        files: &mut Vec<SourceFile>,
        visited: &mut BTreeSet<PathBuf>,
    ) {
        if !visited.insert(package_dir.to_path_buf()) {
            return;
        }

        let init = package_dir.join("__init__.py");
        let contents = match std::fs::read_to_string(&init) {
            Ok(contents) => contents,
            Err(_) => {
                trace!("No __init__.py in {}", package_dir.display());
                return;
            }
        };

        for name in parser.init_imports(&contents) {
            let subpackage = package_dir.join(&name);
            if subpackage.join("__init__.py").is_file() {
                self.follow_imports(&subpackage, parser, files, visited);
                continue;
            }
            let module = package_dir.join(format!("{name}.py"));
            if self.config.should_exclude(&module) {
                continue;
            }
            if module.is_file() {
                files.push(SourceFile::new(module, FileType::Python));
            } else {
                warn!("Import target not found: {}", module.display());
            }
        }
    }

    /// Walk a directory for files of one type
    fn scan_for(&self, dir: &Path, wanted: FileType) -> Vec<SourceFile> {
        self.scan_all(dir)
            .into_iter()
            .filter(|f| f.file_type == wanted)
            .collect()
    }

    /// Walk a directory for all analyzable files
    fn scan_all(&self, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }
                let file_type = FileType::from_path(path)?;
                trace!("Found {:?}: {}", file_type, path.display());
                Some(SourceFile::new(path.to_path_buf(), file_type))
            })
            .collect()
    }
}

/// Statistics about discovered files
#[derive(Debug, Default)]
pub struct FileStats {
    pub python_files: usize,
    pub xml_files: usize,
    pub manifest_files: usize,
}

impl FileStats {
    pub fn from_files(files: &[SourceFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match file.file_type {
                FileType::Python => stats.python_files += 1,
                FileType::Xml => stats.xml_files += 1,
                FileType::Manifest => stats.manifest_files += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.python_files + self.xml_files + self.manifest_files
    }
}
