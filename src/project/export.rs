//! Writing the overview out of the process: JSON snapshot and print hand-off.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use super::model::ProjectConfig;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not hand {0} to the system viewer")]
    Open(PathBuf),
}

pub fn export_file_name(config: &ProjectConfig) -> String {
    let reference = config.project_ref.as_str();
    let base = if reference.is_empty() { "project" } else { reference };
    format!("{base}-overview.json")
}

/// Pretty printed with two-space indentation.
pub fn to_json(config: &ProjectConfig) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(config)?)
}

pub fn from_json(content: &str) -> Result<ProjectConfig, ExportError> {
    Ok(serde_json::from_str(content)?)
}

pub trait FileExporter {
    /// Stores `contents` under `name` and returns where it ended up.
    fn export(&self, name: &str, contents: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Writes into a directory, creating it on first use.
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileExporter for DirectoryExporter {
    fn export(&self, name: &str, contents: &[u8]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        // Keep a reference like "VE/2026" from escaping the output directory.
        let file_name = name.replace(['/', '\\'], "-");
        let path = self.dir.join(file_name);
        fs::write(&path, contents).map_err(io_err(&path))?;
        info!(path = %path.display(), bytes = contents.len(), "exported file");
        Ok(path)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io { path, source }
}

/// Saves the JSON snapshot of `config` and returns its path.
pub fn save_json(exporter: &dyn FileExporter, config: &ProjectConfig) -> Result<PathBuf, ExportError> {
    let json = to_json(config)?;
    exporter.export(&export_file_name(config), json.as_bytes())
}

/// The host side of printing: something that can show a document so the user
/// can print it.
pub trait PrintSink {
    fn print(&self, document: &Path) -> Result<(), ExportError>;
}

/// Opens documents with the platform viewer.
pub struct SystemViewer;

impl PrintSink for SystemViewer {
    fn print(&self, document: &Path) -> Result<(), ExportError> {
        #[cfg(target_os = "macos")]
        let spawned = Command::new("open").arg(document).spawn();
        #[cfg(target_os = "windows")]
        let spawned = Command::new("explorer").arg(document).spawn();
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let spawned = Command::new("xdg-open").arg(document).spawn();

        spawned.map(|_| ()).map_err(|_| ExportError::Open(document.to_path_buf()))
    }
}

/// Writes the rendered overview next to the JSON export and opens it for printing.
pub fn print_html(
    exporter: &dyn FileExporter,
    sink: &dyn PrintSink,
    config: &ProjectConfig,
    html: &str,
) -> Result<PathBuf, ExportError> {
    let json_name = export_file_name(config);
    let stem = json_name.strip_suffix(".json").unwrap_or(&json_name);
    let path = exporter.export(&format!("{stem}.html"), html.as_bytes())?;
    sink.print(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn file_name_from_reference() {
        let mut cfg = ProjectConfig::default();
        assert_eq!(export_file_name(&cfg), "project-overview.json");
        cfg.project_ref = "VE-2026-001".into();
        assert_eq!(export_file_name(&cfg), "VE-2026-001-overview.json");
        cfg.project_ref = " VE-1 ".into();
        assert_eq!(export_file_name(&cfg), " VE-1 -overview.json");
        cfg.project_ref = "   ".into();
        assert_eq!(export_file_name(&cfg), "   -overview.json");
    }

    #[test]
    fn json_is_pretty_and_reads_back() {
        let mut cfg = ProjectConfig::default();
        cfg.project_name = "Substation".into();
        let json = to_json(&cfg).unwrap();
        assert!(json.contains("\n  \"projectName\": \"Substation\""));
        assert_eq!(from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn directory_exporter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path().join("out"));
        let mut cfg = ProjectConfig::default();
        cfg.project_ref = "VE-7".into();

        let path = save_json(&exporter, &cfg).unwrap();
        assert_eq!(path, dir.path().join("out").join("VE-7-overview.json"));
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(from_json(&written).unwrap().project_ref, "VE-7");
    }

    #[test]
    fn separators_in_reference_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path());
        let path = exporter.export("VE/2026-overview.json", b"{}").unwrap();
        assert_eq!(path, dir.path().join("VE-2026-overview.json"));
    }

    struct Recorder(RefCell<Vec<PathBuf>>);

    impl PrintSink for Recorder {
        fn print(&self, document: &Path) -> Result<(), ExportError> {
            self.0.borrow_mut().push(document.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn print_writes_html_then_hands_it_over() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path());
        let sink = Recorder(RefCell::new(Vec::new()));
        let path = print_html(&exporter, &sink, &ProjectConfig::default(), "<html></html>").unwrap();
        assert_eq!(path.file_name().unwrap(), "project-overview.html");
        assert_eq!(sink.0.borrow().as_slice(), &[path]);
    }

    #[test]
    fn print_keeps_json_inside_reference() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path());
        let sink = Recorder(RefCell::new(Vec::new()));
        let mut cfg = ProjectConfig::default();
        cfg.project_ref = "a.json".into();
        let path = print_html(&exporter, &sink, &cfg, "<html></html>").unwrap();
        assert_eq!(path.file_name().unwrap(), "a.json-overview.html");
    }
}
