//! Data & code availability section generator.
//!
//! Scans a directory tree for processed data tables (`*.tsv`) and figure PDFs
//! (`Fig*.pdf`), renders each group as a markdown bullet list and, when the
//! target document carries both placeholder markers, splices the lists in.
//!
//! A document missing either marker is never rewritten.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const TABLES_MARKER: &str = "<!-- TABLES_AUTO -->";
pub const FIGS_MARKER: &str = "<!-- FIGS_AUTO -->";

pub const NO_TABLES_PLACEHOLDER: &str =
    "*No processed data files found. Tables will be added as analysis progresses.*";
/// Used when tables exist but every one of them sits in an excluded directory.
pub const NO_LISTED_TABLES_PLACEHOLDER: &str = "*No processed data files found.*";
pub const NO_FIGURES_PLACEHOLDER: &str = "*Figure PDFs will be added upon completion of analysis.*";

pub const FALLBACK_TABLE_DESCRIPTION: &str = "Processed analysis table.";

/// Tables inside a directory with this name are not listed.
pub const EXCLUDED_TABLE_DIR: &str = "metadata";

/// Ordered: the first key contained in the file name wins.
const TABLE_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "Fig1_InfoArchitecture",
        "Reduced informational coordinates and cluster assignments (Fig. 1).",
    ),
    (
        "Fig2_Separation",
        "State separation metrics and pairwise distances (Fig. 2).",
    ),
    (
        "Fig3_VulnerabilityCurves",
        "Vulnerability curves across perturbation fractions (Fig. 3).",
    ),
    (
        "Fig4_VulnerabilitySummary",
        "Summary vulnerability metrics by state and donor (Fig. 4).",
    ),
    (
        "ED2_TDA",
        "Topological Data Analysis persistence summaries (Extended Data 2).",
    ),
    ("ED_Supplementary", "Additional supplementary data tables."),
];

#[derive(Debug, thiserror::Error)]
pub enum DocgenError {
    #[error("failed to scan {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The two rendered markdown fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSections {
    pub tables: String,
    pub figures: String,
}

/// What happened to the target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentUpdate {
    /// Both markers were found and replaced.
    Updated,
    /// At least one marker is absent; the document was left as is.
    MarkersMissing { tables: bool, figures: bool },
    /// The document does not exist.
    NotFound,
}

/// Description for a table, by first matching key in its file name.
pub fn describe_table(file_name: &str) -> &'static str {
    TABLE_DESCRIPTIONS
        .iter()
        .find(|(key, _)| file_name.contains(key))
        .map(|(_, desc)| *desc)
        .unwrap_or(FALLBACK_TABLE_DESCRIPTION)
}

/// All `*.tsv` files under `root`, sorted.
pub fn find_tables(root: &Path) -> Result<Vec<PathBuf>, DocgenError> {
    find_files(root, |name| name.ends_with(".tsv"))
}

/// All `Fig*.pdf` files under `root`, sorted.
pub fn find_figures(root: &Path) -> Result<Vec<PathBuf>, DocgenError> {
    find_files(root, |name| name.starts_with("Fig") && name.ends_with(".pdf"))
}

fn find_files<F>(root: &Path, matches: F) -> Result<Vec<PathBuf>, DocgenError>
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            // Unreadable entries below the root are skipped, the root itself is not.
            Err(e) if e.depth() > 0 => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
            Err(e) => {
                return Err(DocgenError::Walk {
                    root: root.to_path_buf(),
                    source: e,
                })
            }
        };
        // Symlinked files count; symlinked directories are not descended into.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        if entry.file_name().to_str().is_some_and(&matches) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    debug!(root = %root.display(), count = found.len(), "Scanned for files");
    Ok(found)
}

/// `path` relative to `root`, always with `/` separators.
fn display_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn in_excluded_dir(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .is_some_and(|name| name == EXCLUDED_TABLE_DIR)
}

pub fn tables_section(root: &Path) -> Result<String, DocgenError> {
    let tables = find_tables(root)?;
    if tables.is_empty() {
        return Ok(NO_TABLES_PLACEHOLDER.to_string());
    }

    let lines: Vec<String> = tables
        .iter()
        .filter(|path| !in_excluded_dir(path))
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!(
                "- `{}` – {}",
                display_relative(root, path),
                describe_table(&name)
            )
        })
        .collect();

    if lines.is_empty() {
        Ok(NO_LISTED_TABLES_PLACEHOLDER.to_string())
    } else {
        Ok(lines.join("\n"))
    }
}

pub fn figures_section(root: &Path) -> Result<String, DocgenError> {
    let figures = find_figures(root)?;
    if figures.is_empty() {
        return Ok(NO_FIGURES_PLACEHOLDER.to_string());
    }
    Ok(figures
        .iter()
        .map(|path| format!("- `{}`", display_relative(root, path)))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn generate_sections(root: &Path) -> Result<GeneratedSections, DocgenError> {
    info!(root = %root.display(), "Scanning for data files and figures");
    Ok(GeneratedSections {
        tables: tables_section(root)?,
        figures: figures_section(root)?,
    })
}

/// Splices both blocks into `text` at the first occurrence of each marker.
/// Returns `None` unless both markers are present.
pub fn fill_markers(text: &str, tables_block: &str, figs_block: &str) -> Option<String> {
    let tables_at = text.find(TABLES_MARKER)?;
    let figs_at = text.find(FIGS_MARKER)?;

    let mut slots = [
        (tables_at, TABLES_MARKER.len(), tables_block),
        (figs_at, FIGS_MARKER.len(), figs_block),
    ];
    slots.sort_by_key(|(at, _, _)| *at);

    let mut out = String::with_capacity(text.len() + tables_block.len() + figs_block.len());
    let mut cursor = 0;
    for (at, len, block) in slots {
        out.push_str(&text[cursor..at]);
        out.push_str(block);
        cursor = at + len;
    }
    out.push_str(&text[cursor..]);
    Some(out)
}

/// Rewrites `document` in place when it holds both markers.
pub fn update_document(
    document: &Path,
    tables_block: &str,
    figs_block: &str,
) -> Result<DocumentUpdate, DocgenError> {
    let text = match std::fs::read_to_string(document) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %document.display(), "Document not found, nothing to update");
            return Ok(DocumentUpdate::NotFound);
        }
        Err(e) => {
            return Err(DocgenError::Io {
                path: document.to_path_buf(),
                source: e,
            })
        }
    };

    let Some(updated) = fill_markers(&text, tables_block, figs_block) else {
        let status = DocumentUpdate::MarkersMissing {
            tables: text.contains(TABLES_MARKER),
            figures: text.contains(FIGS_MARKER),
        };
        warn!(path = %document.display(), ?status, "Placeholder markers missing, document left unchanged");
        return Ok(status);
    };

    std::fs::write(document, updated).map_err(|e| DocgenError::Io {
        path: document.to_path_buf(),
        source: e,
    })?;
    info!(path = %document.display(), "Document updated");
    Ok(DocumentUpdate::Updated)
}

/// Scans `root` and updates `document`.
pub fn generate(
    root: &Path,
    document: &Path,
) -> Result<(GeneratedSections, DocumentUpdate), DocgenError> {
    let sections = generate_sections(root)?;
    let update = update_document(document, &sections.tables, &sections.figures)?;
    Ok((sections, update))
}
