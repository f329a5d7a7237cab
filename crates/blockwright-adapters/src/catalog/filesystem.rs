//! Directory-backed template catalog.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── hero-banner-1.liquid     ← one template per file
//! ├── hero-banner-1.png        ← optional preview (same stem)
//! ├── section-Product Grid.liquid
//! └── landing/
//!     └── faq.html             ← subdirectories are scanned too
//! ```
//!
//! Files are visited in sorted path order. The id comes from the file stem
//! (see [`TemplateId::from_file_stem`]); when two files clean to the same id
//! the later one gets `-2`, `-3`, ... appended.
//!
//! The directory is rescanned on every [`CatalogSource::load`] call. If it
//! cannot be read at all, the [`fallback`](super::fallback) catalog is
//! served instead and a warning is logged.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use blockwright_core::{
    application::{
        ApplicationError,
        ports::{CatalogSink, CatalogSource},
    },
    domain::{GeneratedArtifact, Template, TemplateId},
    error::BlockwrightResult,
};

use super::{fallback::fallback_catalog, template_from_source};

/// Template file extensions, without the dot.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["liquid", "html", "htm"];

/// Sibling image extensions checked for a preview, in order.
pub const PREVIEW_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Extension of files written back by [`CatalogSink::persist`].
const SINK_EXTENSION: &str = "liquid";

pub struct FilesystemCatalog {
    dir: PathBuf,
}

impl FilesystemCatalog {
    /// The directory does not need to exist yet; loading a missing directory
    /// serves the fallback catalog and persisting creates it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory, or `None` when it cannot be read.
    fn scan(&self) -> Option<Vec<Template>> {
        if let Err(e) = fs::read_dir(&self.dir) {
            warn!(
                dir = %self.dir.display(),
                error = %e,
                "catalog directory unreadable, serving fallback catalog"
            );
            return None;
        }

        let mut seen = BTreeSet::new();
        let mut templates = Vec::new();

        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable catalog entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !is_template_file(path) {
                continue;
            }

            match self.load_file(path, &mut seen) {
                Ok(template) => {
                    debug!(id = %template.id, schema_less = template.is_schema_less(), "loaded template");
                    templates.push(template);
                }
                Err(e) => {
                    // One bad file must not block the others.
                    warn!(path = %path.display(), error = %e, "skipping template file");
                }
            }
        }

        Some(templates)
    }

    fn load_file(&self, path: &Path, seen: &mut BTreeSet<TemplateId>) -> BlockwrightResult<Template> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| self.io_error(path, "file name is not valid UTF-8"))?;
        let base = TemplateId::from_file_stem(stem)
            .ok_or_else(|| self.io_error(path, "file name yields an empty identifier"))?;
        let source = fs::read_to_string(path).map_err(|e| self.io_error(path, e))?;

        let id = unique_id(base, seen);
        seen.insert(id.clone());

        Ok(template_from_source(id, &source, self.preview_for(path))?)
    }

    /// `<stem>.<image ext>` next to the template, relative to the catalog root.
    fn preview_for(&self, path: &Path) -> Option<String> {
        PREVIEW_EXTENSIONS
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
            .map(|found| {
                found
                    .strip_prefix(&self.dir)
                    .unwrap_or(&found)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
    }

    /// First free `<id>.liquid`, suffixing on collision.
    fn target_path(&self, id: &TemplateId) -> PathBuf {
        let path = |id: &TemplateId| self.dir.join(format!("{id}.{SINK_EXTENSION}"));
        let mut candidate = path(id);
        let mut n = 2;
        while candidate.exists() {
            candidate = path(&id.with_suffix(n));
            n += 1;
        }
        candidate
    }

    fn io_error(&self, path: &Path, reason: impl ToString) -> ApplicationError {
        ApplicationError::CatalogIo {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl CatalogSource for FilesystemCatalog {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn load(&self) -> BlockwrightResult<Vec<Template>> {
        let templates = self.scan().unwrap_or_else(fallback_catalog);
        debug!(count = templates.len(), "catalog loaded");
        Ok(templates)
    }
}

impl CatalogSink for FilesystemCatalog {
    #[instrument(skip(self, artifact, query), fields(id = %artifact.id))]
    fn persist(&self, artifact: &GeneratedArtifact, query: &str) -> BlockwrightResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| self.io_error(&self.dir, e))?;

        let path = self.target_path(&artifact.id);
        let content = format!("{}\n{}\n", provenance(query), artifact.body.trim_end());
        fs::write(&path, content).map_err(|e| self.io_error(&path, e))?;

        info!(path = %path.display(), "artifact written to catalog");
        Ok(())
    }
}

fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
}

fn unique_id(base: TemplateId, seen: &BTreeSet<TemplateId>) -> TemplateId {
    let mut candidate = base.clone();
    let mut n = 2;
    while seen.contains(&candidate) {
        candidate = base.with_suffix(n);
        n += 1;
    }
    candidate
}

/// Liquid comment recording when and why the file was written.
fn provenance(query: &str) -> String {
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ").replace("%}", "% }");
    format!(
        "{{% comment %}} Generated by blockwright at {} for: {query} {{% endcomment %}}",
        Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    )
}
