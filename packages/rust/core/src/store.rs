//! Output file store.
//!
//! The products directory is the only namespace workers share. Every write
//! goes to a uniquely named temp file in the target directory and is renamed
//! into place, so a crashed run never leaves a half-written document.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use catalogc_products::Slug;
use catalogc_shared::{CatalogError, ProductId, Result};

/// Size and checksum of a written whole-set artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Write `contents` to `path` via temp file + rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if path.file_name().is_none() {
        return Err(CatalogError::Render(format!("invalid output path {}", path.display())));
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    // Fixed-length temp name: the target name may already be near the limit.
    let temp = dir.join(format!(".{}.tmp", uuid::Uuid::now_v7()));

    std::fs::write(&temp, contents).map_err(|e| CatalogError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(CatalogError::io(path, e));
    }
    Ok(())
}

/// Write an artifact atomically and report its checksum.
pub fn write_artifact(path: &Path, contents: &str) -> Result<ArtifactMeta> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    write_atomic(path, contents)?;

    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(path = %path.display(), size = contents.len(), "wrote artifact");

    Ok(ArtifactMeta {
        path: path.to_path_buf(),
        size_bytes: contents.len(),
        sha256,
    })
}

/// Where a record's document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Under its canonical slug file name.
    Canonical(PathBuf),
    /// Under an older name for the same id (`{id}.html` or `{id}-*.html`).
    Stale(PathBuf),
}

impl Located {
    pub fn path(&self) -> &Path {
        match self {
            Self::Canonical(p) | Self::Stale(p) => p,
        }
    }
}

/// The products directory.
#[derive(Debug, Clone)]
pub struct ProductStore {
    dir: PathBuf,
}

impl ProductStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))
    }

    /// Canonical document path for a slug.
    pub fn path_for(&self, slug: &Slug) -> PathBuf {
        self.dir.join(slug.file_name())
    }

    /// File names of every `.html` document present. A missing directory
    /// is an empty store.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(CatalogError::io(&self.dir, e)),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::io(&self.dir, e))?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".html") && !name.starts_with('.') {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Find a record's document among `names` (as returned by [`list`]).
    ///
    /// Tries the canonical slug file, then `{id}.html`, then the first
    /// `{id}-*.html` in name order.
    ///
    /// [`list`]: ProductStore::list
    pub fn locate(&self, names: &BTreeSet<String>, id: ProductId, slug: &Slug) -> Option<Located> {
        let canonical = slug.file_name();
        if names.contains(&canonical) {
            return Some(Located::Canonical(self.dir.join(canonical)));
        }

        let bare = format!("{id}.html");
        if names.contains(&bare) {
            return Some(Located::Stale(self.dir.join(bare)));
        }

        let prefix = format!("{id}-");
        names
            .range(prefix.clone()..)
            .next()
            .filter(|name| name.starts_with(&prefix))
            .map(|name| Located::Stale(self.dir.join(name)))
    }

    pub fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))
    }

    pub fn write(&self, path: &Path, contents: &str) -> Result<()> {
        write_atomic(path, contents)
    }
}

/// Product id encoded at the start of a document file name.
pub fn document_id(file_name: &str) -> Option<ProductId> {
    let stem = file_name.strip_suffix(".html")?;
    let digits = stem.split('-').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use catalogc_products::resolve_parts;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("catalogc-store-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() {
        let tmp = temp_dir();
        let path = tmp.join("feed.xml");
        write_atomic(&path, "one").unwrap();
        write_atomic(&path, "two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        let leftovers: Vec<_> = std::fs::read_dir(&tmp)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn atomic_write_handles_names_near_the_length_limit() {
        let tmp = temp_dir();
        let slug = resolve_parts(123456, &"漢".repeat(120));
        let path = ProductStore::new(&tmp).path_for(&slug);
        write_atomic(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");

        let long = tmp.join(format!("{}.html", "a".repeat(245)));
        write_atomic(&long, "x").unwrap();
        assert!(long.exists());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn artifact_meta_has_checksum() {
        let tmp = temp_dir();
        let meta = write_artifact(&tmp.join("out").join("a.xml"), "abc").unwrap();
        assert_eq!(meta.size_bytes, 3);
        assert_eq!(
            meta.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn list_ignores_hidden_and_non_html() {
        let tmp = temp_dir();
        let store = ProductStore::new(&tmp);
        std::fs::write(tmp.join("1-a.html"), "").unwrap();
        std::fs::write(tmp.join(".1-a.html.x.tmp"), "").unwrap();
        std::fs::write(tmp.join("notes.txt"), "").unwrap();

        let names = store.list().unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["1-a.html"]);
        assert!(ProductStore::new(tmp.join("missing")).list().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn locate_falls_back_to_stale_names() {
        let store = ProductStore::new("products");
        let slug = resolve_parts(12, "ساعة جديدة");
        let names: BTreeSet<String> = ["12-ساعة-قديمة.html", "120-x.html", "13.html"]
            .into_iter()
            .map(String::from)
            .collect();

        match store.locate(&names, 12, &slug) {
            Some(Located::Stale(p)) => assert!(p.ends_with("12-ساعة-قديمة.html")),
            other => panic!("expected stale match, got {other:?}"),
        }
        assert_eq!(
            store.locate(&names, 13, &resolve_parts(13, "x")),
            Some(Located::Stale(PathBuf::from("products/13.html")))
        );
        assert_eq!(store.locate(&names, 14, &resolve_parts(14, "x")), None);

        let mut names = names;
        names.insert(slug.file_name());
        assert!(matches!(
            store.locate(&names, 12, &slug),
            Some(Located::Canonical(_))
        ));
    }

    #[test]
    fn document_ids_are_parsed_from_names() {
        assert_eq!(document_id("7-جهاز.html"), Some(7));
        assert_eq!(document_id("7.html"), Some(7));
        assert_eq!(document_id("index.html"), None);
        assert_eq!(document_id("7-a.txt"), None);
    }
}
