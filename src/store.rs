//! Item storage: document identifiers and the store abstraction.
//!
//! Every document (content, template, or output) is addressed by an
//! [`ItemId`]: a `/`-rooted, forward-slash, normalized path string. Stores
//! are deliberately dumb key/value surfaces over those identifiers; all
//! classification and naming-convention logic lives in the pipeline, so a
//! store never needs to know what a markdown file is.
//!
//! Two implementations:
//!
//! - [`DirStore`]: a directory tree on disk. Dot-files and dot-directories
//!   are private to the store and never enumerated.
//! - [`MemStore`]: an ordered in-memory map. Backs the `check` command
//!   (validate without writing) and the test suite.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A normalized, `/`-rooted document identifier such as `/post/index.md`.
///
/// Identifiers are totally ordered by ordinal string comparison, which makes
/// them usable as map keys and gives every enumeration a stable document
/// order. Directory identifiers end in `/`; file identifiers never do.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    /// Build an identifier from any slash-separated path, normalizing
    /// `//`, `/./`, and `/../` away and forcing a leading `/`. A trailing
    /// `/` is preserved to mark a directory.
    pub fn new(path: &str) -> ItemId {
        let wants_dir = path.ends_with('/');
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        let mut normalized = String::from("/");
        normalized.push_str(&segments.join("/"));
        if wants_dir && normalized.len() > 1 {
            normalized.push('/');
        }
        ItemId(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without its leading `/`: how a document names itself
    /// in titles and listings.
    pub fn display_name(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Final path segment (file name, or last directory name).
    pub fn leaf(&self) -> &str {
        self.0.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    }

    /// The extension of the leaf segment including its dot (`.md`), or
    /// `None` when the leaf has none.
    pub fn extension(&self) -> Option<&str> {
        let leaf = self.leaf();
        match leaf.rfind('.') {
            Some(at) if at > 0 => Some(&leaf[at..]),
            _ => None,
        }
    }

    /// Replace (or add) the leaf extension. `ext` includes the dot.
    pub fn with_extension(&self, ext: &str) -> ItemId {
        let stem_end = match self.extension() {
            Some(current) => self.0.len() - current.len(),
            None => self.0.len(),
        };
        ItemId(format!("{}{}", &self.0[..stem_end], ext))
    }

    /// The directory identifier containing this item. The parent of the
    /// root directory is the root directory itself.
    pub fn parent(&self) -> ItemId {
        let trimmed = self.0.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(at) => ItemId(self.0[..=at].to_string()),
            None => ItemId("/".to_string()),
        }
    }

    /// Resolve a relative reference against this directory identifier.
    /// An absolute reference (leading `/`) ignores `self`.
    pub fn join(&self, reference: &str) -> ItemId {
        if reference.starts_with('/') {
            return ItemId::new(reference);
        }
        let dir = if self.is_dir() { self.as_str() } else { "/" };
        ItemId::new(&format!("{dir}{reference}"))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named collection of documents. See the module docs for the two
/// implementations.
pub trait Store {
    /// All file identifiers in the store, in identifier order.
    fn enumerate(&self) -> Vec<ItemId>;

    fn exists(&self, id: &ItemId) -> bool;

    fn read(&self, id: &ItemId) -> io::Result<Vec<u8>>;

    fn write(&mut self, id: &ItemId, bytes: &[u8]) -> io::Result<()>;

    fn delete(&mut self, id: &ItemId) -> io::Result<()>;

    /// All file identifiers under a directory prefix, in identifier order.
    fn enumerate_under(&self, dir: &ItemId) -> Vec<ItemId> {
        self.enumerate()
            .into_iter()
            .filter(|id| id.as_str().starts_with(dir.as_str()))
            .collect()
    }

    /// Read an item as text. Content documents are expected to be UTF-8;
    /// anything else is read lossily rather than failing the run.
    fn read_to_string(&self, id: &ItemId) -> io::Result<String> {
        let bytes = self.read(id)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// A store over a directory tree on disk.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> DirStore {
        DirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &ItemId) -> PathBuf {
        let mut path = self.root.clone();
        for segment in id.as_str().split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    fn hidden(relative: &Path) -> bool {
        relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    }
}

impl Store for DirStore {
    fn enumerate(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if Self::hidden(relative) {
                continue;
            }
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            ids.push(ItemId::new(&format!("/{joined}")));
        }
        ids.sort();
        ids
    }

    fn exists(&self, id: &ItemId) -> bool {
        self.path_of(id).is_file()
    }

    fn read(&self, id: &ItemId) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(id))
    }

    fn write(&mut self, id: &ItemId, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_of(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    fn delete(&mut self, id: &ItemId) -> io::Result<()> {
        fs::remove_file(self.path_of(id))
    }
}

/// An ordered in-memory store.
#[derive(Default)]
pub struct MemStore {
    items: BTreeMap<ItemId, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> MemStore {
        MemStore::default()
    }

    /// Builder-style text insertion, for fixtures.
    pub fn with_text(mut self, id: &str, text: &str) -> MemStore {
        self.insert_text(id, text);
        self
    }

    pub fn insert_text(&mut self, id: &str, text: &str) {
        self.items
            .insert(ItemId::new(id), text.as_bytes().to_vec());
    }

    /// Convenience for assertions: the item's text, if present.
    pub fn text(&self, id: &str) -> Option<String> {
        self.items
            .get(&ItemId::new(id))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Store for MemStore {
    fn enumerate(&self) -> Vec<ItemId> {
        self.items.keys().cloned().collect()
    }

    fn exists(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    fn read(&self, id: &ItemId) -> io::Result<Vec<u8>> {
        self.items
            .get(id)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such item: {id}")))
    }

    fn write(&mut self, id: &ItemId, bytes: &[u8]) -> io::Result<()> {
        self.items.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, id: &ItemId) -> io::Result<()> {
        match self.items.remove(id) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such item: {id}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_normalized() {
        assert_eq!(ItemId::new("post/index.md").as_str(), "/post/index.md");
        assert_eq!(ItemId::new("/a//b/./c.md").as_str(), "/a/b/c.md");
        assert_eq!(ItemId::new("/a/b/../c.md").as_str(), "/a/c.md");
        assert_eq!(ItemId::new("/../../x.md").as_str(), "/x.md");
        assert_eq!(ItemId::new("/post/").as_str(), "/post/");
        assert_eq!(ItemId::new("/").as_str(), "/");
    }

    #[test]
    fn id_orders_ordinally() {
        let mut ids = vec![
            ItemId::new("/post/b.md"),
            ItemId::new("/index.md"),
            ItemId::new("/post/a.md"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["/index.md", "/post/a.md", "/post/b.md"]);
    }

    #[test]
    fn id_extension_and_replacement() {
        let id = ItemId::new("/post/index.md");
        assert_eq!(id.extension(), Some(".md"));
        assert_eq!(id.with_extension(".html").as_str(), "/post/index.html");
        assert_eq!(ItemId::new("/README").extension(), None);
        assert_eq!(
            ItemId::new("/README").with_extension(".html").as_str(),
            "/README.html"
        );
        // A leading dot is a hidden-file marker, not an extension.
        assert_eq!(ItemId::new("/.config").extension(), None);
    }

    #[test]
    fn id_parent_leaf_display() {
        let id = ItemId::new("/post/index.md");
        assert_eq!(id.parent().as_str(), "/post/");
        assert!(id.parent().is_dir());
        assert_eq!(id.leaf(), "index.md");
        assert_eq!(id.display_name(), "post/index.md");
        assert_eq!(ItemId::new("/index.md").parent().as_str(), "/");
    }

    #[test]
    fn id_join_resolves_relative_references() {
        let dir = ItemId::new("/post/");
        assert_eq!(dir.join("other.md").as_str(), "/post/other.md");
        assert_eq!(dir.join("../top.md").as_str(), "/top.md");
        assert_eq!(dir.join("./same.md").as_str(), "/post/same.md");
        assert_eq!(dir.join("/absolute.md").as_str(), "/absolute.md");
    }

    #[test]
    fn mem_store_round_trip() {
        let mut store = MemStore::new();
        store.write(&ItemId::new("/a.md"), b"hello").unwrap();
        assert!(store.exists(&ItemId::new("/a.md")));
        assert_eq!(store.read(&ItemId::new("/a.md")).unwrap(), b"hello");
        assert_eq!(
            store.read_to_string(&ItemId::new("/a.md")).unwrap(),
            "hello"
        );
        store.delete(&ItemId::new("/a.md")).unwrap();
        assert!(!store.exists(&ItemId::new("/a.md")));
        assert!(store.read(&ItemId::new("/a.md")).is_err());
    }

    #[test]
    fn mem_store_enumerates_under_prefix() {
        let store = MemStore::new()
            .with_text("/index.md", "x")
            .with_text("/post/a.md", "x")
            .with_text("/post/b.md", "x")
            .with_text("/post/deep/c.md", "x");
        let under: Vec<String> = store
            .enumerate_under(&ItemId::new("/post/"))
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(under, vec!["/post/a.md", "/post/b.md", "/post/deep/c.md"]);
    }

    #[test]
    fn dir_store_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut store = DirStore::new(tmp.path());
        store
            .write(&ItemId::new("/post/index.md"), b"content")
            .unwrap();
        assert!(store.exists(&ItemId::new("/post/index.md")));
        assert_eq!(
            store.read_to_string(&ItemId::new("/post/index.md")).unwrap(),
            "content"
        );
        assert_eq!(store.enumerate(), vec![ItemId::new("/post/index.md")]);
        store.delete(&ItemId::new("/post/index.md")).unwrap();
        assert!(!store.exists(&ItemId::new("/post/index.md")));
    }

    #[test]
    fn dir_store_skips_hidden_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut store = DirStore::new(tmp.path());
        store.write(&ItemId::new("/kept.md"), b"x").unwrap();
        store.write(&ItemId::new("/.hidden"), b"x").unwrap();
        store.write(&ItemId::new("/.git/config"), b"x").unwrap();
        assert_eq!(store.enumerate(), vec![ItemId::new("/kept.md")]);
    }
}
