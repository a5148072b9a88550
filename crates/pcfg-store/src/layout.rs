//! On-disk layouts
//!
//! Both generations load into, and persist from, the same [`Document`]
//! shape. [`Layout::Legacy`] spreads it over two files; [`Layout::NextGen`]
//! keeps everything in one.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pcfg_tree::{Document, Mapping, Node, NodeValue};
use tempfile::NamedTempFile;

use crate::config::{CONFIG_FILE, NEXT_GEN_FILE};
use crate::error::{StoreError, StoreResult};

/// Top-level sections the legacy layout keeps in the next-gen file
pub const NEXT_GEN_SECTIONS: [&str; 2] = ["contexts", "currentContext"];

/// On-disk schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// `config.yaml` plus `config-ng.yaml` for the context sections
    #[default]
    Legacy,
    /// Everything in `config-ng.yaml`
    NextGen,
}

impl Layout {
    /// Layout selected by a "use next-gen" flag
    #[inline]
    #[must_use]
    pub fn from_next_gen_flag(next_gen: bool) -> Self {
        if next_gen {
            Self::NextGen
        } else {
            Self::Legacy
        }
    }

    /// Files that make up a document under this layout
    #[must_use]
    pub fn files(&self) -> &'static [&'static str] {
        match self {
            Self::Legacy => &[CONFIG_FILE, NEXT_GEN_FILE],
            Self::NextGen => &[NEXT_GEN_FILE],
        }
    }

    /// Load the document stored in `dir`
    ///
    /// Missing files count as empty. A file that is not valid YAML, or whose
    /// root is not a mapping, is logged and treated as empty.
    ///
    /// # Errors
    /// - [`StoreError::Io`] if a file exists but cannot be read
    /// - [`StoreError::Tree`] if a file is valid YAML that cannot be
    ///   rewritten without loss (anchors, tags, multi-line flow); the file
    ///   is left for the user to fix rather than overwritten
    pub fn load(self, dir: &Path) -> StoreResult<StoredDocument> {
        match self {
            Self::NextGen => {
                let (part, document) = read_part(&dir.join(NEXT_GEN_FILE))?;
                Ok(StoredDocument {
                    layout: self,
                    document,
                    parts: vec![part],
                })
            }
            Self::Legacy => {
                let (main_part, mut document) = read_part(&dir.join(CONFIG_FILE))?;
                let (ng_part, ng_document) = read_part(&dir.join(NEXT_GEN_FILE))?;
                let ng_root = ng_document.into_root().into_value();
                if let (Some(main), NodeValue::Mapping(ng)) =
                    (document.root_mut().as_mapping_mut(), ng_root)
                {
                    for (key, value) in ng {
                        // Context sections come from the next-gen file;
                        // stray keys are kept unless the main file has them.
                        if NEXT_GEN_SECTIONS.contains(&key.as_str()) || !main.contains_key(&key) {
                            main.insert(key, value);
                        }
                    }
                }
                Ok(StoredDocument {
                    layout: self,
                    document,
                    parts: vec![main_part, ng_part],
                })
            }
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::NextGen => "next-gen",
        })
    }
}

/// One backing file as it was when loaded
#[derive(Debug, Clone)]
struct Part {
    path: PathBuf,
    original: Option<String>,
    foot: Vec<String>,
    explicit_start: bool,
}

impl Part {
    fn is_next_gen(&self) -> bool {
        self.path.file_name().is_some_and(|name| name == NEXT_GEN_FILE)
    }
}

/// A document together with the file state it was loaded from
#[derive(Debug, Clone)]
pub struct StoredDocument {
    layout: Layout,
    document: Document,
    parts: Vec<Part>,
}

impl StoredDocument {
    /// Layout the document was loaded with
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Loaded document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable loaded document
    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Write the document back
    ///
    /// Every file whose content changed is first written in full to a
    /// temporary file beside it; only then are the temporaries renamed over
    /// the originals. Files whose rendering is unchanged are not touched.
    ///
    /// Each rename is atomic, the pair is not: a crash between the two
    /// renames of the legacy layout leaves the next-gen file updated and
    /// `config.yaml` as it was. The next-gen file goes first since both
    /// generations of clients read contexts from it.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    /// - [`StoreError::Serialization`] if the root is no longer a mapping
    /// - [`StoreError::Io`] if a file cannot be written
    pub fn persist(&self) -> StoreResult<usize> {
        let rendered = self.render()?;
        let mut staged = Vec::new();
        for (part, text) in self.parts.iter().zip(rendered) {
            let Some(text) = text else {
                continue;
            };
            staged.push((part, stage(&part.path, &text)?));
        }
        staged.sort_by_key(|(part, _)| !part.is_next_gen());
        let written = staged.len();
        for (part, temp) in staged {
            temp.persist(&part.path)
                .map_err(|err| StoreError::io(&part.path, err.error))?;
            tracing::debug!(path = %part.path.display(), "persisted document");
        }
        Ok(written)
    }

    /// Rendered text per part, `None` where nothing needs writing
    fn render(&self) -> StoreResult<Vec<Option<String>>> {
        let Some(root) = self.document.root().as_mapping() else {
            return Err(StoreError::Serialization(format!(
                "document root must be a mapping, found {}",
                self.document.root().kind()
            )));
        };
        let sections = match self.layout {
            Layout::NextGen => vec![root.clone()],
            Layout::Legacy => {
                let (ng, main): (Mapping, Mapping) = root
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .partition(|(k, _)| NEXT_GEN_SECTIONS.contains(&k.as_str()));
                vec![main, ng]
            }
        };
        Ok(self
            .parts
            .iter()
            .zip(sections)
            .map(|(part, section)| {
                let empty = section.is_empty();
                let mut doc = Document::new(Node::mapping(section));
                doc.set_foot_comments(part.foot.clone());
                doc.set_explicit_start(part.explicit_start);
                let text = if empty && part.foot.is_empty() && !part.explicit_start {
                    String::new()
                } else {
                    doc.to_yaml_string()
                };
                let unchanged = match &part.original {
                    Some(original) => *original == text,
                    None => empty,
                };
                (!unchanged).then_some(text)
            })
            .collect())
    }
}

fn read_part(path: &Path) -> StoreResult<(Part, Document)> {
    let original = match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(StoreError::io(path, err)),
    };
    let document = match original.as_deref() {
        None => Document::empty_mapping(),
        Some(text) => parse_or_empty(path, text)?,
    };
    tracing::debug!(path = %path.display(), exists = original.is_some(), "loaded document file");
    let part = Part {
        path: path.to_path_buf(),
        original,
        foot: document.foot_comments().to_vec(),
        explicit_start: document.explicit_start(),
    };
    Ok((part, document))
}

fn parse_or_empty(path: &Path, text: &str) -> StoreResult<Document> {
    let reason = match Document::parse(text) {
        Ok(doc) if doc.root().as_mapping().is_some() => return Ok(doc),
        Ok(doc) if doc.root().is_null() => {
            let mut empty = Document::empty_mapping();
            empty.set_foot_comments(doc.foot_comments().to_vec());
            empty.set_explicit_start(doc.explicit_start());
            return Ok(empty);
        }
        Ok(doc) => format!("root is a {}, expected a mapping", doc.root().kind()),
        Err(source) if source.is_unsupported() => {
            tracing::warn!(path = %path.display(), error = %source, "refusing to rewrite document");
            return Err(source.into());
        }
        Err(source) => source.to_string(),
    };
    let err = StoreError::Malformed {
        path: path.to_path_buf(),
        reason,
    };
    tracing::warn!(error = %err, "starting from an empty document");
    Ok(Document::empty_mapping())
}

/// Write `text` to a synced temporary file in the target's directory
fn stage(path: &Path, text: &str) -> StoreResult<NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|err| StoreError::io(dir, err))?;
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| StoreError::io(dir, err))?;
    temp.write_all(text.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| StoreError::io(temp.path(), err))?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    fn read(dir: &Path, name: &str) -> Option<String> {
        fs::read_to_string(dir.join(name)).ok()
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        for layout in [Layout::Legacy, Layout::NextGen] {
            let stored = layout.load(dir.path()).unwrap();
            assert!(stored.document().is_empty());
            assert_eq!(stored.persist().unwrap(), 0);
        }
        assert!(read(dir.path(), CONFIG_FILE).is_none());
    }

    #[test]
    fn legacy_merges_and_splits_sections() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILE, "apiVersion: v1\nservers: []\ncurrent: a\n");
        write(dir.path(), NEXT_GEN_FILE, "contexts: []\ncurrentContext: {}\n");
        let mut stored = Layout::Legacy.load(dir.path()).unwrap();
        let keys: Vec<&String> = stored.document().root().as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["apiVersion", "servers", "current", "contexts", "currentContext"]);

        let root = stored.document_mut().root_mut().as_mapping_mut().unwrap();
        root.insert("clientOptions".into(), Node::string("x"));
        assert_eq!(stored.persist().unwrap(), 1);
        assert_eq!(
            read(dir.path(), CONFIG_FILE).unwrap(),
            "apiVersion: v1\nservers: []\ncurrent: a\nclientOptions: x\n"
        );
        assert_eq!(
            read(dir.path(), NEXT_GEN_FILE).unwrap(),
            "contexts: []\ncurrentContext: {}\n"
        );
    }

    #[test]
    fn legacy_moves_context_sections_out_of_main_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILE, "current: a\ncontexts: []\n");
        let stored = Layout::Legacy.load(dir.path()).unwrap();
        assert_eq!(stored.persist().unwrap(), 2);
        assert_eq!(read(dir.path(), CONFIG_FILE).unwrap(), "current: a\n");
        assert_eq!(read(dir.path(), NEXT_GEN_FILE).unwrap(), "contexts: []\n");
    }

    #[test]
    fn next_gen_keeps_everything_in_one_file() {
        let dir = TempDir::new().unwrap();
        let mut stored = Layout::NextGen.load(dir.path()).unwrap();
        let root = stored.document_mut().root_mut().as_mapping_mut().unwrap();
        root.insert("contexts".into(), Node::sequence(Vec::new()));
        root.insert("current".into(), Node::string("a"));
        assert_eq!(stored.persist().unwrap(), 1);
        assert_eq!(read(dir.path(), NEXT_GEN_FILE).unwrap(), "contexts: []\ncurrent: a\n");
        assert!(read(dir.path(), CONFIG_FILE).is_none());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), NEXT_GEN_FILE, "contexts: [unterminated\n");
        let stored = Layout::NextGen.load(dir.path()).unwrap();
        assert!(stored.document().is_empty());
        write(dir.path(), NEXT_GEN_FILE, "- just\n- a list\n");
        assert!(Layout::NextGen.load(dir.path()).unwrap().document().is_empty());
    }

    #[test]
    fn unsupported_file_is_not_loaded() {
        let dir = TempDir::new().unwrap();
        let text = "base: &b\n  x: 1\ncopy: *b\n";
        write(dir.path(), NEXT_GEN_FILE, text);
        let err = Layout::NextGen.load(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Tree(ref tree) if tree.is_unsupported()));
        assert_eq!(read(dir.path(), NEXT_GEN_FILE).unwrap(), text);
    }

    #[cfg(unix)]
    #[test]
    fn next_gen_file_is_committed_first() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILE, "current: a\n");
        write(dir.path(), NEXT_GEN_FILE, "contexts: []\n");
        let mut stored = Layout::Legacy.load(dir.path()).unwrap();
        let root = stored.document_mut().root_mut().as_mapping_mut().unwrap();
        root.insert("current".into(), Node::string("b"));
        root.insert("currentContext".into(), Node::string("b"));

        // A directory in place of config.yaml makes its rename fail.
        let main = dir.path().join(CONFIG_FILE);
        fs::remove_file(&main).unwrap();
        fs::create_dir(&main).unwrap();
        write(&main, "keep", "x");

        assert!(matches!(stored.persist(), Err(StoreError::Io { .. })));
        assert_eq!(
            read(dir.path(), NEXT_GEN_FILE).unwrap(),
            "contexts: []\ncurrentContext: b\n"
        );
        assert!(main.join("keep").exists());
    }

    #[test]
    fn comments_and_markers_survive_persist() {
        let dir = TempDir::new().unwrap();
        let text = "---\n# contexts\ncontexts: []\n# end\n";
        write(dir.path(), NEXT_GEN_FILE, text);
        let mut stored = Layout::NextGen.load(dir.path()).unwrap();
        let root = stored.document_mut().root_mut().as_mapping_mut().unwrap();
        root.insert("currentContext".into(), Node::mapping(Mapping::new()));
        stored.persist().unwrap();
        assert_eq!(
            read(dir.path(), NEXT_GEN_FILE).unwrap(),
            "---\n# contexts\ncontexts: []\ncurrentContext: {}\n# end\n"
        );
    }
}
