//! File Resolver: where `\input`, `\include` and `\usepackage` targets
//! come from.
//!
//! The interpreter only ever asks two things: which path an include
//! target names relative to the including file, and the raw bytes at that
//! path. Implementations:
//!
//! - `StdFileResolver`: the real filesystem, with optional search paths
//!   (like `TEXINPUTS`)
//! - `MemoryFileResolver`: a fixed set of in-memory files
//! - `NoopFileResolver`: every read fails (includes disabled)

use crate::data::commands::IncludeKind;
use fxhash::FxHashMap;
use std::path::{Component, Path, PathBuf};

pub trait FileResolver: Send + Sync {
    /// Raw contents of `path`.
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileResolveError>;

    /// The path `target` names when included from `including`.
    fn resolve(&self, including: &str, target: &str) -> String;
}

/// Why an include could not be read. Never fatal for the including file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResolveError {
    NotFound(String),
    ReadError(String),
    NotSupported(String),
}

impl std::fmt::Display for FileResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileResolveError::NotFound(path) => write!(f, "File not found: {}", path),
            FileResolveError::ReadError(msg) => write!(f, "Read error: {}", msg),
            FileResolveError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
        }
    }
}

impl std::error::Error for FileResolveError {}

/// File names to try, in order, for an include target.
///
/// `\input{x}` tries `x.tex` then `x`; `\usepackage{x}` tries `x.sty`.
pub fn include_candidates(target: &str, kind: IncludeKind) -> Vec<String> {
    let target = target.trim().trim_matches('"');
    if target.is_empty() {
        return Vec::new();
    }
    let lower = target.to_ascii_lowercase();
    match kind {
        IncludeKind::Input if lower.ends_with(".tex") => vec![target.to_string()],
        IncludeKind::Input => vec![format!("{}.tex", target), target.to_string()],
        IncludeKind::Package if lower.ends_with(".sty") => vec![target.to_string()],
        IncludeKind::Package => vec![format!("{}.sty", target)],
        IncludeKind::DocumentClass => Vec::new(),
    }
}

/// Join `target` onto the directory of `including`, folding `.` and `..`.
/// Absolute targets are kept as they are.
fn sibling_path(including: &str, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.has_root() {
        return target.to_path_buf();
    }
    let dir = Path::new(including).parent().unwrap_or_else(|| Path::new(""));
    let mut joined = PathBuf::new();
    for component in dir.join(target).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if joined.file_name().is_some() {
                    joined.pop();
                } else {
                    joined.push("..");
                }
            }
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}

// ============================================================================
// Filesystem
// ============================================================================

/// Reads includes from disk: first next to the including file, then in
/// each search path.
#[derive(Debug, Clone, Default)]
pub struct StdFileResolver {
    search_paths: Vec<PathBuf>,
}

impl StdFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            search_paths: paths.into_iter().collect(),
        }
    }

    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        let direct = Path::new(path);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        if direct.is_absolute() {
            return None;
        }
        let name = direct.file_name()?;
        self.search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl FileResolver for StdFileResolver {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileResolveError> {
        let found = self
            .locate(path)
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))?;
        std::fs::read(&found)
            .map_err(|e| FileResolveError::ReadError(format!("{}: {}", found.display(), e)))
    }

    fn resolve(&self, including: &str, target: &str) -> String {
        sibling_path(including, target).to_string_lossy().into_owned()
    }
}

// ============================================================================
// In memory
// ============================================================================

/// A fixed set of files keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileResolver {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: &str, content: &str) {
        self.add_bytes(path, content.as_bytes().to_vec());
    }

    pub fn add_bytes(&mut self, path: &str, content: Vec<u8>) {
        let key = sibling_path("", path).to_string_lossy().into_owned();
        self.files.insert(key, content);
    }
}

impl FileResolver for MemoryFileResolver {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileResolveError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))
    }

    fn resolve(&self, including: &str, target: &str) -> String {
        sibling_path(including, target).to_string_lossy().into_owned()
    }
}

/// Includes disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileResolver;

impl FileResolver for NoopFileResolver {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileResolveError> {
        Err(FileResolveError::NotSupported(format!(
            "includes are disabled: {}",
            path
        )))
    }

    fn resolve(&self, _including: &str, target: &str) -> String {
        target.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::decode::decode_source;

    fn read_source(resolver: &dyn FileResolver, path: &str) -> String {
        decode_source(&resolver.read_bytes(path).unwrap())
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("./paper/defs.tex", "\\def\\x{}");
        resolver.add_bytes("latin1.tex", b"caf\xE9".to_vec());

        assert_eq!(read_source(&resolver, "paper/defs.tex"), "\\def\\x{}");
        assert_eq!(read_source(&resolver, "latin1.tex"), "caf\u{e9}");
        assert_eq!(
            resolver.read_bytes("missing.tex"),
            Err(FileResolveError::NotFound("missing.tex".into()))
        );
    }

    #[test]
    fn test_resolve_relative_to_including_file() {
        let resolver = MemoryFileResolver::new();
        assert_eq!(resolver.resolve("paper/main.tex", "sec.tex"), "paper/sec.tex");
        assert_eq!(resolver.resolve("main.tex", "sec.tex"), "sec.tex");
        assert_eq!(resolver.resolve("paper/main.tex", "/abs.tex"), "/abs.tex");
        assert_eq!(
            resolver.resolve("paper/ch/one.tex", "../common/./defs.tex"),
            "paper/common/defs.tex"
        );
        assert_eq!(resolver.resolve("main.tex", "../up.tex"), "../up.tex");
    }

    #[test]
    fn test_include_candidates() {
        assert_eq!(
            include_candidates("chapter1", IncludeKind::Input),
            vec!["chapter1.tex".to_string(), "chapter1".to_string()]
        );
        assert_eq!(
            include_candidates("chapter1.TEX", IncludeKind::Input),
            vec!["chapter1.TEX".to_string()]
        );
        assert_eq!(
            include_candidates("mydefs", IncludeKind::Package),
            vec!["mydefs.sty".to_string()]
        );
        assert!(include_candidates("article", IncludeKind::DocumentClass).is_empty());
        assert!(include_candidates("  ", IncludeKind::Input).is_empty());
    }

    #[test]
    fn test_std_resolver_reads_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.tex");
        std::fs::write(&main, "main").unwrap();
        std::fs::write(dir.path().join("sub.tex"), b"caf\xE9").unwrap();

        let resolver = StdFileResolver::new();
        let sub = resolver.resolve(main.to_str().unwrap(), "sub.tex");
        assert_eq!(read_source(&resolver, &sub), "caf\u{e9}");
        let missing = resolver.resolve(main.to_str().unwrap(), "x.tex");
        assert!(matches!(resolver.read_bytes(&missing), Err(FileResolveError::NotFound(_))));
    }

    #[test]
    fn test_std_resolver_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let styles = dir.path().join("styles");
        std::fs::create_dir(&styles).unwrap();
        std::fs::write(styles.join("house.sty"), "\\newcommand{\\H}{h}").unwrap();

        let resolver = StdFileResolver::with_search_paths(vec![styles]);
        let path = resolver.resolve("paper/main.tex", "house.sty");
        assert_eq!(read_source(&resolver, &path), "\\newcommand{\\H}{h}");
        assert!(StdFileResolver::new().read_bytes(&path).is_err());
    }

    #[test]
    fn test_noop_resolver() {
        let resolver = NoopFileResolver;
        assert!(matches!(
            resolver.read_bytes("any.tex"),
            Err(FileResolveError::NotSupported(_))
        ));
    }
}
