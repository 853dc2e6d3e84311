//! Standard-distribution allow-list and custom-style ignore list.
//!
//! Include targets found in either list are treated as already expanded:
//! the interpreter neither resolves nor descends into them.

use fxhash::FxHashSet;
use lazy_static::lazy_static;
use phf::phf_set;
use std::path::Path;
use std::sync::Arc;

/// The compiled-in allow-list.
const DEFAULT_LIST: &str = include_str!("stdlib.txt");

lazy_static! {
    static ref DEFAULT_LIBRARY: Arc<StdLibrary> = Arc::new(StdLibrary::parse(DEFAULT_LIST));
}

/// Custom style files seen often enough in the wild to be known harmless.
static IGNORED_STYLES: phf::Set<&'static str> = phf_set! {
    "jheppub", "jcappub", "aa", "aas_macros", "mn2e", "mnras", "emulateapj",
    "aipproc", "iopart", "elsart", "svmult", "svglov3", "spmpsci", "lipics",
    "lipics-v2019", "lipics-v2021", "acmart", "sig-alternate", "jmlr2e",
    "neurips_2019", "neurips_2020", "neurips_2021", "icml2019", "icml2020",
    "iclr2020_conference", "nips_2017", "colt2019", "aistats2020", "compositio",
    "imsart", "imsart-number", "epl2", "ptephy", "sn-jnl", "arxiv", "preprint",
};

/// A set of file names known to belong to the TeX distribution.
#[derive(Debug, Clone, Default)]
pub struct StdLibrary {
    names: FxHashSet<String>,
}

impl StdLibrary {
    /// The built-in allow-list, shared across workers.
    pub fn builtin() -> Arc<StdLibrary> {
        Arc::clone(&DEFAULT_LIBRARY)
    }

    /// Parse one name per line; blank lines and `#` lines are skipped.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_ascii_lowercase)
            .collect();
        Self { names }
    }

    /// Load an allow-list file, replacing the built-in one.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if `target` (with or without extension) is distribution
    /// content or an ignored custom style.
    pub fn is_known(&self, target: &str) -> bool {
        let name = normalize_target(target);
        if name.is_empty() {
            return true;
        }
        let stem = name
            .strip_suffix(".sty")
            .or_else(|| name.strip_suffix(".tex"))
            .or_else(|| name.strip_suffix(".cls"))
            .unwrap_or(&name);
        if IGNORED_STYLES.contains(stem) {
            return true;
        }
        self.names.contains(&name)
            || [".sty", ".cls", ".tex", ".clo"]
                .iter()
                .any(|ext| self.names.contains(&format!("{}{}", name, ext)))
    }
}

/// Lowercase, trim, strip quotes and leading directories.
pub fn normalize_target(target: &str) -> String {
    let trimmed = target.trim().trim_matches('"');
    let file = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    file.to_ascii_lowercase()
}
