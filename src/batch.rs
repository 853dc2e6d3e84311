//! Batch driver
//!
//! Processes many source files on a local worker pool. Each input
//! `texes/<id>/<name>.tex` produces either `proofs/<id>/<name>.txt` (one
//! proof per line) or `proofs/<id>/<name>.err` (the file-level error),
//! never both.

use crate::core::collector::FileProofs;
use crate::core::context::ExtractOptions;
use crate::utils::error::{ExtractError, ExtractResult};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Worker stack, sized for the deepest nesting of skip frames allowed by
/// the extraction options.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root the inputs are mirrored from
    pub input_root: PathBuf,
    /// Root the `.txt`/`.err` files are written under
    pub output_root: PathBuf,
    /// Worker pool size
    pub jobs: usize,
    /// Skip inputs that already have a `.txt` or `.err`
    pub skip_existing: bool,
    /// Stop at the first file-level error (runs sequentially)
    pub fail_fast: bool,
    /// Where to write the JSON summary, if anywhere
    pub summary_path: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("texes"),
            output_root: PathBuf::from("proofs"),
            jobs: std::thread::available_parallelism().map_or(1, |n| n.get()),
            skip_existing: false,
            fail_fast: false,
            summary_path: None,
        }
    }
}

impl BatchOptions {
    /// Single worker, nothing skipped, first error is returned.
    pub fn sequential() -> Self {
        Self {
            jobs: 1,
            fail_fast: true,
            ..Self::default()
        }
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub input: String,
    pub status: FileStatus,
    pub proofs: usize,
    pub skipped_proofs: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn new(input: &Path, status: FileStatus) -> Self {
        Self {
            input: input.to_string_lossy().into_owned(),
            status,
            proofs: 0,
            skipped_proofs: 0,
            warnings: 0,
            error: None,
        }
    }
}

/// Inventory of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub proofs: usize,
    pub skipped_proofs: usize,
    pub files: Vec<FileReport>,
}

impl BatchSummary {
    fn from_reports(files: Vec<FileReport>) -> Self {
        let count = |status| files.iter().filter(|r| r.status == status).count();
        Self {
            succeeded: count(FileStatus::Succeeded),
            failed: count(FileStatus::Failed),
            skipped: count(FileStatus::Skipped),
            proofs: files.iter().map(|r| r.proofs).sum(),
            skipped_proofs: files.iter().map(|r| r.skipped_proofs).sum(),
            files,
        }
    }

    pub fn write_json(&self, path: &Path) -> ExtractResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ExtractError::internal(format!("cannot serialize summary: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Read a matches file: one path per line, blank lines and `#` lines
/// skipped.
pub fn read_matches_file(path: &Path) -> io::Result<Vec<PathBuf>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_matches(&content))
}

fn parse_matches(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

fn is_tex_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("tex"))
        .unwrap_or(false)
}

/// Expand inputs: files are kept as given, directories are walked for
/// `.tex` files. The result is sorted.
pub fn collect_tex_files(inputs: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(walk_dir(input)?.into_iter().filter(|p| is_tex_file(p)));
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(walk_dir(&path)?);
        } else {
            files.push(path);
        }
    }
    Ok(files)
}

// ============================================================================
// Outputs
// ============================================================================

/// The `.txt` and `.err` paths for `input`, mirroring its place under
/// the input root. Inputs outside the root keep only their file name.
pub fn output_paths(input: &Path, options: &BatchOptions) -> (PathBuf, PathBuf) {
    let relative = match input.strip_prefix(&options.input_root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => input
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| input.to_path_buf()),
    };
    let base = options.output_root.join(relative);
    (base.with_extension("txt"), base.with_extension("err"))
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn write_proofs(txt: &Path, err: &Path, result: &FileProofs) -> io::Result<()> {
    create_parent(txt)?;
    let mut file = io::BufWriter::new(fs::File::create(txt)?);
    for proof in &result.proofs {
        writeln!(file, "{}", proof)?;
    }
    file.flush()?;
    remove_stale(err)
}

fn write_error(txt: &Path, err_path: &Path, input: &Path, err: &ExtractError) -> io::Result<()> {
    create_parent(err_path)?;
    let report = format!(
        "{}\n\n{:?}\n\nwhile processing {}\n",
        err,
        err,
        input.display()
    );
    fs::write(err_path, report)?;
    remove_stale(txt)
}

// ============================================================================
// Driving
// ============================================================================

/// Process one input and write its output. The error is returned
/// alongside the report so fail-fast mode can surface it.
fn process_file(
    input: &Path,
    batch: &BatchOptions,
    options: &ExtractOptions,
) -> (FileReport, Option<ExtractError>) {
    let (txt, err_path) = output_paths(input, batch);
    if batch.skip_existing && (txt.exists() || err_path.exists()) {
        log::debug!("{}: output exists, skipping", input.display());
        return (FileReport::new(input, FileStatus::Skipped), None);
    }

    match crate::extract_proofs_from_file(input, options) {
        Ok(result) => {
            let mut report = FileReport::new(input, FileStatus::Succeeded);
            report.proofs = result.proofs.len();
            report.skipped_proofs = result.skipped.len();
            report.warnings = result.warnings.len();
            if let Err(e) = write_proofs(&txt, &err_path, &result) {
                log::error!("{}: cannot write {}: {}", input.display(), txt.display(), e);
                report.status = FileStatus::Failed;
                report.error = Some(e.to_string());
                return (report, Some(e.into()));
            }
            (report, None)
        }
        Err(err) => {
            log::warn!("{}: {}", input.display(), err);
            if let Err(e) = write_error(&txt, &err_path, input, &err) {
                log::error!("{}: cannot write {}: {}", input.display(), err_path.display(), e);
            }
            let mut report = FileReport::new(input, FileStatus::Failed);
            report.error = Some(err.to_string());
            (report, Some(err))
        }
    }
}

/// Run every input. With `fail_fast` the files are processed in order on
/// the calling thread and the first file-level error is returned, after
/// its `.err` has been written.
pub fn run_batch(
    inputs: &[PathBuf],
    batch: &BatchOptions,
    options: &ExtractOptions,
) -> ExtractResult<BatchSummary> {
    let total = inputs.len();
    let done = AtomicUsize::new(0);
    let step = |input: &PathBuf| {
        let outcome = process_file(input, batch, options);
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("[{}/{}] {}", n, total, input.display());
        outcome
    };

    let reports = if batch.fail_fast {
        let mut reports = Vec::with_capacity(total);
        for input in inputs {
            let (report, err) = step(input);
            if let Some(err) = err {
                return Err(err);
            }
            reports.push(report);
        }
        reports
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(batch.jobs.max(1))
            .stack_size(WORKER_STACK_SIZE)
            .build()
            .map_err(|e| ExtractError::internal(format!("cannot start worker pool: {}", e)))?;
        pool.install(|| {
            inputs
                .par_iter()
                .map(|input| step(input).0)
                .collect::<Vec<_>>()
        })
    };

    let summary = BatchSummary::from_reports(reports);
    log::info!(
        "{} files: {} succeeded, {} failed, {} skipped; {} proofs",
        total,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.proofs
    );
    if let Some(path) = &batch.summary_path {
        summary.write_json(path)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn options_in(dir: &TempDir) -> BatchOptions {
        BatchOptions {
            input_root: dir.path().join("texes"),
            output_root: dir.path().join("proofs"),
            jobs: 2,
            ..BatchOptions::default()
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_matches_skips_comments() {
        let paths = parse_matches("texes/1/a.tex\n# texes/1/dup.tex\n\n  texes/2/b.tex  \n");
        assert_eq!(
            paths,
            vec![PathBuf::from("texes/1/a.tex"), PathBuf::from("texes/2/b.tex")]
        );
    }

    #[test]
    fn test_output_paths_mirror_input_root() {
        let options = BatchOptions::default();
        let (txt, err) = output_paths(Path::new("texes/0801.1234/main.tex"), &options);
        assert_eq!(txt, PathBuf::from("proofs/0801.1234/main.txt"));
        assert_eq!(err, PathBuf::from("proofs/0801.1234/main.err"));

        let (txt, _) = output_paths(Path::new("/elsewhere/paper.tex"), &options);
        assert_eq!(txt, PathBuf::from("proofs/paper.txt"));
    }

    #[test]
    fn test_collect_walks_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("texes");
        write(&root.join("1/a.tex"), "");
        write(&root.join("1/notes.md"), "");
        write(&root.join("2/deep/b.TEX"), "");
        let files = collect_tex_files(&[root.clone()]).unwrap();
        assert_eq!(files, vec![root.join("1/a.tex"), root.join("2/deep/b.TEX")]);
    }

    #[test]
    fn test_batch_writes_txt_and_err() {
        let dir = TempDir::new().unwrap();
        let batch = options_in(&dir);
        let good = batch.input_root.join("1/good.tex");
        let bad = batch.input_root.join("2/bad.tex");
        write(
            &good,
            "\\begin{proof} First. \\end{proof}\n\\begin{proof} \\alpha \\end{proof}\n\
             \\begin{proof} Third. \\end{proof}",
        );
        write(&bad, "\\begin{proof} Fine. \\end{proof} $x");

        let summary = run_batch(&[good, bad], &batch, &ExtractOptions::default()).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.proofs, 2);
        assert_eq!(summary.skipped_proofs, 1);

        let txt = fs::read_to_string(batch.output_root.join("1/good.txt")).unwrap();
        assert_eq!(txt, "First .\nThird .\n");
        assert!(!batch.output_root.join("1/good.err").exists());

        let err = fs::read_to_string(batch.output_root.join("2/bad.err")).unwrap();
        assert!(err.starts_with("Unterminated math"), "got: {}", err);
        assert!(err.contains("bad.tex"));
        assert!(!batch.output_root.join("2/bad.txt").exists());
    }

    #[test]
    fn test_skip_existing_and_stale_removal() {
        let dir = TempDir::new().unwrap();
        let mut batch = options_in(&dir);
        let input = batch.input_root.join("1/a.tex");
        write(&input, "\\begin{proof} Done. \\end{proof}");
        let (txt, err) = output_paths(&input, &batch);
        write(&err, "old failure");

        batch.skip_existing = true;
        let summary = run_batch(&[input.clone()], &batch, &ExtractOptions::default()).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(!txt.exists());

        batch.skip_existing = false;
        run_batch(&[input], &batch, &ExtractOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(&txt).unwrap(), "Done .\n");
        assert!(!err.exists());
    }

    #[test]
    fn test_fail_fast_returns_first_error() {
        let dir = TempDir::new().unwrap();
        let batch = BatchOptions {
            fail_fast: true,
            jobs: 1,
            ..options_in(&dir)
        };
        let bad = batch.input_root.join("bad.tex");
        let good = batch.input_root.join("good.tex");
        write(&bad, "$$ x");
        write(&good, "\\begin{proof} Ok. \\end{proof}");

        let result = run_batch(&[bad, good], &batch, &ExtractOptions::default());
        assert_eq!(result, Err(ExtractError::UnterminatedMath));
        assert!(batch.output_root.join("bad.err").exists());
        assert!(!batch.output_root.join("good.txt").exists());
    }

    #[test]
    fn test_summary_json() {
        let dir = TempDir::new().unwrap();
        let summary_path = dir.path().join("summary.json");
        let batch = BatchOptions {
            summary_path: Some(summary_path.clone()),
            ..options_in(&dir)
        };
        let input = batch.input_root.join("a.tex");
        write(&input, "\\begin{proof} Yes. \\end{proof}");
        run_batch(&[input], &batch, &ExtractOptions::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(summary_path).unwrap()).unwrap();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["files"][0]["status"], "succeeded");
        assert_eq!(json["files"][0]["proofs"], 1);
    }
}
