//! texproof CLI - extract proof text from LaTeX sources

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use texproof::{
    batch::{collect_tex_files, read_matches_file, run_batch, BatchOptions},
    data::{fixups::load_fixups, stdlib::StdLibrary},
    extract_proofs_from_file, ExtractOptions,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "texproof")]
#[command(version)]
#[command(about = "Extract natural-language proof text from LaTeX sources", long_about = None)]
struct Cli {
    /// Input files or directories (directories are searched for .tex files)
    files: Vec<PathBuf>,

    /// Read input paths from a matches file (one per line, '#' lines skipped)
    #[arg(short, long, conflicts_with = "files")]
    matches: Option<PathBuf>,

    /// Root the inputs are mirrored from
    #[arg(long, default_value = "texes")]
    input_root: PathBuf,

    /// Root the .txt/.err outputs are written under
    #[arg(long, default_value = "proofs")]
    output_root: PathBuf,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Skip inputs whose .txt or .err output already exists
    #[arg(long)]
    skip_existing: bool,

    /// Stop at the first file-level error and exit non-zero (runs sequentially)
    #[arg(long)]
    fail_fast: bool,

    /// Print proofs to stdout instead of writing output files
    #[arg(short, long)]
    print: bool,

    /// Write a JSON summary of the run
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Replace the built-in standard-distribution allow-list
    #[arg(long)]
    stdlib: Option<PathBuf>,

    /// Load per-file fixups (tab-separated: pattern, find, replace)
    #[arg(long)]
    fixups: Option<PathBuf>,

    /// Do not follow \input or \usepackage of local files
    #[arg(long)]
    no_includes: bool,

    /// Use tighter token limits
    #[arg(long)]
    strict: bool,

    /// Log skipped proofs and per-file results
    #[arg(short, long)]
    verbose: bool,

    /// Log interpreter decisions (very noisy)
    #[arg(long)]
    debug: bool,
}

#[cfg(feature = "cli")]
impl Cli {
    fn extract_options(&self) -> std::io::Result<ExtractOptions> {
        let mut options = if self.strict {
            ExtractOptions::strict()
        } else {
            ExtractOptions::default()
        };
        if self.no_includes {
            options.follow_includes = false;
        }
        if let Some(path) = &self.stdlib {
            options = options.with_stdlib(StdLibrary::load(path)?);
        }
        if let Some(path) = &self.fixups {
            options = options.with_fixups(load_fixups(path)?);
        }
        Ok(options)
    }

    fn batch_options(&self) -> BatchOptions {
        let defaults = BatchOptions::default();
        BatchOptions {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            jobs: if self.fail_fast { 1 } else { self.jobs.unwrap_or(defaults.jobs) },
            skip_existing: self.skip_existing,
            fail_fast: self.fail_fast,
            summary_path: self.summary.clone(),
        }
    }

    fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .target(env_logger::Target::Stderr)
        .init();

    let options = match cli.extract_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: cannot load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let inputs = match &cli.matches {
        Some(path) => read_matches_file(path),
        None => collect_tex_files(&cli.files),
    };
    let inputs = match inputs {
        Ok(inputs) if !inputs.is_empty() => inputs,
        Ok(_) => {
            eprintln!("Error: no input files");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: cannot read inputs: {}", e);
            std::process::exit(2);
        }
    };

    if cli.print {
        let mut failed = false;
        for input in &inputs {
            match extract_proofs_from_file(input, &options) {
                Ok(result) => {
                    for proof in &result.proofs {
                        println!("{}", proof);
                    }
                }
                Err(e) => {
                    eprintln!("✗ {}: {}", input.display(), e);
                    failed = true;
                }
            }
        }
        if failed {
            std::process::exit(1);
        }
        return;
    }

    let batch = cli.batch_options();
    match run_batch(&inputs, &batch, &options) {
        Ok(summary) => {
            eprintln!(
                "{} succeeded, {} failed, {} skipped; {} proofs ({} dropped)",
                summary.succeeded,
                summary.failed,
                summary.skipped,
                summary.proofs,
                summary.skipped_proofs
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install texproof --features cli");
}
