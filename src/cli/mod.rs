//! CLI for the dispatch binary
//!
//! `dispatch compile <file>` drives a single compilation job over a file:
//! prepare, parse (on a worker thread when the job allows it), finalize,
//! then either report the syntax error or reset the job.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

use compiler_dispatcher::heap::{Isolate, StaticOneByteResource, error_to_string};
use compiler_dispatcher::{
    CompileJobStatus, CompilerDispatcherJob, DispatcherConfig, JobId, SourceKind, init_logging,
};

/// Worker stack per KiB of parser stack limit.
const WORKER_STACK_FACTOR: usize = 4;
const MIN_WORKER_STACK: usize = 2 * 1024 * 1024;

/// CLI arguments for dispatch
#[derive(Parser, Debug)]
#[command(name = "dispatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one compilation job over a script file
    Compile {
        /// Script to compile
        file: PathBuf,
        /// Back the source with an external one-byte buffer
        #[arg(long)]
        external: bool,
        /// Parser stack limit in KiB
        #[arg(long)]
        stack_size: Option<usize>,
        /// Parse on the main thread even when a worker is allowed
        #[arg(long)]
        foreground: bool,
        /// Print the job report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Options of one `compile` invocation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Script to compile
    pub file: PathBuf,
    /// Load the source as an external buffer
    pub external: bool,
    /// Keep the parse on the main thread
    pub foreground: bool,
}

/// Summary of a compile run
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Job identifier
    pub job: JobId,
    /// Function name (the file stem)
    pub function: String,
    /// Source storage of the job
    pub source_kind: SourceKind,
    /// Whether the parse ran on a worker thread
    pub background: bool,
    /// Status at the end of the cycle, before any reset
    pub status: CompileJobStatus,
    /// Parse tree size on success
    pub nodes: Option<usize>,
    /// Reported exception text on failure
    pub error: Option<String>,
    /// Source span of the error
    pub location: Option<(usize, usize)>,
}

impl JobReport {
    /// Returns true if the source parsed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

fn function_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("script")
        .to_string()
}

fn parse_on_worker(job: &mut CompilerDispatcherJob, stack_limit_kb: usize) -> Result<()> {
    let stack_size = stack_limit_kb
        .saturating_mul(1024)
        .saturating_mul(WORKER_STACK_FACTOR)
        .max(MIN_WORKER_STACK);

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("dispatch-parse".to_string())
            .stack_size(stack_size)
            .spawn_scoped(scope, || job.parse())
            .context("Failed to spawn parse worker")?;
        worker
            .join()
            .map_err(|_| anyhow!("Parse worker panicked"))?
            .context("Parse failed")
    })
}

/// Runs one job over `options.file` and returns its report.
///
/// # Errors
///
/// Fails if the file cannot be read or the job is misused; syntax errors in
/// the file are part of the report instead.
pub fn compile(options: &CompileOptions, config: &DispatcherConfig) -> Result<JobReport> {
    let bytes = std::fs::read(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;
    let name = function_name(&options.file);

    let mut isolate = Isolate::with_stack_trace_limit(config.stack_trace_limit);
    let source = if options.external {
        isolate.new_external_string_from_one_byte(Arc::new(StaticOneByteResource::from_bytes(
            bytes,
        )))
    } else {
        isolate.new_string_from_static_chars(&String::from_utf8_lossy(&bytes))
    };
    let function = isolate.new_function_for_source(&name, source);

    let mut job = CompilerDispatcherJob::new(&isolate, function, config.max_stack_size_kb)
        .context("Failed to create compile job")?;
    job.prepare_to_parse_on_main_thread(&isolate)?;

    let background =
        config.parse_on_background && !options.foreground && job.can_parse_on_background_thread();
    if background {
        parse_on_worker(&mut job, config.max_stack_size_kb)?;
    } else {
        job.parse()?;
    }
    job.finalize_parsing_on_main_thread(&isolate)?;

    let mut report = JobReport {
        job: job.id(),
        function: name,
        source_kind: job.source_kind(),
        background,
        status: job.status(),
        nodes: job.parse_artifact().map(|artifact| artifact.node_count()),
        error: None,
        location: None,
    };

    if job.status() == CompileJobStatus::Failed {
        report.location = job.pending_error().map(|error| {
            let location = error.location();
            (location.start, location.end)
        });
        job.report_errors_on_main_thread(&mut isolate)?;
        let thrown = isolate
            .clear_pending_exception()
            .context("No exception pending after error report")?;
        let message = error_to_string(&mut isolate, &thrown)
            .map_err(|_| anyhow!("Failed to format reported error"))?;
        warn!(job = %report.job, %message, "compilation failed");
        report.error = Some(message);
        report.status = job.status();
    } else {
        info!(job = %report.job, nodes = ?report.nodes, "compilation parsed");
        job.reset_on_main_thread(&isolate)?;
    }

    Ok(report)
}

fn print_report(report: &JobReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}: {}", report.function, report.status);
    if let Some(nodes) = report.nodes {
        println!("parsed {nodes} nodes");
    }
    if let Some(error) = &report.error {
        eprintln!("{error}");
    }
    Ok(())
}

/// Parse and execute CLI arguments
///
/// Returns whether the compiled source was free of syntax errors.
pub fn run() -> Result<bool> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DispatcherConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DispatcherConfig::default(),
    };

    match args.command {
        Command::Compile {
            file,
            external,
            stack_size,
            foreground,
            json,
        } => {
            let config = DispatcherConfig {
                max_stack_size_kb: stack_size.unwrap_or(config.max_stack_size_kb),
                ..config
            };
            config.validate()?;
            init_logging(&config.log_level);

            let options = CompileOptions {
                file,
                external,
                foreground,
            };
            let report = compile(&options, &config)?;
            print_report(&report, json)?;
            Ok(report.succeeded())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn script(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".js").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn options(file: &tempfile::NamedTempFile, external: bool) -> CompileOptions {
        CompileOptions {
            file: file.path().to_path_buf(),
            external,
            foreground: false,
        }
    }

    #[test]
    fn test_compile_valid_source() {
        let file = script("var x = 1;\nx = x + 2;\n");
        let report = compile(&options(&file, false), &DispatcherConfig::default()).unwrap();

        assert!(report.succeeded());
        assert!(!report.background);
        assert_eq!(report.source_kind, SourceKind::ManagedBuffer);
        assert_eq!(report.status, CompileJobStatus::ReadyToCompile);
        assert!(report.nodes.unwrap() > 0);
    }

    #[test]
    fn test_compile_external_source_on_worker() {
        let file = script("function f(a) { return a; }");
        let report = compile(&options(&file, true), &DispatcherConfig::default()).unwrap();

        assert!(report.background);
        assert_eq!(report.source_kind, SourceKind::ExternalBuffer);
        assert!(report.succeeded());
    }

    #[test]
    fn test_compile_foreground_keeps_main_thread() {
        let file = script("source");
        let mut opts = options(&file, true);
        opts.foreground = true;
        let report = compile(&opts, &DispatcherConfig::default()).unwrap();
        assert!(!report.background);
    }

    #[test]
    fn test_compile_syntax_error() {
        let file = script("^^^");
        let report = compile(&options(&file, true), &DispatcherConfig::default()).unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.status, CompileJobStatus::Done);
        assert_eq!(report.error.as_deref(), Some("SyntaxError: Unexpected token '^'"));
        assert_eq!(report.location, Some((0, 1)));
    }

    #[test]
    fn test_compile_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = CompileOptions {
            file: dir.path().join("missing.js"),
            external: false,
            foreground: false,
        };
        assert!(compile(&opts, &DispatcherConfig::default()).is_err());
    }

    #[test]
    fn test_report_json() {
        let file = script("^");
        let report = compile(&options(&file, false), &DispatcherConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["source_kind"], "managed_buffer");
    }
}
