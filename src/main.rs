//! `docdelta` command line: compare two parsed documents and print the
//! classified change set as JSON.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docdelta::{
    Block, CancellationToken, Comparison, DocdeltaConfig, JudgeBackend, SemanticJudge, Stats,
    compare_with_cancel,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "docdelta", version, about = "Classify changes between two document versions")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare OLD and NEW (JSON arrays of blocks).
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
struct CompareArgs {
    old: PathBuf,
    new: PathBuf,

    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also emit UNCHANGED records.
    #[arg(long)]
    include_unchanged: bool,

    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-attempt judge deadline.
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    judge: Option<JudgeArg>,

    /// general, contract, policy or report.
    #[arg(long)]
    document_type: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum JudgeArg {
    Stub,
    Http,
}

impl From<JudgeArg> for JudgeBackend {
    fn from(value: JudgeArg) -> Self {
        match value {
            JudgeArg::Stub => JudgeBackend::Stub,
            JudgeArg::Http => JudgeBackend::Http,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Compare(args) => run_compare(args).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_compare(args: CompareArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => DocdeltaConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DocdeltaConfig::default(),
    };
    config.apply_env();
    if let Some(judge) = args.judge {
        config.judge.backend = judge.into();
    }

    let mut options = config.compare_options();
    if args.include_unchanged {
        options.include_unchanged = true;
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        options.judge_timeout_ms = timeout_ms;
    }
    if let Some(document_type) = args.document_type {
        options.document_type = Some(document_type);
    }

    let (old, new) = match read_blocks(&args.old).and_then(|old| Ok((old, read_blocks(&args.new)?))) {
        Ok(documents) => documents,
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "input_rejected");
            let job_id = options.job_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let failed = Comparison::failed(job_id, message, Stats::default());
            write_comparison(&failed, args.pretty)?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let judge = config.build_judge().context("building judge")?;
    info!(backend = %config.judge.backend, judge = judge.name(), "judge_ready");
    if let Some(warning) = config.judge_warning() {
        warn!(%warning, "stub_judge_active");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling comparison");
            on_signal.cancel();
        }
    });

    let comparison = compare_with_cancel(&old, &new, &options, judge, cancel).await;

    write_comparison(&comparison, args.pretty)?;

    Ok(if comparison.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn write_comparison(comparison: &Comparison, pretty: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, comparison)?;
    } else {
        serde_json::to_writer(&mut stdout, comparison)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn read_blocks(path: &Path) -> anyhow::Result<Vec<Block>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing blocks in {}", path.display()))
}
