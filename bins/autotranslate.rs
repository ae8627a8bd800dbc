use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use configs::AppConfig;
use dotenvy::dotenv;
use service::job::{self, JobOptions, Summary};
use service::translator::ChatCompletionTranslator;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Fill untranslated locale catalog entries using a language-model API.
///
/// Without FILES every non-source language from the config is processed;
/// with FILES the language is taken from each file's parent directory.
#[derive(Parser, Debug)]
#[command(name = "autotranslate", version)]
struct Cli {
    /// Config file (TOML); defaults to $CONFIG_PATH or ./autotranslate.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Only process these language codes
    #[arg(short, long = "lang", value_name = "CODE")]
    langs: Vec<String>,

    /// List untranslated keys without calling the API or writing files
    #[arg(long)]
    dry_run: bool,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,

    /// Catalog files to process instead of the configured languages
    files: Vec<PathBuf>,
}

fn init_logging(json: bool) {
    common::utils::logging::init_logging(json);
    info!(service = "autotranslate", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    // .env first so RUST_LOG, LOG_FORMAT and OPENAI_API_KEY apply
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let run_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "autotranslate", event = "panic", %run_id, pid, message = %info, "unhandled panic occurred");
    }));

    let cfg = match AppConfig::load_and_validate(cli.config.as_deref(), !cli.dry_run) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "autotranslate", event = "config_invalid", error = %format!("{e:#}"), "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "autotranslate", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = "autotranslate", event = "start", %run_id, pid, version, dry_run = cli.dry_run, model = %cfg.openai.model, "autotranslate starting");

    match rt.block_on(run(&cfg, &cli)) {
        Ok(summary) => {
            info!(
                service = "autotranslate",
                event = "stop",
                %run_id,
                written = summary.files_written,
                skipped = summary.files_skipped,
                failed = summary.files_failed,
                translated = summary.translated,
                fallbacks = summary.fallbacks,
                pending = summary.pending,
                "autotranslate finished"
            );
            if summary.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Err(e) => {
            error!(service = "autotranslate", event = "run_failed", %run_id, error = %format!("{e:#}"), "autotranslate aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: &AppConfig, cli: &Cli) -> anyhow::Result<Summary> {
    if cli.files.is_empty() {
        common::env::ensure_env(&cfg.catalog.locales_root()).await?;
    }

    let targets = job::plan_targets(cfg, &cli.langs, &cli.files);
    if targets.is_empty() {
        warn!(service = "autotranslate", event = "no_targets", "no catalogs to process");
    }

    let translator = ChatCompletionTranslator::new(&cfg.openai)?;
    let opts = JobOptions::from_config(&cfg.catalog, cli.dry_run);
    Ok(job::run(&targets, &translator, &opts).await)
}
