use clap::Parser;
use qr_points::adapters::capture::{open_scanner, BoxedScanner, STDIN_SOURCE};
use qr_points::config::cli::LogFormat;
use qr_points::core::{engine, selection};
use qr_points::domain::ports::{Feedback, PointStore};
use qr_points::utils::error::ErrorSeverity;
use qr_points::utils::retry::with_backoff;
use qr_points::utils::{logger, validation::Validate};
use qr_points::{
    ActiveReceptacle, AppConfig, CliArgs, LineScanner, LogFeedback, PointsError, Result,
    RunSummary, ScanEngine, ScanPipeline, SoundFeedback, SupabaseStore, TextDecoder,
};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting qr-points");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(config).await {
        Ok(summary) => {
            println!(
                "✅ Stopped after {} scans: {} credited, {} rejected",
                summary.payloads,
                summary.credited,
                summary.rejected()
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ qr-points stopped: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: AppConfig) -> Result<RunSummary> {
    let store = SupabaseStore::new(&config.backend)?;
    let retry = config.retry_policy();

    let mut console = BufReader::new(tokio::io::stdin());
    let names = with_backoff(&retry, "list_receptacles", || store.list_receptacles()).await?;
    let name = match &config.receptacle.name {
        Some(name) => selection::resolve_preselected(&names, name)?,
        None => prompt_for_receptacle(&names, &mut console).await?,
    };
    let active = ActiveReceptacle::new(name, config.receptacle.assigned_category.clone());
    tracing::info!(
        "🗑️ Selected receptacle: {} (accepts '{}')",
        active.name,
        active.assigned_category
    );

    // The console reader may already hold buffered scan lines; keep using it.
    let scanner: BoxedScanner = if config.capture.source == STDIN_SOURCE {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(console);
        LineScanner::new(reader)
    } else {
        open_scanner(&config.capture.source).await?
    };

    let feedback: Box<dyn Feedback> = if config.feedback.enabled {
        Box::new(SoundFeedback::new(&config.feedback))
    } else {
        Box::new(LogFeedback)
    };

    let pipeline = ScanPipeline::new(store, feedback, active, retry);
    let mut engine =
        ScanEngine::new(scanner, TextDecoder, pipeline).with_poll_interval(config.poll_interval());

    tracing::info!("📷 Scanner ready. Present a disposal code.");
    engine
        .run_until(engine::shutdown_on(tokio::signal::ctrl_c()))
        .await
}

async fn prompt_for_receptacle<R>(names: &[String], console: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    if names.is_empty() {
        return Err(PointsError::NoReceptacles);
    }

    println!("Available receptacles:");
    println!("{}", selection::render_menu(names));
    print!("Enter the receptacle number: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    console.read_line(&mut input).await?;
    selection::select_receptacle(names, &input)
}
