mod cli;

use tubecast::{
    bot::{self, BotContext},
    config::{self, Config},
    telegram::TelegramClient,
};
use tubecast_av::{
    DurationProber, FfmpegTranscoder, FfprobeProber, SplitOutcome, Splitter, ToolRegistry,
    YtDlpExtractor,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn build_splitter(config: &Config, tools: &ToolRegistry) -> Result<Splitter> {
    let prober = FfprobeProber::from_registry(tools)?;
    let transcoder =
        FfmpegTranscoder::from_registry(tools)?.with_timeout(config.split.transcode_timeout());
    Ok(Splitter::new(
        Arc::new(prober),
        Arc::new(transcoder),
        config.split.settings(),
    )?)
}

async fn start_bot(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let token = config
        .telegram
        .bot_token
        .clone()
        .with_context(|| format!("{} environment variable not set!", config::BOT_TOKEN_ENV))?;

    let tools = ToolRegistry::discover(&config.tools);
    let splitter = build_splitter(&config, &tools)?;
    let extractor =
        YtDlpExtractor::from_registry(&tools)?.with_download_timeout(config.download.timeout());

    let client = TelegramClient::new(&config.telegram.api_url, &token);
    let me = client.get_me().await.context("Failed to authenticate with Telegram")?;
    tracing::info!(
        "Bot @{} started successfully!",
        me.username.as_deref().unwrap_or(&me.first_name)
    );
    tracing::info!(
        "Splitting files above {} bytes; downloads go to {}",
        config.split.max_part_bytes,
        config.download.temp_dir.display()
    );

    let ctx = BotContext {
        gateway: Arc::new(client.clone()),
        extractor: Arc::new(extractor),
        splitter: Arc::new(splitter),
        http: reqwest::Client::new(),
        temp_dir: config.download.temp_dir.clone(),
    };

    bot::run_polling(
        client,
        ctx,
        Duration::from_secs(config.telegram.poll_timeout_secs),
    )
    .await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubecast=trace,tubecast_av=trace".to_string()
        } else {
            "tubecast=debug,tubecast_av=debug".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_bot(cli.config.as_deref()))
        }
        Commands::Split { file, max_size } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(split_file(&file, cli.config.as_deref(), max_size))
        }
        Commands::Probe { file } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubecast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn split_file(file: &Path, config_path: Option<&Path>, max_size: Option<u64>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(max) = max_size {
        config.split.max_part_bytes = max;
    }
    config::validate_config(&config)?;

    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let tools = ToolRegistry::discover(&config.tools);
    let splitter = build_splitter(&config, &tools)?;

    match splitter.split_if_needed(file).await? {
        SplitOutcome::Split { parts } => {
            println!("Split into {} parts:", parts.len());
            for part in parts {
                println!(
                    "  [{}] {} ({:.3}s - {:.3}s)",
                    part.segment.number(),
                    part.path.display(),
                    part.segment.start,
                    part.segment.end()
                );
            }
        }
        SplitOutcome::Unsplit { path, reason } => {
            println!("Not split ({:?}): {}", reason, path.display());
        }
    }

    Ok(())
}

async fn probe_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::from_registry(&tools)?;

    let size = std::fs::metadata(file)?.len();
    let secs = prober.probe_duration(file).await;
    let whole = secs as u64;

    println!("File: {}", file.display());
    println!("Size: {} bytes", size);
    println!(
        "Duration: {:02}:{:02}:{:02} ({:.3}s)",
        whole / 3600,
        (whole / 60) % 60,
        whole % 60,
        secs
    );

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them before starting the bot.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_summary(&Config::default());
        }
    }

    Ok(())
}

fn print_summary(config: &Config) {
    println!("  Bot token: {}", if config.telegram.bot_token.is_some() { "set" } else { "missing" });
    println!("  API URL: {}", config.telegram.api_url);
    println!("  Max part size: {} bytes", config.split.max_part_bytes);
    println!("  Encoding: {} @ {}", config.split.codec, config.split.bitrate);
    println!("  Temp dir: {}", config.download.temp_dir.display());
}
