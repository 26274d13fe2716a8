use std::io::{self, BufRead};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{error, info};

use ytnotes::config::{API_KEY_ENV, Config, ConfigFile, PROXY_ENV};
use ytnotes::notes::{NotesError, NotesOutcome, NotesRequest};
use ytnotes::summarize::Gemini;
use ytnotes::youtube::{TranscriptFetcher, YouTube};

mod cli;

use cli::Cli;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytnotes.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytnotes")
        .join("logs")
}

fn env_line(name: &str, missing: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => format!("  \x1b[32m✅\x1b[0m {name:<15} set"),
        _ => format!("  \x1b[31m❌\x1b[0m {name:<15} ({missing})"),
    }
}

fn build_after_help() -> String {
    let api_key_line = env_line(API_KEY_ENV, "not set, needed for notes");
    let proxy_line = env_line(PROXY_ENV, "not set, transcripts fetched directly");

    format!(
        "\nENVIRONMENT:\n{api_key_line}\n{proxy_line}\n\nConfig file: {}\nLogs are written to: {}",
        ytnotes::config::config_path().display(),
        log_dir().join("ytnotes.log").display()
    )
}

/// Fetch and summarize; `None` when the transcript came back empty
async fn notes(config: &Config, request: &NotesRequest) -> Result<Option<String>, NotesError> {
    let fetcher = YouTube::new(config)?;
    let summarizer = Gemini::new(config)?;

    match ytnotes::notes::generate_notes(&fetcher, &summarizer, request).await? {
        NotesOutcome::Notes { video_id, summary } => {
            info!("Notes ready for {video_id} ({} chars)", summary.len());
            Ok(Some(ytnotes::output::render_notes(&summary)))
        }
        NotesOutcome::EmptyTranscript { video_id } => {
            info!("No transcript text for {video_id}");
            Ok(None)
        }
    }
}

async fn transcript_only(config: &Config, request: &NotesRequest) -> Result<Option<String>, NotesError> {
    let video_id = ytnotes::extract_video_id(&request.url)?;
    let fetcher = YouTube::new(config)?;

    let segments = fetcher.fetch(&video_id, &request.language).await?;
    let text = ytnotes::youtube::flatten(&segments);
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(ytnotes::output::render_transcript(&text)))
}

fn read_url(cli: &Cli) -> Result<String> {
    let url = match cli.url {
        Some(ref url) => url.clone(),
        None => io::stdin().lock().lines().next().transpose()?.unwrap_or_default(),
    };

    let url = url.trim().to_string();
    if url.is_empty() {
        bail!("no video link provided\n\nUsage: ytnotes <URL>\n       echo <URL> | ytnotes");
    }
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    setup_logging()?;
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let mut config = Config::from_env(ConfigFile::load().unwrap_or_default());

    config.apply_cli(cli.model.as_deref(), cli.proxy.as_deref());

    let request = NotesRequest {
        url: read_url(&cli)?,
        language: cli
            .lang
            .map(|l| l.code().to_string())
            .unwrap_or_else(|| config.default_lang.clone()),
    };

    // The thumbnail only needs the ID, not a successful fetch
    if let Ok(video_id) = ytnotes::extract_video_id(&request.url) {
        eprintln!("{}", ytnotes::output::render_thumbnail(&video_id));
        if cli.verbose {
            eprintln!("Video: {video_id}\nLanguage: {}\nModel: {}", request.language, config.model);
            if config.proxy_url.is_some() {
                eprintln!("Proxy: enabled");
            }
        }
    }

    let result = if cli.transcript {
        transcript_only(&config, &request).await
    } else {
        notes(&config, &request).await
    };

    let rendered = match result {
        Ok(Some(rendered)) => rendered,
        Ok(None) => {
            if cli.verbose {
                eprintln!("Transcript is empty, nothing to summarize");
            }
            return Ok(());
        }
        Err(e) => {
            error!("Request for {} failed: {e}", request.url);
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    Ok(())
}
