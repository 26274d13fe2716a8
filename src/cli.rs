use clap::Parser;
use std::path::PathBuf;

/// Transcript languages offered by the language selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Language {
    En,
    Hi,
    Es,
    Fr,
    De,
    It,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
        }
    }
}

#[derive(Parser)]
#[command(
    name = "ytnotes",
    about = "YouTube transcript to detailed notes converter",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video link, e.g. https://www.youtube.com/watch?v=ID (reads one line from stdin if omitted)
    pub url: Option<String>,

    /// Transcript language (defaults to default_lang from the config file, then en)
    #[arg(short, long, value_enum)]
    pub lang: Option<Language>,

    /// Gemini model used for the notes
    #[arg(long)]
    pub model: Option<String>,

    /// HTTP/HTTPS proxy for transcript requests (overrides PROXY_URL)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Print the flattened transcript instead of summarizing it
    #[arg(long)]
    pub transcript: bool,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show video ID, language and model
    #[arg(short, long)]
    pub verbose: bool,
}
