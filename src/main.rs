//! formpilot - fill a web form with values chosen by a language model.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;

use formpilot::{
    api_key_from_env, pipeline, ChatResolver, Error, RunConfig, RunSummary, API_KEY_ENV,
};

#[derive(Parser)]
#[command(name = "formpilot")]
#[command(about = "Fill a web form with values chosen by a language model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the form at a URL from a mock data file
    Run {
        /// URL of the form to fill
        #[arg(long)]
        url: String,

        /// Path to a JSON file mapping field keys to scalar values
        #[arg(long)]
        data_file: PathBuf,

        /// Model identifier for the completion endpoint
        #[arg(long, default_value = "gpt-4.1-nano")]
        model: String,

        /// Chat-completions endpoint
        #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
        endpoint: String,

        /// Directory receiving the video and screenshot artifacts
        #[arg(long, default_value = "videos")]
        output_dir: PathBuf,

        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,

        /// Trigger the form's submit action after filling
        #[arg(long)]
        submit: bool,

        /// Chrome executable to use instead of the autodetected one
        #[arg(long)]
        chrome_path: Option<String>,

        /// Timeout for browser operations, in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formpilot=info,chromiumoxide=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let Commands::Run {
        url,
        data_file,
        model,
        endpoint,
        output_dir,
        headed,
        submit,
        chrome_path,
        timeout,
    } = cli.command;

    let mut browser = formpilot::Browser::builder()
        .headless(!headed)
        .timeout(Duration::from_secs(timeout));
    if let Some(path) = chrome_path {
        browser = browser.chrome_path(path);
    }

    let config = RunConfig {
        target_url: url,
        data_file,
        model,
        endpoint,
        output_dir,
        submit,
        browser: browser.build_config(),
    };

    match execute(&config).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("run failed: {e}");
            eprintln!("Error: {e}");
            match e {
                Error::StartupError(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

async fn execute(config: &RunConfig) -> formpilot::Result<RunSummary> {
    // The credential check comes first: no browser, no network before it.
    let api_key = api_key_from_env(API_KEY_ENV)?;
    let resolver = ChatResolver::new(&config.endpoint, &config.model, api_key)?;
    pipeline::run(config, &resolver).await
}

fn print_summary(summary: &RunSummary) {
    println!("Form filling complete.");
    println!(
        "  fields attempted: {}  filled: {}  skipped: {}",
        summary.report.attempted, summary.report.filled, summary.report.skipped
    );
    if summary.submitted {
        println!("  form submitted");
    }
    if let Some(video) = &summary.video {
        println!("  video: {}", video.display());
    }
    if let Some(screenshot) = &summary.screenshot {
        println!("  screenshot: {}", screenshot.display());
    }
    for warning in &summary.report.warnings {
        println!("  warning: {warning}");
    }
}
