//! CLI binary for lessonlens.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AssessmentConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lessonlens::{assess, write_docx, AssessmentConfig, AssessmentOutput};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a lesson plan, print the Markdown report to stdout
  lessonlens giao-an.pdf

  # Export the report as a Word document
  lessonlens giao-an.docx -o tham-dinh.docx

  # Use a single specific model
  lessonlens --model gemini-3-flash-preview giao-an.pdf

  # Point at a different hosted credential list
  lessonlens --keys-url "https://drive.google.com/file/d/<id>/view" giao-an.pdf

  # Structured JSON output (report + stats)
  lessonlens --json giao-an.pdf > result.json

MODEL FALLBACK:
  Credentials are fetched fresh from the hosted JSON list on every run and
  tried in a random order. For each credential the models are tried in the
  order given (best first); the first successful response wins. Only when
  every credential × model combination fails does the run error out.

ENVIRONMENT VARIABLES:
  LESSONLENS_KEYS_URL     Override the credential list share link
  LESSONLENS_OUTPUT       Default output path for the .docx report
  RUST_LOG                Tracing filter (e.g. lessonlens=debug)
"#;

/// Assess lesson plans (PDF/Word) with Gemini models.
#[derive(Parser, Debug)]
#[command(
    name = "lessonlens",
    version,
    about = "Assess lesson plans (PDF/Word) with Gemini models",
    long_about = "Extract the text of a lesson plan (PDF or Word), request a structured \
pedagogical review from the Generative Language API with credential rotation and \
model fallback, and export the result as Markdown or a Word document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Lesson plan file (.pdf or .docx).
    input: PathBuf,

    /// Write the report as a .docx file instead of printing Markdown.
    #[arg(short, long, env = "LESSONLENS_OUTPUT")]
    output: Option<PathBuf>,

    /// Model identifier, best first; repeat the flag to set the fallback order.
    #[arg(long = "model")]
    models: Vec<String>,

    /// Share link of the hosted JSON credential list.
    #[arg(long, env = "LESSONLENS_KEYS_URL")]
    keys_url: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, default_value_t = 8192)]
    max_tokens: u32,

    /// Delay between failed attempts, in milliseconds.
    #[arg(long, default_value_t = 500)]
    attempt_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Output the full result (report + stats) as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the report itself.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Spinner ──────────────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Reviewing");
        bar.set_message(format!("{}", cli.input.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run assessment ───────────────────────────────────────────────────
    let result = assess(&cli.input, &config).await;

    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{} {e}", red("✘"));
            std::process::exit(1);
        }
    };

    // ── Emit result ──────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(ref output_path) = cli.output {
        write_docx(&output.report, output_path)
            .await
            .context("Failed to write the report")?;
        if !cli.quiet {
            eprintln!(
                "{}  report  →  {}",
                green("✔"),
                bold(&output_path.display().to_string())
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// One-line run summary on stderr.
fn print_summary(output: &AssessmentOutput) {
    if output.report.is_empty() {
        eprintln!(
            "{}  the response had no marked sections — nothing to report",
            red("⚠")
        );
    }
    eprintln!(
        "   {} via key {}  —  {} attempt(s), {} line(s), {}ms total",
        bold(&output.model),
        dim(&output.credential_hint),
        output.stats.attempts,
        output.stats.report_lines,
        output.stats.total_duration_ms,
    );
}

/// Map CLI args to `AssessmentConfig`.
fn build_config(cli: &Cli) -> Result<AssessmentConfig> {
    let mut builder = AssessmentConfig::builder()
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .attempt_delay_ms(cli.attempt_delay_ms)
        .request_timeout_secs(cli.timeout);

    if !cli.models.is_empty() {
        builder = builder.models(cli.models.iter().cloned());
    }
    if let Some(ref url) = cli.keys_url {
        builder = builder.keys_url(url.clone());
    }

    builder.build().context("Invalid configuration")
}
