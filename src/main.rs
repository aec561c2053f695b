use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod batch;
mod chat;
mod client;
mod config;
mod form;
mod models;
mod render;
mod report;
mod session;

use app::{AppController, StderrErrors, SubmitOutcome};
use client::PredictionClient;
use config::{ApiConfig, API_BASE_URL, REQUEST_TIMEOUT_MS};
use form::{FormControls, ATTENDANCE, LOGINS, MIDTERM, TRACKING, TUTORING};
use render::html::HtmlSurface;
use render::svg::SvgCharts;
use render::text::{self, TextCharts, TextSurface};

#[derive(Parser)]
#[command(name = "academic-risk")]
#[command(about = "Terminal client for the academic risk prediction API", long_about = None)]
struct Cli {
    /// Prediction API base URL
    #[arg(long, global = true, default_value = API_BASE_URL)]
    base_url: String,
    /// Client-side request timeout in milliseconds
    #[arg(long, global = true, default_value_t = REQUEST_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Raw control values; anything unparseable is sent as 0 / false.
#[derive(Args, Clone, Default)]
struct FormArgs {
    /// Attendance rate, 0-100
    #[arg(long)]
    attendance: Option<String>,
    /// Tracking (coursework) grade
    #[arg(long)]
    tracking: Option<String>,
    /// First midterm grade
    #[arg(long)]
    midterm: Option<String>,
    /// Platform login count
    #[arg(long)]
    logins: Option<String>,
    /// Uses tutoring (1/true/on/yes)
    #[arg(long)]
    tutoring: Option<String>,
}

impl FormArgs {
    fn controls(&self) -> FormControls {
        let mut controls = FormControls::new();
        controls.set_opt(ATTENDANCE, self.attendance.as_deref());
        controls.set_opt(TRACKING, self.tracking.as_deref());
        controls.set_opt(MIDTERM, self.midterm.as_deref());
        controls.set_opt(LOGINS, self.logins.as_deref());
        controls.set_opt(TUTORING, self.tutoring.as_deref());
        controls
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Predict risk for one student and print the results
    Predict {
        #[command(flatten)]
        form: FormArgs,
        /// Ask the assistant about the prediction once it is shown
        #[arg(long)]
        ask: Option<String>,
    },
    /// Predict risk and write an HTML report
    Report {
        #[command(flatten)]
        form: FormArgs,
        #[arg(long, default_value = "report.html")]
        out: PathBuf,
    },
    /// Predict risk for every row of a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive session with the form, results and chat assistant
    Session {
        #[command(flatten)]
        form: FormArgs,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("RISK_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let api = PredictionClient::new(ApiConfig {
        base_url: cli.base_url.clone(),
        timeout: Duration::from_millis(cli.timeout_ms),
    })
    .context("failed to build HTTP client")?;
    tracing::debug!(base_url = %api.config().base_url, "client ready");

    match cli.command {
        Commands::Predict { form, ask } => {
            let mut app = AppController::default();
            let mut surface = TextSurface::with_all_targets();
            let mut charts = TextCharts::with_all_canvases();

            println!("Predicting...");
            let outcome = app
                .submit(
                    &form.controls(),
                    &api,
                    &mut surface,
                    &mut charts,
                    &mut StderrErrors,
                )
                .await;

            match outcome {
                SubmitOutcome::Rendered(report) => {
                    text::print_results(&mut std::io::stdout(), &surface, &charts)?;
                    if !report.is_complete() {
                        eprintln!(
                            "{} of {} views rendered",
                            report.rendered.len(),
                            report.rendered.len() + report.skipped.len()
                        );
                    }
                    if let Some(question) = ask {
                        if app.chat_mut().ask(&question, &api).await {
                            for message in app.chat().messages() {
                                println!("{}", message.to_plain());
                            }
                        }
                    }
                }
                SubmitOutcome::Failed(_) => anyhow::bail!("prediction failed"),
                SubmitOutcome::Ignored => {}
            }
        }
        Commands::Report { form, out } => {
            let controls = form.controls();
            let mut app = AppController::default();
            let mut surface = HtmlSurface::default();
            let mut charts = SvgCharts::default();

            let outcome = app
                .submit(&controls, &api, &mut surface, &mut charts, &mut StderrErrors)
                .await;
            if let SubmitOutcome::Failed(_) = outcome {
                anyhow::bail!("prediction failed; no report written");
            }

            let result = app.current().context("no prediction to report")?;
            let report = report::build_report(&controls, &surface, &charts, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Report written to {} (risk {}).",
                out.display(),
                result.risk_level.as_str()
            );
        }
        Commands::Batch { csv, out } => {
            let inputs = batch::read_inputs_from_path(&csv)?;
            if inputs.is_empty() {
                println!("No rows found in {}.", csv.display());
                return Ok(());
            }

            let (predictions, summary) = batch::predict_all(&inputs, &api).await;

            println!(
                "Predicted {} of {} students (avg risk {:.1}%):",
                summary.predicted(),
                inputs.len(),
                summary.avg_risk
            );
            println!("- LOW: {}", summary.low);
            println!("- MEDIUM: {}", summary.medium);
            println!("- HIGH: {}", summary.high);
            for (name, reason) in &summary.failures {
                println!("- failed {name}: {reason}");
            }

            if let Some(out) = out {
                batch::write_predictions(&out, &predictions)?;
                println!("Predictions written to {}.", out.display());
            }
        }
        Commands::Session { form } => {
            session::run(&api, form.controls()).await?;
        }
    }

    Ok(())
}
