use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::app::{AppController, StderrErrors, SubmitOutcome};
use crate::chat::Visibility;
use crate::client::{ClientError, PredictionApi};
use crate::form::{FormControls, Panel, CONTROL_NAMES};
use crate::models::{PredictionResult, StudentMetrics};
use crate::render::text::{self, TextCharts, TextSurface};

type InFlight<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

const HELP: &str = "\
commands:
  set <control> <value>   attendance | tracking | midterm | logins | tutoring
  show                    current control values
  predict                 submit the form
  open | close            show or hide the chat panel
  ask <question>          ask the assistant about the current prediction
  math | math close       show or hide the model breakdown
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { control: String, value: String },
    Show,
    Predict,
    OpenChat,
    CloseChat,
    Ask(String),
    ShowMath,
    HideMath,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Free text counts as a question while the chat panel is open.
    pub fn parse(line: &str, chat_visible: bool) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match (head.to_lowercase().as_str(), rest) {
            ("set", rest) => match rest.split_once(char::is_whitespace) {
                Some((control, value)) => Command::Set {
                    control: control.to_lowercase(),
                    value: value.trim().to_string(),
                },
                None => Command::Unknown(line.to_string()),
            },
            ("show", "") => Command::Show,
            ("predict" | "submit", "") => Command::Predict,
            ("open", "") => Command::OpenChat,
            ("close", "") => Command::CloseChat,
            ("ask", question) => Command::Ask(question.to_string()),
            ("math", "") => Command::ShowMath,
            ("math", "close") => Command::HideMath,
            ("help", "") => Command::Help,
            ("quit" | "exit", "") => Command::Quit,
            _ if chat_visible => Command::Ask(line.to_string()),
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Status line the results area shows in `panel`, if any.
fn panel_notice(panel: Panel) -> Option<&'static str> {
    match panel {
        Panel::Initial => Some("Set the controls and run 'predict' to see the analysis."),
        Panel::Loading => Some("predicting..."),
        Panel::Results => None,
    }
}

/// Awaits the future in `slot`, or never resolves when the slot is empty.
async fn next_in<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

pub async fn run<A: PredictionApi>(api: &A, mut controls: FormControls) -> anyhow::Result<()> {
    let mut app = AppController::default();
    let mut surface = TextSurface::with_all_targets();
    let mut charts = TextCharts::with_all_canvases();
    let mut errors = StderrErrors;
    let mut out = std::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut prediction: Option<
        InFlight<'_, (StudentMetrics, Result<PredictionResult, ClientError>)>,
    > = None;
    let mut reply: Option<InFlight<'_, Result<String, ClientError>>> = None;

    info!(session = %app.chat().id(), "interactive session started");
    writeln!(out, "{HELP}")?;
    if let Some(notice) = panel_notice(app.panel()) {
        writeln!(out, "{notice}")?;
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let chat_visible = app.chat().visibility() == Visibility::Visible;
                let Some(command) = Command::parse(&line, chat_visible) else {
                    continue;
                };

                match command {
                    Command::Set { control, value } => {
                        if CONTROL_NAMES.contains(&control.as_str()) {
                            controls.set(&control, value);
                        } else {
                            writeln!(out, "unknown control '{control}'")?;
                        }
                    }
                    Command::Show => {
                        for (name, value) in controls.display_values() {
                            writeln!(out, "  {name:<10} {value}")?;
                        }
                    }
                    Command::Predict => match app.begin_submit(&controls) {
                        Some(metrics) => {
                            if let Some(notice) = panel_notice(app.panel()) {
                                writeln!(out, "{notice}")?;
                            }
                            prediction = Some(Box::pin(async move {
                                let outcome = api.predict(&metrics).await;
                                (metrics, outcome)
                            }));
                        }
                        None => writeln!(out, "a prediction is already running")?,
                    },
                    Command::OpenChat => {
                        app.chat_mut().open();
                        if !app.chat().has_context() {
                            writeln!(out, "questions need a prediction; run 'predict' first")?;
                        }
                    }
                    Command::CloseChat => app.chat_mut().close(),
                    Command::Ask(question) => {
                        let chat = app.chat_mut();
                        if chat.is_pending() {
                            writeln!(out, "still waiting for the previous answer")?;
                        } else if let Some(pending) = chat.prepare(&question) {
                            reply = Some(Box::pin(async move { pending.send(api).await }));
                        }
                    }
                    Command::ShowMath => match app.show_math() {
                        Some(breakdown) => write!(out, "{}", text::math_table(&breakdown))?,
                        None => writeln!(out, "no prediction yet")?,
                    },
                    Command::HideMath => {
                        if app.math_modal() == Visibility::Visible {
                            app.hide_math();
                            writeln!(out, "model breakdown closed")?;
                        }
                    }
                    Command::Help => writeln!(out, "{HELP}")?,
                    Command::Quit => break,
                    Command::Unknown(line) => writeln!(out, "unrecognized: {line} (try 'help')")?,
                }
            }
            (metrics, outcome) = next_in(&mut prediction) => {
                prediction = None;
                let outcome = app.finish_submit(metrics, outcome, &mut surface, &mut charts, &mut errors);
                match outcome {
                    SubmitOutcome::Rendered(_) => text::print_results(&mut out, &surface, &charts)?,
                    _ => {
                        if let Some(notice) = panel_notice(app.panel()) {
                            writeln!(out, "{notice}")?;
                        }
                    }
                }
            }
            answer = next_in(&mut reply) => {
                reply = None;
                app.chat_mut().complete(answer);
                if let Some(message) = app.chat().messages().last() {
                    writeln!(out, "{}", message.to_plain())?;
                }
            }
        }
        out.flush()?;
    }

    app.release_charts(&mut charts);
    Ok(())
}
