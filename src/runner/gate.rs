//! Decision gate between the safety scan and execution.
//!
//! ```text
//! Clean / ScanFailed ──────────────────────────────► Proceed
//! Suspicious ──► ask ──► RunAnyway ────────────────► Proceed
//!                 ▲  ├─► Skip ─────────────────────► Skipped
//!                 │  ├─► Cancel ───────────────────► Cancelled
//!                 └──┴─► OpenAndReask (open editor)
//! ```
//!
//! The loop has no bound: the user may open the file as often as they like.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;

use scriptest_core::{GateOutcome, ScanVerdict, UserDecision};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::interfaces::{DecisionPrompt, DecisionRequest, EditorLauncher};
use super::reporter::{Diagnostic, DiagnosticKind, RunReporter};

/// Turn a scan verdict into a terminal gate state, asking the user when the target is flagged.
#[tracing::instrument(skip_all, fields(script = display_name))]
pub async fn resolve<P, E>(
    verdict: &ScanVerdict,
    display_name: &str,
    path: &Path,
    prompt: &mut P,
    editor: &E,
    reporter: &mut dyn RunReporter,
) -> GateOutcome
where
    P: DecisionPrompt,
    E: EditorLauncher + ?Sized,
{
    let reasons = match verdict {
        ScanVerdict::Clean | ScanVerdict::ScanFailed { .. } => return GateOutcome::Proceed,
        ScanVerdict::Suspicious { reasons } => reasons,
    };

    let request = DecisionRequest {
        display_name: display_name.to_string(),
        path: path.to_path_buf(),
        reasons: reasons.clone(),
    };

    loop {
        let decision = prompt.decide(&request).await;
        debug!(%decision, "user decided");
        match decision {
            UserDecision::RunAnyway => return GateOutcome::Proceed,
            UserDecision::Skip => return GateOutcome::Skipped,
            UserDecision::Cancel => return GateOutcome::Cancelled,
            UserDecision::OpenAndReask => {
                if let Err(e) = editor.open(path) {
                    warn!(error = %e, "could not open editor");
                    reporter.on_diagnostic(&Diagnostic::new(
                        DiagnosticKind::EditorFailed,
                        display_name,
                        format!("could not open {}: {e}", path.display()),
                    ));
                }
            }
        }
    }
}

// ============================================================================
// Console prompt
// ============================================================================

/// Asks on a text stream: `[c]ancel, [r]un anyway, [s]kip, [o]pen file`.
///
/// Unrecognized answers re-ask; end of input (or a read error) means cancel.
pub struct ConsolePrompt<R, W> {
    input: Lines<BufReader<R>>,
    output: W,
}

impl ConsolePrompt<tokio::io::Stdin, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), std::io::stderr())
    }
}

impl<R: AsyncRead + Unpin, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: BufReader::new(input).lines(),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn menu() -> String {
        UserDecision::ALL
            .iter()
            .map(|d| format!("[{}] {}", d.shortcut(), d.label()))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

impl<R: AsyncRead + Unpin, W: Write> DecisionPrompt for ConsolePrompt<R, W> {
    async fn decide(&mut self, request: &DecisionRequest) -> UserDecision {
        // Prompt output is best-effort, like the console reporter.
        let _ = writeln!(
            self.output,
            "\n{} was flagged by the safety scan:\n{}\n",
            request.display_name, request.reasons
        );

        loop {
            let _ = write!(self.output, "{} > ", Self::menu());
            let _ = self.output.flush();

            let line = match self.input.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => {
                    let _ = writeln!(self.output);
                    return UserDecision::Cancel;
                }
            };

            match line.parse::<UserDecision>() {
                Ok(decision) => return decision,
                Err(message) => {
                    let _ = writeln!(self.output, "{message}");
                }
            }
        }
    }
}

// ============================================================================
// Channel prompt
// ============================================================================

/// A decision request waiting for an answer from the presentation layer.
#[derive(Debug)]
pub struct PendingDecision {
    pub request: DecisionRequest,
    reply: oneshot::Sender<UserDecision>,
}

impl PendingDecision {
    /// Answer the request. Answering after the run gave up waiting is a no-op.
    pub fn respond(self, decision: UserDecision) {
        let _ = self.reply.send(decision);
    }
}

/// Forwards each decision to another task (a GUI event loop, a test) and waits for the reply.
///
/// A closed channel or a dropped [`PendingDecision`] counts as cancel.
#[derive(Debug, Clone)]
pub struct ChannelPrompt {
    requests: mpsc::Sender<PendingDecision>,
}

impl ChannelPrompt {
    /// Create the prompt and the receiving end the presentation layer listens on.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingDecision>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (Self { requests }, receiver)
    }
}

impl DecisionPrompt for ChannelPrompt {
    async fn decide(&mut self, request: &DecisionRequest) -> UserDecision {
        let (reply, answer) = oneshot::channel();
        let pending = PendingDecision {
            request: request.clone(),
            reply,
        };
        if self.requests.send(pending).await.is_err() {
            debug!("decision receiver closed");
            return UserDecision::Cancel;
        }
        answer.await.unwrap_or(UserDecision::Cancel)
    }
}

// ============================================================================
// Non-interactive prompts
// ============================================================================

/// Always gives the same terminal answer (`--yes`, `--skip-suspicious`).
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt {
    decision: UserDecision,
}

impl FixedPrompt {
    pub fn run_anyway() -> Self {
        Self {
            decision: UserDecision::RunAnyway,
        }
    }

    pub fn skip() -> Self {
        Self {
            decision: UserDecision::Skip,
        }
    }

    pub fn cancel() -> Self {
        Self {
            decision: UserDecision::Cancel,
        }
    }
}

impl DecisionPrompt for FixedPrompt {
    async fn decide(&mut self, _request: &DecisionRequest) -> UserDecision {
        self.decision
    }
}

/// Answers from a queue, then cancels once it runs dry. Records every request it saw.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<UserDecision>,
    pub asked: Vec<DecisionRequest>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = UserDecision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl DecisionPrompt for ScriptedPrompt {
    async fn decide(&mut self, request: &DecisionRequest) -> UserDecision {
        self.asked.push(request.clone());
        self.answers.pop_front().unwrap_or(UserDecision::Cancel)
    }
}
