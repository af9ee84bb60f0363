//! Confirmation protocol shared by all resolving workers.
//!
//! # Overview
//!
//! A run starts in one of two modes. In manual mode every duplicate set asks
//! for confirmation before anything is removed; in auto-all mode nothing is
//! asked. Answering "all" to any prompt raises the run to auto-all, and the
//! mode never goes back.
//!
//! Prompts are serialised by a single lock. The mode is read again after the
//! lock is taken, so a worker that queued behind the prompt that raised the
//! mode proceeds without asking.
//!
//! # Answers
//!
//! | Input | Meaning |
//! |---|---|
//! | empty, `y`, `yes` | remove this set's targets |
//! | `a`, `all`, `ya` | remove, and stop asking for the rest of the run |
//! | `n`, `no` | keep this set untouched |
//!
//! Anything else, and end of input, keeps the set untouched.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::pool::lock;

/// Whether sets are confirmed by a person or automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Ask before resolving each set.
    Manual,
    /// Resolve without asking.
    AutoAll,
}

/// Process-wide state shared by every resolving worker.
#[derive(Debug)]
pub struct RunState {
    auto_all: AtomicBool,
    deleted: AtomicUsize,
}

impl RunState {
    /// Create the run state in the given starting mode.
    #[must_use]
    pub fn new(mode: ConfirmMode) -> Self {
        Self {
            auto_all: AtomicBool::new(mode == ConfirmMode::AutoAll),
            deleted: AtomicUsize::new(0),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> ConfirmMode {
        if self.auto_all.load(Ordering::SeqCst) {
            ConfirmMode::AutoAll
        } else {
            ConfirmMode::Manual
        }
    }

    /// Raise the run to auto-all. Returns `true` if this call changed the mode.
    pub fn escalate(&self) -> bool {
        !self.auto_all.fetch_or(true, Ordering::SeqCst)
    }

    /// Count one successful removal.
    pub fn record_deletion(&self) {
        self.deleted.fetch_add(1, Ordering::SeqCst);
    }

    /// Successful removals so far.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }
}

/// A recognised answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Confirm this set.
    Yes,
    /// Confirm this set and every later one.
    All,
    /// Skip this set.
    No,
}

/// Parse a prompt answer, ignoring case and surrounding whitespace.
///
/// Returns `None` for anything unrecognised.
///
/// # Examples
///
/// ```
/// use dupsweep::actions::confirm::{parse_response, Response};
///
/// assert_eq!(parse_response(""), Some(Response::Yes));
/// assert_eq!(parse_response(" YA\n"), Some(Response::All));
/// assert_eq!(parse_response("nope"), None);
/// ```
#[must_use]
pub fn parse_response(input: &str) -> Option<Response> {
    match input.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Some(Response::Yes),
        "a" | "all" | "ya" => Some(Response::All),
        "n" | "no" => Some(Response::No),
        _ => None,
    }
}

/// Source of answers to confirmation prompts.
pub trait Prompter: Send + Sync {
    /// Show `question` and read one answer.
    ///
    /// Returns `Ok(None)` when no more input is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or read.
    fn ask(&self, question: &str) -> io::Result<Option<String>>;
}

/// Interactive prompter on stdout/stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}")?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Prompter that replays a fixed list of answers.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: AtomicUsize,
}

impl ScriptedPrompter {
    /// Create a prompter that answers in order, then reports end of input.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: AtomicUsize::new(0),
        }
    }

    /// Number of prompts shown so far.
    #[must_use]
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let answer = lock(&self.answers).pop_front();
        log::debug!("Scripted answer to {:?}: {:?}", question.trim(), answer);
        Ok(answer)
    }
}

/// Outcome of asking about one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Remove the set's targets.
    Confirmed,
    /// The user declined.
    Declined,
    /// No usable answer; the set is left untouched.
    Unanswered(String),
}

/// Serialises prompts and applies answers to the run state.
pub struct Confirmer<'a> {
    prompter: &'a dyn Prompter,
    prompt_lock: Mutex<()>,
}

impl<'a> Confirmer<'a> {
    /// Create a confirmer around a prompter.
    #[must_use]
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self {
            prompter,
            prompt_lock: Mutex::new(()),
        }
    }

    /// Decide whether a set may be resolved.
    ///
    /// In manual mode `before_prompt` runs under the prompt lock right
    /// before the question, so whatever it prints stays next to the prompt.
    /// It does not run when no prompt is shown.
    pub fn confirm(
        &self,
        state: &RunState,
        question: &str,
        before_prompt: impl FnOnce(),
    ) -> Decision {
        if state.mode() == ConfirmMode::AutoAll {
            return Decision::Confirmed;
        }

        let _guard = lock(&self.prompt_lock);
        if state.mode() == ConfirmMode::AutoAll {
            return Decision::Confirmed;
        }

        before_prompt();
        match self.prompter.ask(question) {
            Ok(Some(answer)) => match parse_response(&answer) {
                Some(Response::Yes) => Decision::Confirmed,
                Some(Response::All) => {
                    if state.escalate() {
                        log::info!("Confirmation mode raised to auto-all");
                    }
                    Decision::Confirmed
                }
                Some(Response::No) => Decision::Declined,
                None => {
                    log::warn!("Unrecognised answer {:?}; skipping set", answer.trim());
                    Decision::Unanswered(format!("unrecognised answer {:?}", answer.trim()))
                }
            },
            Ok(None) => {
                log::warn!("No more input on the prompt stream; skipping set");
                Decision::Unanswered("end of input".to_string())
            }
            Err(e) => {
                log::warn!("Prompt failed: {}; skipping set", e);
                Decision::Unanswered(e.to_string())
            }
        }
    }
}
