// UI layer: the console prompts and the transfer menu loop.
// `Prompter` hides where answers come from, so the same flow runs on an
// interactive terminal (dialoguer), on piped stdin, or from a test script.

use crate::config::StorageAccount;
use crate::error::{Result, TransferError};
use crate::progress::ProgressReporter;
use crate::storage::{BlobDirectoryRef, BlobRef, BlobStore, TransferContext, TransferOptions};
use crate::transfer::{self, TransferRequest};
use dialoguer::{Input, Password};
use reqwest::Url;
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

pub const ACCOUNT_NAME_PROMPT: &str = "Enter Storage account name:";
pub const ACCOUNT_KEY_PROMPT: &str = "Enter Storage account key:";
pub const MENU: &str = "What type of transfer would you like to execute?\n\
                        1. Local file --> Azure Blob\n\
                        2. Local directory --> Azure Blob directory\n\
                        3. URL (e.g. Amazon S3 file) --> Azure Blob\n\
                        4. Azure Blob --> Azure Blob\n\
                        q. Quit";
pub const PARALLELISM_PROMPT: &str = "How many parallel operations would you like to use?";
pub const SOURCE_PROMPT: &str = "Provide path for source:";
pub const CONTAINER_PROMPT: &str = "Provide name of Blob container:";
pub const DIRECTORY_CONTAINER_PROMPT: &str =
    "Provide name of Blob container. This can be a new or existing Blob container:";
pub const BLOB_PROMPT: &str = "Provide name of new Blob:";

/// Where prompt answers come from and where messages go.
///
/// `ask` returns `Ok(None)` once input is exhausted (Ctrl-D, closed pipe),
/// which the menu loop treats as a request to stop.
pub trait Prompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Like `ask`, but terminals should not echo the answer.
    fn ask_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.ask(prompt)
    }

    fn say(&mut self, line: &str) -> Result<()>;
}

/// Line-oriented prompter over any reader and writer. Used when stdin is
/// not a terminal and to script the flows in tests.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompter { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        LinePrompter::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        if !prompt.is_empty() {
            writeln!(self.output, "\n{prompt}")?;
            self.output.flush()?;
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()?;
        Ok(())
    }
}

/// Interactive terminal prompter built on `dialoguer`. The account key is
/// read with `Password` so it is not echoed.
#[derive(Default)]
pub struct TermPrompter;

impl TermPrompter {
    pub fn new() -> Self {
        TermPrompter
    }
}

impl Prompter for TermPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut input = Input::<String>::new();
        if !prompt.is_empty() {
            input.with_prompt(prompt.trim_end_matches(':'));
        }
        end_of_input(input.allow_empty(true).interact_text())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        let answer = Password::new()
            .with_prompt(prompt.trim_end_matches(':'))
            .allow_empty_password(true)
            .interact();
        end_of_input(answer)
    }

    fn say(&mut self, line: &str) -> Result<()> {
        println!("{line}");
        Ok(())
    }
}

/// Ctrl-D on a terminal surfaces as an EOF error; treat it as end of input.
fn end_of_input(answer: io::Result<String>) -> Result<Option<String>> {
    match answer {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse a trimmed answer as an integer of type `T`.
pub fn parse_number<T: FromStr>(text: &str) -> Result<T> {
    let text = text.trim();
    text.parse::<T>()
        .map_err(|_| TransferError::Input(format!("`{text}` is not a number")))
}

/// Prompt for the parallel operation count. An empty answer keeps the
/// default, zero is rejected.
pub fn ask_parallelism<P: Prompter + ?Sized>(prompter: &mut P) -> Result<Option<TransferOptions>> {
    let Some(text) = prompter.ask(PARALLELISM_PROMPT)? else {
        return Ok(None);
    };
    if text.trim().is_empty() {
        return Ok(Some(TransferOptions::default()));
    }
    let count = NonZeroUsize::new(parse_number(&text)?)
        .ok_or_else(|| TransferError::Input("parallel operations must be at least 1".into()))?;
    Ok(Some(TransferOptions::new(count)))
}

/// Ask for the account name and key and parse them into an account.
/// Returns `Ok(None)` if input ends before both are given.
pub fn collect_account<P: Prompter + ?Sized>(prompter: &mut P) -> Result<Option<StorageAccount>> {
    let Some(name) = prompter.ask(ACCOUNT_NAME_PROMPT)? else {
        return Ok(None);
    };
    let Some(key) = prompter.ask_secret(ACCOUNT_KEY_PROMPT)? else {
        return Ok(None);
    };
    StorageAccount::from_credentials(&name, &key).map(Some)
}

/// The four menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    LocalFile,
    LocalDirectory,
    Url,
    BlobToBlob,
}

impl Scenario {
    pub fn from_choice(choice: i64) -> Option<Self> {
        match choice {
            1 => Some(Scenario::LocalFile),
            2 => Some(Scenario::LocalDirectory),
            3 => Some(Scenario::Url),
            4 => Some(Scenario::BlobToBlob),
            _ => None,
        }
    }
}

/// What the menu loop should do after one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Result of one prompt step inside a scenario.
enum Step<T> {
    Ready(T),
    /// A problem was already reported; go back to the menu.
    Skipped,
    EndOfInput,
}

/// Unwrap a `Step`, returning early from the scenario otherwise.
macro_rules! ready {
    ($step:expr) => {
        match $step {
            Step::Ready(value) => value,
            Step::Skipped => return Ok(Step::Skipped),
            Step::EndOfInput => return Ok(Step::EndOfInput),
        }
    };
}

/// One console session against one storage account.
pub struct Session<P, S, R> {
    prompter: P,
    store: S,
    reporter: R,
}

impl<P: Prompter, S: BlobStore, R: ProgressReporter> Session<P, S, R> {
    pub fn new(prompter: P, store: S, reporter: R) -> Self {
        Session {
            prompter,
            store,
            reporter,
        }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run menu passes until input ends or the user quits.
    pub fn run(&mut self) -> Result<()> {
        while self.run_once()? == LoopControl::Continue {}
        Ok(())
    }

    /// One pass of the menu. Bad answers and failed transfers are reported
    /// and yield `Continue`; only prompt I/O failures are returned as errors.
    pub fn run_once(&mut self) -> Result<LoopControl> {
        match self.pass() {
            Err(TransferError::Input(msg)) => {
                debug!(%msg, "rejected input");
                self.prompter.say(&format!("Invalid input: {msg}"))?;
                Ok(LoopControl::Continue)
            }
            other => other,
        }
    }

    fn pass(&mut self) -> Result<LoopControl> {
        self.prompter.say(&format!("\n{MENU}"))?;
        // The menu is the prompt.
        let Some(answer) = self.prompter.ask("")? else {
            return Ok(LoopControl::Stop);
        };
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "q" | "quit" | "exit") {
            return Ok(LoopControl::Stop);
        }
        let choice: i64 = parse_number(&answer)?;

        let Some(options) = ask_parallelism(&mut self.prompter)? else {
            return Ok(LoopControl::Stop);
        };

        let Some(scenario) = Scenario::from_choice(choice) else {
            debug!(choice, "ignoring unknown menu choice");
            return Ok(LoopControl::Continue);
        };

        let request = match self.gather(scenario)? {
            Step::Ready(request) => request,
            Step::Skipped => return Ok(LoopControl::Continue),
            Step::EndOfInput => return Ok(LoopControl::Stop),
        };

        self.prompter.say("\nTransfer started...\n")?;
        let context = TransferContext::with_progress(self.reporter.handler());
        let result = transfer::execute(&self.store, &request, &options, &context);
        self.reporter.finish();

        match result {
            Ok(outcome) => self.prompter.say(&format!(
                "\nTransfer operation completed in {:.3} seconds.",
                outcome.seconds()
            ))?,
            Err(e) => {
                warn!(kind = request.kind(), error = %e, "transfer failed");
                self.prompter.say(&format!("\nTransfer failed: {e}"))?;
            }
        }
        Ok(LoopControl::Continue)
    }

    fn gather(&mut self, scenario: Scenario) -> Result<Step<TransferRequest>> {
        let request = match scenario {
            Scenario::LocalFile => {
                let source = ready!(self.answer(SOURCE_PROMPT)?);
                let destination = ready!(self.resolve_blob()?);
                TransferRequest::File {
                    source: PathBuf::from(source),
                    destination,
                }
            }
            Scenario::LocalDirectory => {
                let source = ready!(self.answer(SOURCE_PROMPT)?);
                let destination = ready!(self.resolve_directory()?);
                TransferRequest::Directory {
                    source: PathBuf::from(source),
                    destination,
                    recursive: true,
                }
            }
            Scenario::Url => {
                let source = ready!(self.answer(SOURCE_PROMPT)?);
                let source = Url::parse(&source)
                    .map_err(|e| TransferError::Input(format!("`{source}` is not a URL: {e}")))?;
                let destination = ready!(self.resolve_blob()?);
                TransferRequest::Url {
                    source,
                    destination,
                    overwrite: true,
                }
            }
            Scenario::BlobToBlob => {
                let source = ready!(self.resolve_blob()?);
                let destination = ready!(self.resolve_blob()?);
                TransferRequest::Blob {
                    source,
                    destination,
                    overwrite: true,
                }
            }
        };
        Ok(Step::Ready(request))
    }

    fn answer(&mut self, prompt: &str) -> Result<Step<String>> {
        Ok(match self.prompter.ask(prompt)? {
            Some(text) => Step::Ready(text.trim().to_string()),
            None => Step::EndOfInput,
        })
    }

    /// Ask for a container (creating it if needed) and a blob name.
    fn resolve_blob(&mut self) -> Result<Step<BlobRef>> {
        let container = ready!(self.answer(CONTAINER_PROMPT)?);
        let container = match self.store.ensure_container(&container) {
            Ok(container) => container,
            Err(e) => return self.report_resolution(e),
        };
        let name = ready!(self.answer(BLOB_PROMPT)?);
        Ok(Step::Ready(container.blob(&name)))
    }

    /// Ask for a container (creating it if needed); blobs land at its root.
    fn resolve_directory(&mut self) -> Result<Step<BlobDirectoryRef>> {
        let container = ready!(self.answer(DIRECTORY_CONTAINER_PROMPT)?);
        match self.store.ensure_container(&container) {
            Ok(container) => Ok(Step::Ready(container.directory(""))),
            Err(e) => self.report_resolution(e),
        }
    }

    fn report_resolution<T>(&mut self, e: TransferError) -> Result<Step<T>> {
        warn!(error = %e, "container resolution failed");
        self.prompter.say(&format!("\n{e}"))?;
        Ok(Step::Skipped)
    }
}
