//! Interactive chat loop.
//!
//! Typed lines collect in the composer; an empty line or `/send` submits
//! them. Slash commands cover import, export and saving. Nothing is ever
//! submitted without one of those: input left over at end of input is
//! dropped, and a failed submission is only resent by `/retry`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use distress_core::import::UploadedFile;
use distress_core::models::message::{Message, Sender};
use distress_core::service::{ChatService, DocumentImporter, StructuredGenerator};
use distress_export::render::render_report;
use distress_session::{Composer, Orchestrator, SessionError, Turn};

use crate::report::{self, ExportFormat};

pub const HELP: &str = "\
Type or paste text, then press Enter on an empty line (or /send) to submit it.
The first submission is analyzed as a transcript; later ones are questions about the analysis.

Commands:
  /send                      submit the pending input
  /retry                     resend the last submission that failed
  /import <file.docx>        append the text of a Word document to the pending input
  /analysis                  show the analysis report
  /export <pdf|docx|md> <path>  write the analysis report
  /save <path>               save the conversation (resume with --resume)
  /clear                     discard the pending input
  /help                      show this help
  /quit                      leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send,
    Retry,
    Import(PathBuf),
    Analysis,
    Export { format: ExportFormat, path: PathBuf },
    Save(PathBuf),
    Clear,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Blank,
    Command(Command),
}

/// Classify one line of user input. Lines starting with `/` are commands;
/// an unknown command is an error rather than text.
pub fn parse_line(line: &str) -> Result<Input, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Blank);
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(Input::Text(line.trim_end().to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let path_arg = |usage: &str| {
        if rest.is_empty() {
            Err(format!("usage: {usage}"))
        } else {
            Ok(PathBuf::from(rest))
        }
    };

    let command = match name {
        "send" => Command::Send,
        "retry" => Command::Retry,
        "import" => Command::Import(path_arg("/import <file.docx>")?),
        "analysis" => Command::Analysis,
        "export" => {
            let usage = "usage: /export <pdf|docx|md> <path>";
            let (format, path) = rest.split_once(char::is_whitespace).ok_or(usage)?;
            let path = path.trim();
            if path.is_empty() {
                return Err(usage.to_string());
            }
            Command::Export {
                format: format.parse()?,
                path: PathBuf::from(path),
            }
        }
        "save" => Command::Save(path_arg("/save <path>")?),
        "clear" => Command::Clear,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command /{other} (try /help)")),
    };
    Ok(Input::Command(command))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Repl<G, C, I> {
    orchestrator: Orchestrator<G, C>,
    importer: I,
    composer: Composer,
    /// Text of the last submission that failed, kept for `/retry`.
    failed: Option<String>,
}

impl<G, C, I> Repl<G, C, I>
where
    G: StructuredGenerator,
    C: ChatService,
    I: DocumentImporter,
{
    pub fn new(orchestrator: Orchestrator<G, C>, importer: I) -> Self {
        Self {
            orchestrator,
            importer,
            composer: Composer::new(),
            failed: None,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<G, C> {
        &self.orchestrator
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Print the conversation so far, then read commands until `/quit` or
    /// end of input. Input still pending at end of input is not sent.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> eyre::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        for message in self.orchestrator.messages() {
            print_message(out, message)?;
        }
        writeln!(out, "(type /help for commands)")?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let flow = match parse_line(&line) {
                Ok(input) => self.handle(input, out).await?,
                Err(message) => {
                    writeln!(out, "{message}")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                return Ok(());
            }
        }

        if !self.composer.is_empty() {
            writeln!(out, "Unsent input discarded.")?;
        }
        Ok(())
    }

    async fn handle<W: Write>(&mut self, input: Input, out: &mut W) -> eyre::Result<Flow> {
        match input {
            Input::Text(text) => self.composer.push_line(&text),
            Input::Blank => {
                if !self.composer.is_empty() {
                    let text = self.composer.take();
                    self.submit(text, out).await?;
                }
            }
            Input::Command(command) => return self.command(command, out).await,
        }
        Ok(Flow::Continue)
    }

    async fn command<W: Write>(&mut self, command: Command, out: &mut W) -> eyre::Result<Flow> {
        match command {
            Command::Send => {
                if self.composer.is_empty() {
                    writeln!(out, "Nothing to send.")?;
                } else {
                    let text = self.composer.take();
                    self.submit(text, out).await?;
                }
            }
            Command::Retry => match self.failed.take() {
                Some(text) => self.submit(text, out).await?,
                None => writeln!(out, "Nothing to retry.")?,
            },
            Command::Import(path) => self.import(&path, out).await?,
            Command::Analysis => match self.orchestrator.analysis() {
                Some(analysis) => print_report(out, analysis)?,
                None => writeln!(out, "No analysis yet: send a transcript first.")?,
            },
            Command::Export { format, path } => match self.orchestrator.analysis() {
                Some(analysis) => match report::write(analysis, format, &path) {
                    Ok(()) => writeln!(out, "Saved {format} report to {}.", path.display())?,
                    Err(e) => writeln!(out, "Export failed: {e}")?,
                },
                None => writeln!(out, "Nothing to export yet: send a transcript first.")?,
            },
            Command::Save(path) => match self.orchestrator.record().save(&path) {
                Ok(()) => writeln!(out, "Conversation saved to {}.", path.display())?,
                Err(e) => writeln!(out, "Save failed: {e}")?,
            },
            Command::Clear => {
                self.composer.take();
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn import<W: Write>(&mut self, path: &Path, out: &mut W) -> eyre::Result<()> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                writeln!(out, "Could not read {}: {e}", path.display())?;
                return Ok(());
            }
        };
        let file = UploadedFile::from_path_bytes(file_name(path), bytes);
        match self.composer.import(&self.importer, &file).await {
            Ok(chars) => writeln!(
                out,
                "Imported {chars} characters from {}. Review, then send with an empty line or /send.",
                file.filename
            )?,
            Err(e) => writeln!(out, "Import failed: {e}")?,
        }
        Ok(())
    }

    async fn submit<W: Write>(&mut self, text: String, out: &mut W) -> eyre::Result<()> {
        let outcome = self.orchestrator.submit(&text).await;

        match outcome {
            Err(SessionError::EmptyInput) => return Ok(()),
            Err(_) => self.failed = Some(text),
            Ok(_) => self.failed = None,
        }
        if let Some(message) = self.orchestrator.messages().last() {
            print_message(out, message)?;
        }
        if self.failed.is_some() {
            writeln!(out, "Type /retry to send it again.")?;
        }
        if let Ok(Turn::Analyzed) = outcome
            && let Some(analysis) = self.orchestrator.analysis()
        {
            print_report(out, analysis)?;
        }
        Ok(())
    }
}

fn print_message<W: Write>(out: &mut W, message: &Message) -> eyre::Result<()> {
    let prefix = match message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    writeln!(out, "{prefix}> {}", message.text)?;
    Ok(())
}

fn print_report<W: Write>(
    out: &mut W,
    analysis: &distress_core::models::analysis::AnalysisResult,
) -> eyre::Result<()> {
    match render_report(analysis, &report::today()) {
        Ok(markdown) => writeln!(out, "\n{}\n", markdown.trim_end())?,
        Err(e) => writeln!(out, "Could not render the report: {e}")?,
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a transcript from a file or, for `-`, from stdin. Word documents go
/// through the same validation and extraction as `/import`; anything else
/// must be UTF-8 text.
pub async fn read_transcript<I>(importer: &I, path: &Path) -> eyre::Result<String>
where
    I: DocumentImporter + ?Sized,
{
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
    let is_docx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));

    if is_docx {
        let file = UploadedFile::from_path_bytes(file_name(path), bytes);
        let mut composer = Composer::new();
        composer.import(importer, &file).await?;
        return Ok(composer.take());
    }

    String::from_utf8(bytes).map_err(|_| {
        eyre::eyre!(
            "{} is not UTF-8 text; only plain text and .docx transcripts are supported",
            path.display()
        )
    })
}
