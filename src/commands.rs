
use std::path::Path;

use anyhow::Context;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::bookmarks::{Bookmark, load_bookmark_file};
use crate::config::Config;
use crate::fetcher::PageTextFetcher;
use crate::llm::OllamaClient;
use crate::pipeline::progress::{ProgressObserver, Stage};
use crate::pipeline::{BookmarkSession, Orchestrator, QueryOutcome};
use crate::{Result, ScoutError};

/// Terminal progress reporting: stage notices on stderr, a bar while fetching
pub struct ConsoleObserver {
    bar: ProgressBar,
    expected_pages: u64,
    attended: bool,
}

impl ConsoleObserver {
    #[inline]
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            expected_pages: 0,
            attended: console::user_attended_stderr(),
        }
    }

    fn notice(&self, message: &str) {
        if self.bar.is_hidden() {
            eprintln!("{}", message);
        } else {
            self.bar.println(message);
        }
    }
}

impl Default for ConsoleObserver {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleObserver {
    fn stage_started(&mut self, stage: Stage) {
        match stage {
            Stage::Relevance => eprintln!("🔍 Searching bookmark titles for relevant pages..."),
            Stage::Fetch => {
                eprintln!("📑 Collecting bookmark contents...");
                self.bar = if self.attended {
                    ProgressBar::new(self.expected_pages).with_style(
                        ProgressStyle::with_template("{bar:30} [{pos}/{len}] {msg}")
                            .expect("style template is valid"),
                    )
                } else {
                    ProgressBar::hidden()
                };
            }
            Stage::Synthesis => eprintln!("🤖 Analyzing bookmark contents..."),
        }
    }

    fn stage_finished(&mut self, stage: Stage) {
        if stage == Stage::Fetch {
            self.bar.finish_and_clear();
            self.bar = ProgressBar::hidden();
        }
    }

    fn relevant_found(&mut self, count: usize, kept: usize) {
        let message = format!("✅ Found {} relevant bookmarks", count);
        eprintln!("{}", style(message).green());
        if kept < count {
            eprintln!(
                "{}",
                style(format!("   Reading a random sample of {}", kept)).yellow()
            );
        }
        self.expected_pages = kept as u64;
    }

    fn fetching(&mut self, bookmark: &Bookmark) {
        let label = if bookmark.title.is_empty() {
            bookmark.url.clone()
        } else {
            bookmark.title.clone()
        };
        self.bar.set_message(format!("🌐 {}", label));
    }

    fn fetch_failed(&mut self, url: &str) {
        let message = format!("⚠️  Could not read {}", url);
        self.notice(&style(message).yellow().to_string());
    }

    fn progress(&mut self, fraction: f32) {
        let position = (fraction.clamp(0.0, 1.0) * self.expected_pages as f32).round() as u64;
        self.bar.set_position(position);
    }
}

/// Report how many bookmarks a file contains
#[inline]
pub fn count_bookmarks(path: &Path) -> Result<()> {
    let bookmarks = load_bookmark_file(path)?;
    println!(
        "✅ {} bookmarks found in {}",
        bookmarks.len(),
        path.display()
    );
    Ok(())
}

/// Print every extracted bookmark with its 1-based position
#[inline]
pub fn list_bookmarks(path: &Path) -> Result<()> {
    let bookmarks = load_bookmark_file(path)?;

    if bookmarks.is_empty() {
        println!("No bookmarks found in {}", path.display());
        return Ok(());
    }

    println!("Bookmarks ({} total):", bookmarks.len());
    for (index, bookmark) in bookmarks.iter().enumerate() {
        println!("{:>5}. {}", index + 1, bookmark.title);
        println!("       {}", style(&bookmark.url).dim());
    }

    Ok(())
}

/// Answer a single question; returns whether a query completed without failure
#[inline]
pub fn ask_question(config: &Config, path: &Path, question: &str) -> Result<bool> {
    let mut session = open_session(config, path)?;
    if session.bookmarks().is_empty() {
        return Ok(true);
    }

    Ok(run_and_present(&mut session, question))
}

/// Load bookmarks once and answer questions until an empty line
#[inline]
pub fn chat(config: &Config, path: &Path) -> Result<()> {
    let mut session = open_session(config, path)?;
    if session.bookmarks().is_empty() {
        return Ok(());
    }

    loop {
        let question: String = Input::new()
            .with_prompt("💬 What are you looking for? (empty line to quit)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question")?;

        if question.trim().is_empty() {
            break;
        }

        run_and_present(&mut session, &question);
        println!();
    }

    Ok(())
}

/// List models available on the configured Ollama server
#[inline]
pub fn list_models(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?;
    let models = client
        .list_models()
        .map_err(|e| ScoutError::Network(format!("{:#}", e)))?;

    if models.is_empty() {
        println!("No models installed. Run: ollama pull <model>");
        return Ok(());
    }

    for model in &models {
        let marker = if model.name == client.model() {
            " (configured)"
        } else {
            ""
        };
        let size = model
            .details
            .as_ref()
            .and_then(|details| details.parameter_size.as_deref())
            .unwrap_or("-");
        println!("{} [{}]{}", model.name, size, marker);
    }

    Ok(())
}

fn open_session(
    config: &Config,
    path: &Path,
) -> Result<BookmarkSession<OllamaClient, PageTextFetcher>> {
    let orchestrator = Orchestrator::from_config(config)?;
    let mut session = BookmarkSession::new(orchestrator);

    let count = session.load_file(path)?;
    if count == 0 {
        eprintln!(
            "{}",
            style("No bookmarks found in the file; nothing to search.").yellow()
        );
    } else {
        eprintln!(
            "{}",
            style(format!("✅ Loaded {} bookmarks", count)).green()
        );
    }

    Ok(session)
}

fn run_and_present(
    session: &mut BookmarkSession<OllamaClient, PageTextFetcher>,
    question: &str,
) -> bool {
    let mut observer = ConsoleObserver::new();

    match session.ask(question, &mut observer) {
        Ok(outcome) => {
            present_outcome(&outcome);
            true
        }
        Err(e) => {
            error!("Query failed: {:#}", e);
            eprintln!(
                "{}",
                style("❌ The search failed. Check that Ollama is running and try again.").red()
            );
            false
        }
    }
}

fn present_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::NothingToSearch => {
            eprintln!("{}", style("Nothing to search.").yellow());
        }
        QueryOutcome::NoRelevantBookmarks => {
            eprintln!(
                "{}",
                style("❌ No bookmarks related to the question were found.").yellow()
            );
        }
        QueryOutcome::Recommendation(recommendation) => {
            info!(
                "Recommendation built from {} of {} relevant bookmarks",
                recommendation.read_count, recommendation.relevant_count
            );
            eprintln!();
            eprintln!("{}", style("📎 Results").bold().cyan());
            println!("{}", recommendation.text);
        }
    }
}
