//! Query pipeline: title relevance filter, sample bounding, content synthesis.
//!
//! A query runs to completion on the calling thread. Progress is reported to a
//! [`ProgressObserver`]; the final outcome is returned to the caller.

pub mod progress;
pub mod relevance;
pub mod sampling;
pub mod synthesis;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use self::progress::{ProgressObserver, Stage};
use self::relevance::find_relevant_bookmarks;
use self::sampling::bound_selection;
use self::synthesis::{FetchSettings, synthesize};
use crate::ScoutError;
use crate::bookmarks::{BookmarkList, load_bookmark_file};
use crate::config::{Config, PipelineConfig};
use crate::fetcher::{PageSource, PageTextFetcher};
use crate::llm::{CompletionService, OllamaClient};

/// Cooperative cancellation flag shared between a query and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(ScoutError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The model's final answer and how it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Raw reply from the synthesis call
    pub text: String,
    /// Bookmarks whose titles looked relevant
    pub relevant_count: usize,
    /// Bookmarks whose pages were read
    pub read_count: usize,
}

impl Recommendation {
    #[inline]
    pub fn was_sampled(&self) -> bool {
        self.read_count < self.relevant_count
    }
}

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Empty question or no bookmarks loaded; no service was called
    NothingToSearch,
    /// The relevance filter selected nothing
    NoRelevantBookmarks,
    Recommendation(Recommendation),
}

impl QueryOutcome {
    /// The recommendation text, if any
    #[inline]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Recommendation(recommendation) => Some(&recommendation.text),
            Self::NothingToSearch | Self::NoRelevantBookmarks => None,
        }
    }
}

/// Drives the filter, bound and synthesis stages against explicit collaborators
pub struct Orchestrator<C, S> {
    service: C,
    pages: S,
    sample_cap: usize,
    fetch_settings: FetchSettings,
    rng: StdRng,
}

impl Orchestrator<OllamaClient, PageTextFetcher> {
    /// Build an orchestrator backed by Ollama and live page fetches
    #[inline]
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let service =
            OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?;
        let pages = PageTextFetcher::new(&config.pipeline);
        Ok(Self::new(service, pages, &config.pipeline))
    }
}

impl<C, S> Orchestrator<C, S>
where
    C: CompletionService,
    S: PageSource,
{
    #[inline]
    pub fn new(service: C, pages: S, pipeline: &PipelineConfig) -> Self {
        Self {
            service,
            pages,
            sample_cap: pipeline.sample_cap,
            fetch_settings: FetchSettings {
                excerpt_chars: pipeline.excerpt_chars,
                delay: pipeline.fetch_delay(),
            },
            rng: StdRng::from_entropy(),
        }
    }

    /// Make sampling reproducible
    #[inline]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[inline]
    pub fn service(&self) -> &C {
        &self.service
    }

    #[inline]
    pub fn pages(&self) -> &S {
        &self.pages
    }

    /// Answer one question against a bookmark list.
    ///
    /// Language model failures end the query with an error. Unreachable pages
    /// and unusable relevance replies degrade instead.
    #[inline]
    pub fn run_query<O>(
        &mut self,
        question: &str,
        bookmarks: &BookmarkList,
        observer: &mut O,
        cancel: &CancelToken,
    ) -> crate::Result<QueryOutcome>
    where
        O: ProgressObserver + ?Sized,
    {
        let question = question.trim();
        if question.is_empty() || bookmarks.is_empty() {
            info!(
                "Nothing to search (question empty: {}, bookmarks: {})",
                question.is_empty(),
                bookmarks.len()
            );
            observer.result(None);
            return Ok(QueryOutcome::NothingToSearch);
        }

        cancel.check()?;
        observer.stage_started(Stage::Relevance);
        let relevant = find_relevant_bookmarks(&self.service, question, bookmarks)?;
        observer.stage_finished(Stage::Relevance);

        if relevant.is_empty() {
            info!("No relevant bookmarks for {:?}", question);
            observer.result(None);
            return Ok(QueryOutcome::NoRelevantBookmarks);
        }

        cancel.check()?;
        let selection = bound_selection(relevant, self.sample_cap, &mut self.rng);
        observer.relevant_found(selection.original_count, selection.bookmarks.len());

        let text = synthesize(
            &self.service,
            &self.pages,
            question,
            &selection,
            self.fetch_settings,
            observer,
            cancel,
        )?;

        observer.result(Some(&text));
        Ok(QueryOutcome::Recommendation(Recommendation {
            text,
            relevant_count: selection.original_count,
            read_count: selection.bookmarks.len(),
        }))
    }
}

/// One user's loaded bookmarks plus the orchestrator that answers questions.
///
/// `ask` borrows the session mutably, so only one query runs at a time.
pub struct BookmarkSession<C, S> {
    orchestrator: Orchestrator<C, S>,
    bookmarks: BookmarkList,
}

impl<C, S> BookmarkSession<C, S>
where
    C: CompletionService,
    S: PageSource,
{
    #[inline]
    pub fn new(orchestrator: Orchestrator<C, S>) -> Self {
        Self {
            orchestrator,
            bookmarks: BookmarkList::default(),
        }
    }

    /// Replace the loaded bookmarks wholesale
    #[inline]
    pub fn load(&mut self, bookmarks: BookmarkList) {
        if bookmarks.is_empty() {
            warn!("Loaded bookmark list is empty; questions will have nothing to search");
        }
        self.bookmarks = bookmarks;
    }

    /// Parse a bookmark export from disk and load it
    #[inline]
    pub fn load_file(&mut self, path: &Path) -> crate::Result<usize> {
        let bookmarks = load_bookmark_file(path)?;
        let count = bookmarks.len();
        self.load(bookmarks);
        Ok(count)
    }

    #[inline]
    pub fn bookmarks(&self) -> &BookmarkList {
        &self.bookmarks
    }

    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator<C, S> {
        &self.orchestrator
    }

    #[inline]
    pub fn ask<O>(&mut self, question: &str, observer: &mut O) -> crate::Result<QueryOutcome>
    where
        O: ProgressObserver + ?Sized,
    {
        self.ask_with_cancel(question, observer, &CancelToken::new())
    }

    #[inline]
    pub fn ask_with_cancel<O>(
        &mut self,
        question: &str,
        observer: &mut O,
        cancel: &CancelToken,
    ) -> crate::Result<QueryOutcome>
    where
        O: ProgressObserver + ?Sized,
    {
        self.orchestrator
            .run_query(question, &self.bookmarks, observer, cancel)
    }
}
