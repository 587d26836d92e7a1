
use std::time::Duration;

use tracing::{debug, info};

use super::CancelToken;
use super::progress::{ProgressObserver, Stage};
use super::sampling::BoundedSelection;
use crate::ScoutError;
use crate::bookmarks::Bookmark;
use crate::fetcher::{PageSource, fetch_or_empty};
use crate::llm::CompletionService;

/// Default characters of page text kept per bookmark
pub const DEFAULT_EXCERPT_CHARS: usize = 1000;

/// Truncated page text attributed to its bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExcerpt {
    pub bookmark: Bookmark,
    /// At most the configured number of characters, possibly empty
    pub text: String,
}

impl PageExcerpt {
    #[inline]
    pub fn new(bookmark: Bookmark, text: &str, max_chars: usize) -> Self {
        Self {
            bookmark,
            text: truncate_chars(text, max_chars),
        }
    }

    /// `[title](url): text`
    #[inline]
    pub fn to_line(&self) -> String {
        let Bookmark { title, url } = &self.bookmark;
        format!("[{}]({}): {}", title, url, self.text)
    }
}

/// Keep at most `max_chars` characters, never splitting a character
#[inline]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// How page collection is paced and trimmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub excerpt_chars: usize,
    pub delay: Duration,
}

impl Default for FetchSettings {
    #[inline]
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            delay: Duration::ZERO,
        }
    }
}

/// Fetch every bookmark in order and keep a truncated excerpt of each.
///
/// Unreachable pages contribute an empty excerpt. The cancel token is checked
/// before each fetch.
#[inline]
pub fn collect_excerpts<S, O>(
    source: &S,
    bookmarks: &[Bookmark],
    settings: FetchSettings,
    observer: &mut O,
    cancel: &CancelToken,
) -> crate::Result<Vec<PageExcerpt>>
where
    S: PageSource + ?Sized,
    O: ProgressObserver + ?Sized,
{
    let total = bookmarks.len();
    let mut excerpts = Vec::with_capacity(total);

    for (position, bookmark) in bookmarks.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Cancelled after fetching {} of {} pages", position, total);
            return Err(ScoutError::Cancelled);
        }

        if position > 0 && !settings.delay.is_zero() {
            std::thread::sleep(settings.delay);
        }

        observer.fetching(bookmark);
        let text = fetch_or_empty(source, &bookmark.url, observer);
        debug!("Fetched {} chars from {}", text.len(), bookmark.url);

        excerpts.push(PageExcerpt::new(bookmark.clone(), &text, settings.excerpt_chars));

        let fraction = (position + 1) as f32 / total as f32;
        observer.progress(fraction);
    }

    Ok(excerpts)
}

/// Build the recommendation prompt from collected excerpts
#[inline]
pub fn build_synthesis_prompt(
    question: &str,
    excerpts: &[PageExcerpt],
    selection: &BoundedSelection,
) -> String {
    let mut prompt = format!(
        "User question: \"{question}\"\n\n\
         Below is text collected from the user's bookmarked web pages, one bookmark per line \
         in the form [title](url): content.\n\
         Recommend the URLs most relevant to the question, each with a short explanation of \
         why it helps.\n"
    );

    if selection.was_sampled() {
        prompt.push_str(&sampling_note(selection.bookmarks.len(), selection.original_count));
        prompt.push('\n');
    }

    prompt.push('\n');
    for excerpt in excerpts {
        prompt.push_str(&excerpt.to_line());
        prompt.push('\n');
    }

    prompt
}

/// Disclosure that only a random subset of the relevant bookmarks was read
#[inline]
pub fn sampling_note(kept: usize, original: usize) -> String {
    format!(
        "Note: {original} bookmarks looked relevant, but only a random sample of {kept} of them \
         was read. Tell the user that these recommendations come from a random subset of a \
         larger set of relevant bookmarks."
    )
}

/// Fetch the selected pages and ask the model for a final recommendation.
///
/// Reports the fetch and synthesis stage boundaries. Returns the model's reply
/// unmodified; service failures propagate.
#[inline]
pub fn synthesize<C, S, O>(
    service: &C,
    source: &S,
    question: &str,
    selection: &BoundedSelection,
    settings: FetchSettings,
    observer: &mut O,
    cancel: &CancelToken,
) -> crate::Result<String>
where
    C: CompletionService + ?Sized,
    S: PageSource + ?Sized,
    O: ProgressObserver + ?Sized,
{
    observer.stage_started(Stage::Fetch);
    let excerpts = collect_excerpts(source, &selection.bookmarks, settings, observer, cancel)?;
    observer.stage_finished(Stage::Fetch);

    if cancel.is_cancelled() {
        return Err(ScoutError::Cancelled);
    }

    observer.stage_started(Stage::Synthesis);
    let prompt = build_synthesis_prompt(question, &excerpts, selection);
    debug!("Synthesis prompt is {} chars", prompt.len());

    let recommendation = service.complete(&prompt)?;
    observer.stage_finished(Stage::Synthesis);

    Ok(recommendation)
}
