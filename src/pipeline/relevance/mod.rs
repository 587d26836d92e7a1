
use std::collections::HashSet;

use itertools::Itertools;
use tracing::{debug, info};

use crate::bookmarks::{Bookmark, BookmarkList};
use crate::llm::CompletionService;

/// Literal answer the model gives when no title is relevant
pub const NONE_SENTINEL: &str = "none";

/// Build the title-only relevance prompt with a 1-based enumerated title list
#[inline]
pub fn build_relevance_prompt(question: &str, bookmarks: &BookmarkList) -> String {
    let titles = bookmarks
        .iter()
        .enumerate()
        .map(|(index, bookmark)| {
            let title = if bookmark.title.is_empty() {
                "(untitled)"
            } else {
                bookmark.title.as_str()
            };
            format!("{}. {}", index + 1, title)
        })
        .join("\n");

    format!(
        "User question: \"{question}\"\n\n\
         Below is a numbered list of bookmark titles. Reply with only the numbers of the \
         bookmarks whose titles look relevant to the question, separated by commas.\n\
         If no bookmark is relevant, reply with only \"{NONE_SENTINEL}\".\n\
         Example replies: \"1, 3, 5\" or \"{NONE_SENTINEL}\"\n\n\
         Bookmarks:\n{titles}\n"
    )
}

fn is_wrapping_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.')
}

/// Parse a free-text relevance reply into distinct valid 1-based indices.
///
/// Returns indices in the order the model gave them. Tokens that are not
/// integers or fall outside `1..=bookmark_count` are dropped; a reply equal to
/// the sentinel, or one with nothing usable, gives an empty selection.
#[inline]
pub fn parse_relevance_response(response: &str, bookmark_count: usize) -> Vec<usize> {
    let reply = response.trim_matches(is_wrapping_noise);
    if reply.to_lowercase() == NONE_SENTINEL {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut indices = Vec::new();

    for token in reply.split(',') {
        let token = token.trim_matches(is_wrapping_noise);
        let Ok(index) = token.parse::<usize>() else {
            debug!("Dropping non-numeric relevance token {:?}", token);
            continue;
        };
        if !(1..=bookmark_count).contains(&index) {
            debug!("Dropping out-of-range relevance index {}", index);
            continue;
        }
        if seen.insert(index) {
            indices.push(index);
        }
    }

    indices
}

/// Materialize parsed indices as bookmarks, preserving the model's order
#[inline]
pub fn select_relevant(response: &str, bookmarks: &BookmarkList) -> Vec<Bookmark> {
    parse_relevance_response(response, bookmarks.len())
        .into_iter()
        .filter_map(|index| bookmarks.get(index).cloned())
        .collect()
}

/// Ask the model which bookmark titles look relevant to the question.
///
/// Completion service failures propagate; unusable replies yield an empty selection.
#[inline]
pub fn find_relevant_bookmarks<C>(
    service: &C,
    question: &str,
    bookmarks: &BookmarkList,
) -> crate::Result<Vec<Bookmark>>
where
    C: CompletionService + ?Sized,
{
    let prompt = build_relevance_prompt(question, bookmarks);
    let response = service.complete(&prompt)?;
    debug!("Relevance reply: {:?}", response);

    let selected = select_relevant(&response, bookmarks);
    info!(
        "{} of {} bookmarks look relevant by title",
        selected.len(),
        bookmarks.len()
    );
    Ok(selected)
}
