#[cfg(test)]
mod tests;

use rand::Rng;
use tracing::info;

use crate::bookmarks::Bookmark;

/// Default number of relevant bookmarks read per question
pub const DEFAULT_SAMPLE_CAP: usize = 30;

/// Relevant bookmarks after capping, with what is needed to disclose sampling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedSelection {
    pub bookmarks: Vec<Bookmark>,
    /// Size of the relevant set before capping
    pub original_count: usize,
}

impl BoundedSelection {
    /// Whether random sampling dropped part of the relevant set
    #[inline]
    pub fn was_sampled(&self) -> bool {
        self.bookmarks.len() < self.original_count
    }
}

/// Cap the selection at `cap` bookmarks by uniform sampling without replacement.
///
/// Selections within the cap pass through unchanged. Sampled bookmarks keep
/// their relative order from the input.
#[inline]
pub fn bound_selection<R>(selection: Vec<Bookmark>, cap: usize, rng: &mut R) -> BoundedSelection
where
    R: Rng + ?Sized,
{
    let original_count = selection.len();
    if original_count <= cap {
        return BoundedSelection {
            bookmarks: selection,
            original_count,
        };
    }

    let mut picked = rand::seq::index::sample(rng, original_count, cap).into_vec();
    picked.sort_unstable();

    let mut slots: Vec<Option<Bookmark>> = selection.into_iter().map(Some).collect();
    let bookmarks = picked
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect();

    info!("Sampled {} of {} relevant bookmarks", cap, original_count);

    BoundedSelection {
        bookmarks,
        original_count,
    }
}
