use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn numbered(count: usize) -> Vec<Bookmark> {
    (1..=count)
        .map(|i| Bookmark::new(format!("Page {i}"), format!("https://example.com/{i}")))
        .collect()
}

#[test]
fn large_selection_is_capped() {
    let input = numbered(45);
    let input_urls: HashSet<String> = input.iter().map(|b| b.url.clone()).collect();

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let bounded = bound_selection(input.clone(), DEFAULT_SAMPLE_CAP, &mut rng);

        assert_eq!(bounded.bookmarks.len(), 30);
        assert_eq!(bounded.original_count, 45);
        assert!(bounded.was_sampled());

        let urls: HashSet<&str> = bounded.bookmarks.iter().map(|b| b.url.as_str()).collect();
        assert_eq!(urls.len(), 30, "sample must not contain duplicates");
        assert!(urls.iter().all(|url| input_urls.contains(*url)));
    }
}

#[test]
fn small_selection_passes_through() {
    let input = numbered(10);
    let mut rng = StdRng::seed_from_u64(7);

    let bounded = bound_selection(input.clone(), DEFAULT_SAMPLE_CAP, &mut rng);

    assert_eq!(bounded.bookmarks, input);
    assert_eq!(bounded.original_count, 10);
    assert!(!bounded.was_sampled());
}

#[test]
fn selection_at_cap_is_not_sampled() {
    let input = numbered(30);
    let mut rng = StdRng::seed_from_u64(1);

    let bounded = bound_selection(input.clone(), 30, &mut rng);

    assert_eq!(bounded.bookmarks, input);
    assert!(!bounded.was_sampled());
}

#[test]
fn sample_keeps_input_order() {
    let input = numbered(100);
    let mut rng = StdRng::seed_from_u64(42);

    let bounded = bound_selection(input.clone(), 5, &mut rng);

    let positions: Vec<usize> = bounded
        .bookmarks
        .iter()
        .map(|b| {
            input
                .iter()
                .position(|candidate| candidate == b)
                .expect("sampled bookmark comes from input")
        })
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn same_seed_same_sample() {
    let input = numbered(45);

    let first = bound_selection(input.clone(), 30, &mut StdRng::seed_from_u64(9));
    let second = bound_selection(input, 30, &mut StdRng::seed_from_u64(9));

    assert_eq!(first, second);
}

#[test]
fn empty_selection() {
    let bounded = bound_selection(Vec::new(), 30, &mut StdRng::seed_from_u64(0));
    assert!(bounded.bookmarks.is_empty());
    assert!(!bounded.was_sampled());
}
