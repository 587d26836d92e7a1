use std::cell::RefCell;
use std::collections::VecDeque;

use super::progress::{EventLog, NoopObserver, PipelineEvent};
use super::*;
use crate::bookmarks::{Bookmark, parse_bookmark_html};
use crate::fetcher::FetchError;

/// Replies with queued answers in order and records every prompt
struct QueuedModel {
    replies: RefCell<VecDeque<crate::Result<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl QueuedModel {
    fn new(replies: Vec<crate::Result<String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok((*r).to_string())).collect())
    }

    fn prompt_count(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl CompletionService for QueuedModel {
    fn complete(&self, prompt: &str) -> crate::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ScoutError::LanguageModel("no reply queued".to_string())))
    }
}

/// Serves "content of <url>" for every URL and records requests
#[derive(Default)]
struct RecordingPages {
    requested: RefCell<Vec<String>>,
}

impl PageSource for RecordingPages {
    fn try_fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        Ok(format!("content of {url}"))
    }
}

fn quick_pipeline() -> PipelineConfig {
    PipelineConfig {
        fetch_delay_ms: 0,
        ..PipelineConfig::default()
    }
}

fn session(
    model: QueuedModel,
    bookmarks: BookmarkList,
) -> BookmarkSession<QueuedModel, RecordingPages> {
    let orchestrator = Orchestrator::new(model, RecordingPages::default(), &quick_pipeline())
        .with_rng_seed(11);
    let mut session = BookmarkSession::new(orchestrator);
    session.load(bookmarks);
    session
}

fn numbered(count: usize) -> BookmarkList {
    (1..=count)
        .map(|i| Bookmark::new(format!("Page {i}"), format!("https://example.com/{i}")))
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn relevant_subset_is_synthesized_without_disclosure() {
    let bookmarks = parse_bookmark_html(
        r#"
        <a href="a.com">Python tutorial</a>
        <a href="b.com">Cooking recipes</a>
        <a href="c.com">Python web dev</a>
        "#,
    );
    let model = QueuedModel::replying(&["1, 3", "Try a.com and c.com."]);
    let mut session = session(model, bookmarks);
    let mut log = EventLog::new();

    let outcome = session
        .ask("파이썬 자료", &mut log)
        .expect("query should succeed");

    assert_eq!(
        outcome,
        QueryOutcome::Recommendation(Recommendation {
            text: "Try a.com and c.com.".to_string(),
            relevant_count: 2,
            read_count: 2,
        })
    );

    let orchestrator = session.orchestrator();
    assert_eq!(
        *orchestrator.pages().requested.borrow(),
        vec!["a.com", "c.com"]
    );

    let prompts = orchestrator.service().prompts.borrow();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("1. Python tutorial"));
    assert!(prompts[0].contains("3. Python web dev"));
    assert!(prompts[1].contains("[Python tutorial](a.com): content of a.com"));
    assert!(prompts[1].contains("[Python web dev](c.com): content of c.com"));
    assert!(!prompts[1].contains("Cooking recipes"));
    assert!(!prompts[1].contains("random sample"));

    assert_eq!(
        log.events().last(),
        Some(&PipelineEvent::Result {
            text: Some("Try a.com and c.com.".to_string())
        })
    );
}

#[test]
fn none_reply_skips_fetch_and_synthesis() {
    let model = QueuedModel::replying(&["None"]);
    let mut session = session(model, numbered(3));
    let mut log = EventLog::new();

    let outcome = session
        .ask("quantum chemistry", &mut log)
        .expect("query should succeed");

    assert_eq!(outcome, QueryOutcome::NoRelevantBookmarks);
    assert_eq!(outcome.text(), None);

    let orchestrator = session.orchestrator();
    assert!(orchestrator.pages().requested.borrow().is_empty());
    assert_eq!(orchestrator.service().prompt_count(), 1);
    assert!(!log.started(Stage::Fetch));
    assert!(!log.started(Stage::Synthesis));
    assert_eq!(
        log.events().last(),
        Some(&PipelineEvent::Result { text: None })
    );
}

#[test]
fn garbage_reply_is_no_relevant_bookmarks() {
    let model = QueuedModel::replying(&["I think several could work!"]);
    let mut session = session(model, numbered(3));

    let outcome = session
        .ask("anything", &mut NoopObserver)
        .expect("query should succeed");

    assert_eq!(outcome, QueryOutcome::NoRelevantBookmarks);
    assert!(session.orchestrator().pages().requested.borrow().is_empty());
}

#[test]
fn large_selection_is_sampled_and_disclosed() {
    let indices = (1..=35).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
    let model = QueuedModel::replying(&[indices.as_str(), "Here is a partial answer."]);
    let mut session = session(model, numbered(40));
    let mut log = EventLog::new();

    let outcome = session
        .ask("everything", &mut log)
        .expect("query should succeed");

    let QueryOutcome::Recommendation(recommendation) = outcome else {
        panic!("expected a recommendation");
    };
    assert_eq!(recommendation.relevant_count, 35);
    assert_eq!(recommendation.read_count, 30);
    assert!(recommendation.was_sampled());

    let orchestrator = session.orchestrator();
    let requested = orchestrator.pages().requested.borrow();
    assert_eq!(requested.len(), 30);
    assert!(requested.iter().all(|url| {
        url.trim_start_matches("https://example.com/")
            .parse::<usize>()
            .is_ok_and(|i| (1..=35).contains(&i))
    }));

    let prompts = orchestrator.service().prompts.borrow();
    assert!(prompts[1].contains("35 bookmarks looked relevant"));
    assert!(prompts[1].contains("random sample of 30"));

    let relevant_found = PipelineEvent::RelevantFound {
        count: 35,
        kept: 30,
    };
    assert!(log.events().contains(&relevant_found));
}

#[test]
fn filter_failure_is_fatal() {
    let model = QueuedModel::new(vec![Err(ScoutError::LanguageModel("timeout".to_string()))]);
    let mut session = session(model, numbered(3));

    let result = session.ask("anything", &mut NoopObserver);

    assert!(matches!(result, Err(ScoutError::LanguageModel(_))));
    assert!(session.orchestrator().pages().requested.borrow().is_empty());
}

#[test]
fn synthesis_failure_is_fatal() {
    let model = QueuedModel::new(vec![
        Ok("1".to_string()),
        Err(ScoutError::LanguageModel("model crashed".to_string())),
    ]);
    let mut session = session(model, numbered(3));
    let mut log = EventLog::new();

    let result = session.ask("anything", &mut log);

    assert!(matches!(result, Err(ScoutError::LanguageModel(_))));
    assert_eq!(session.orchestrator().pages().requested.borrow().len(), 1);
    assert!(!log.events().iter().any(|e| matches!(e, PipelineEvent::Result { .. })));
}

#[test]
fn empty_inputs_call_nothing() {
    let model = QueuedModel::replying(&[]);
    let mut empty = session(model, BookmarkList::default());
    assert_eq!(
        empty.ask("anything", &mut NoopObserver).expect("no error"),
        QueryOutcome::NothingToSearch
    );
    assert_eq!(empty.orchestrator().service().prompt_count(), 0);

    let model = QueuedModel::replying(&[]);
    let mut blank = session(model, numbered(2));
    assert_eq!(
        blank.ask("   ", &mut NoopObserver).expect("no error"),
        QueryOutcome::NothingToSearch
    );
    assert_eq!(blank.orchestrator().service().prompt_count(), 0);
}

#[test]
fn cancelled_query_stops_before_filter() {
    let model = QueuedModel::replying(&["1"]);
    let mut session = session(model, numbered(2));
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = session.ask_with_cancel("anything", &mut NoopObserver, &cancel);

    assert!(matches!(result, Err(ScoutError::Cancelled)));
    assert_eq!(session.orchestrator().service().prompt_count(), 0);
}

#[test]
fn reload_replaces_bookmarks() {
    let model = QueuedModel::replying(&["1", "only b"]);
    let mut session = session(model, numbered(3));

    session.load(vec![Bookmark::new("B", "b.com")].into());
    assert_eq!(session.bookmarks().len(), 1);

    session
        .ask("b", &mut NoopObserver)
        .expect("query should succeed");
    assert_eq!(
        *session.orchestrator().pages().requested.borrow(),
        vec!["b.com"]
    );
}

#[test]
fn stage_events_are_ordered() {
    let model = QueuedModel::replying(&["2", "answer"]);
    let mut session = session(model, numbered(2));
    let mut log = EventLog::new();

    session.ask("q", &mut log).expect("query should succeed");

    let stages: Vec<PipelineEvent> = log
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e,
                PipelineEvent::StageStarted { .. } | PipelineEvent::StageFinished { .. }
            )
        })
        .cloned()
        .collect();
    let expected: Vec<PipelineEvent> = [Stage::Relevance, Stage::Fetch, Stage::Synthesis]
        .into_iter()
        .flat_map(stage_span)
        .collect();
    assert_eq!(stages, expected);
}

fn stage_span(stage: Stage) -> [PipelineEvent; 2] {
    [
        PipelineEvent::StageStarted { stage },
        PipelineEvent::StageFinished { stage },
    ]
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!token.is_cancelled());
    clone.cancel();
    assert!(token.is_cancelled());
}
