//! Progress reporting for the query pipeline.
//!
//! The pipeline never depends on an observer doing anything: every method has
//! a no-op default and [`NoopObserver`] is a legal substitute everywhere.


use std::fmt;

use serde::Serialize;

use crate::bookmarks::Bookmark;

/// Pipeline stage boundaries reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Title-only relevance filtering
    Relevance,
    /// Page content collection
    Fetch,
    /// Final recommendation
    Synthesis,
}

impl Stage {
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Fetch => "fetch",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sink for pipeline progress events
pub trait ProgressObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn stage_finished(&mut self, _stage: Stage) {}

    /// `count` bookmarks looked relevant; `kept` of them will be read
    fn relevant_found(&mut self, _count: usize, _kept: usize) {}

    /// A page fetch is about to start
    fn fetching(&mut self, _bookmark: &Bookmark) {}

    fn fetch_failed(&mut self, _url: &str) {}

    /// Fraction of the fetch stage completed, in `0.0..=1.0`
    fn progress(&mut self, _fraction: f32) {}

    /// Final outcome: the recommendation text, or `None` when nothing was relevant
    fn result(&mut self, _text: Option<&str>) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// A recorded progress event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageStarted { stage: Stage },
    StageFinished { stage: Stage },
    RelevantFound { count: usize, kept: usize },
    Fetching { title: String, url: String },
    FetchFailed { url: String },
    Progress { fraction: f32 },
    Result { text: Option<String> },
}

/// Observer that records events in order for later presentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<PipelineEvent>,
}

impl EventLog {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn events(&self) -> &[PipelineEvent] {
        &self.events
    }

    /// URLs whose fetch failed, in the order they were reported
    #[inline]
    pub fn failed_urls(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::FetchFailed { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the given stage was ever started
    #[inline]
    pub fn started(&self, stage: Stage) -> bool {
        self.events.contains(&PipelineEvent::StageStarted { stage })
    }
}

impl ProgressObserver for EventLog {
    fn stage_started(&mut self, stage: Stage) {
        self.events.push(PipelineEvent::StageStarted { stage });
    }

    fn stage_finished(&mut self, stage: Stage) {
        self.events.push(PipelineEvent::StageFinished { stage });
    }

    fn relevant_found(&mut self, count: usize, kept: usize) {
        self.events
            .push(PipelineEvent::RelevantFound { count, kept });
    }

    fn fetching(&mut self, bookmark: &Bookmark) {
        self.events.push(PipelineEvent::Fetching {
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
        });
    }

    fn fetch_failed(&mut self, url: &str) {
        self.events.push(PipelineEvent::FetchFailed {
            url: url.to_string(),
        });
    }

    fn progress(&mut self, fraction: f32) {
        self.events.push(PipelineEvent::Progress { fraction });
    }

    fn result(&mut self, text: Option<&str>) {
        self.events.push(PipelineEvent::Result {
            text: text.map(str::to_string),
        });
    }
}
