//! Last-request-wins bookkeeping for segment fetches.
//!
//! Every fetch gets a token from the slot. Only the most recently issued token
//! is accepted when results come back, so a slow stale response can never
//! overwrite a newer one.

use super::stack::RenderableBar;
use super::types::DateRange;

/// Everything that decides what a fetch returns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub range: DateRange,
    pub break_by_datasource: bool,
    pub use_sql: bool,
    pub datasource: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct FetchSlot {
    generation: u64,
    key: Option<QueryKey>,
}

impl FetchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` differs from the last issued request
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        self.key.as_ref() != Some(key)
    }

    /// Start a request for `key`, superseding any in flight
    pub fn issue(&mut self, key: QueryKey) -> RequestToken {
        self.generation += 1;
        self.key = Some(key);
        RequestToken(self.generation)
    }

    /// True only for the most recently issued token
    pub fn accept(&self, token: RequestToken) -> bool {
        token.0 == self.generation
    }

    /// Forget the last key so the next `needs_fetch` is true
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

/// What the chart currently has to show
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Error(String),
    /// The query succeeded but found no segments in range
    NoData,
    Loaded(Vec<RenderableBar>),
}

impl LoadState {
    pub fn from_bars(bars: Vec<RenderableBar>) -> Self {
        if bars.is_empty() {
            LoadState::NoData
        } else {
            LoadState::Loaded(bars)
        }
    }

    pub fn bars(&self) -> &[RenderableBar] {
        match self {
            LoadState::Loaded(bars) => bars,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(month: u32) -> QueryKey {
        QueryKey {
            range: DateRange::new(
                Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, month + 1, 1, 0, 0, 0).unwrap(),
            ),
            break_by_datasource: false,
            use_sql: true,
            datasource: None,
        }
    }

    #[test]
    fn test_only_latest_token_is_accepted() {
        let mut slot = FetchSlot::new();
        let first = slot.issue(key(1));
        assert!(slot.accept(first));

        let second = slot.issue(key(2));
        assert!(!slot.accept(first));
        assert!(slot.accept(second));
    }

    #[test]
    fn test_reissuing_same_key_supersedes() {
        let mut slot = FetchSlot::new();
        let first = slot.issue(key(1));
        let retry = slot.issue(key(1));
        assert!(!slot.accept(first));
        assert!(slot.accept(retry));
    }

    #[test]
    fn test_needs_fetch_tracks_key_changes() {
        let mut slot = FetchSlot::new();
        assert!(slot.needs_fetch(&key(1)));
        slot.issue(key(1));
        assert!(!slot.needs_fetch(&key(1)));
        assert!(slot.needs_fetch(&key(2)));

        let mut by_ds = key(1);
        by_ds.break_by_datasource = true;
        assert!(slot.needs_fetch(&by_ds));

        slot.invalidate();
        assert!(slot.needs_fetch(&key(1)));
    }

    #[test]
    fn test_empty_result_is_no_data() {
        assert_eq!(LoadState::from_bars(Vec::new()), LoadState::NoData);
        assert!(LoadState::Error("boom".into()).bars().is_empty());
    }
}
