//! Bounded walk over numbered search result pages.
//!
//! The directory numbers result pages from 1 and signals a following page
//! with a "Next" link. The walk ends at the first page that adds no new
//! identifiers, has no next link, or reaches the page limit. A missing or
//! malformed next link is read as "stop", never as "keep going".

/// Why a page walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page contributed no identifiers not already seen.
    NoNewIdentifiers,
    /// The last page had no next-page link.
    NoNextPage,
    /// The configured page limit was reached.
    PageLimit,
    /// A page after the first could not be fetched, or is not stored.
    PageUnavailable,
}

/// Position in a page walk.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page: u32,
    max_pages: u32,
    stopped: Option<StopReason>,
}

impl PageCursor {
    /// Starts at page 1. `max_pages` is clamped to at least 1.
    #[must_use]
    pub fn new(max_pages: u32) -> Self {
        Self {
            page: 1,
            max_pages: max_pages.max(1),
            stopped: None,
        }
    }

    /// The page to fetch next, or `None` once the walk has ended.
    #[must_use]
    pub fn current(&self) -> Option<u32> {
        match self.stopped {
            Some(_) => None,
            None => Some(self.page),
        }
    }

    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }

    /// Records the outcome of the current page and moves on.
    ///
    /// Returns the stop reason when this page ends the walk.
    pub fn advance(&mut self, new_identifiers: usize, has_next: bool) -> Option<StopReason> {
        if self.stopped.is_some() {
            return self.stopped;
        }
        let reason = if new_identifiers == 0 {
            Some(StopReason::NoNewIdentifiers)
        } else if !has_next {
            Some(StopReason::NoNextPage)
        } else if self.page >= self.max_pages {
            Some(StopReason::PageLimit)
        } else {
            None
        };
        match reason {
            Some(reason) => self.stopped = Some(reason),
            None => self.page += 1,
        }
        reason
    }

    /// Ends the walk at the current page without consuming it.
    pub fn abandon(&mut self) {
        self.stopped.get_or_insert(StopReason::PageUnavailable);
    }
}
