use std::ops::Range;

use crate::catalog::{Catalog, Question};
use crate::responses::{QuestionState, ResponseStore};

pub const DEFAULT_PAGE_SIZE: u16 = 10;

/// Splits the catalog into fixed-size pages. Boundaries are computed once
/// from the catalog length; only the current index moves.
#[derive(Clone, Debug)]
pub struct Pager {
    page_size: usize,
    total: usize,
    current: usize,
}

impl Pager {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            total,
            current: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    /// Zero-based index of the page being shown.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.page_count()
    }

    /// Catalog index range covered by the current page.
    pub fn current_range(&self) -> Range<usize> {
        let start = self.current * self.page_size;
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn page_questions<'a>(&self, catalog: &'a Catalog) -> &'a [Question] {
        &catalog.questions()[self.current_range()]
    }

    pub fn is_page_complete(&self, catalog: &Catalog, store: &ResponseStore) -> bool {
        self.page_questions(catalog)
            .iter()
            .all(|q| store.state_of(q.id) != QuestionState::Unanswered)
    }

    /// Index (within the page) of the first unanswered question at or after
    /// `from`, wrapping around to the top of the page.
    pub fn first_unanswered(
        &self,
        catalog: &Catalog,
        store: &ResponseStore,
        from: usize,
    ) -> Option<usize> {
        let page = self.page_questions(catalog);
        let n = page.len();
        (0..n)
            .map(|offset| (from + offset) % n)
            .find(|&i| store.state_of(page[i].id) == QuestionState::Unanswered)
    }

    /// Advance one page. No-op returning `false` on the last page or while
    /// the current page has unanswered questions.
    pub fn next(&mut self, catalog: &Catalog, store: &ResponseStore) -> bool {
        if self.is_last() || !self.is_page_complete(catalog, store) {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
