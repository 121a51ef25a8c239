use serde::Serialize;

use super::domain::{Application, ApplicationId, ApplicationNumber, ApplicationStatus, Revision};

/// Storage abstraction for the current state of each application.
///
/// Every write records a revision in the same unit of work, so an implementation is
/// also expected to implement [`RevisionStore`].
pub trait ApplicationStore: Send + Sync {
    /// Reserve an identifier for a new application.
    fn next_id(&self) -> Result<ApplicationId, RepositoryError>;
    fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find_by_number(
        &self,
        number: ApplicationNumber,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Upsert keyed by id. Records an INSERT revision for a new row and UPDATE otherwise.
    ///
    /// Fails with [`RepositoryError::DuplicateNumber`] if another row already owns the
    /// application number; nothing is written in that case.
    fn save(&self, application: Application) -> Result<Application, RepositoryError>;
    /// Write the final snapshot (UPDATE revision) and remove the row (DELETE revision).
    fn delete(&self, application: Application) -> Result<(), RepositoryError>;
    fn query(&self, query: &ApplicationQuery) -> Result<Page<Application>, RepositoryError>;
}

/// Read side of the append-only history.
pub trait RevisionStore: Send + Sync {
    /// Revisions for one id, oldest first. Unknown ids yield an empty list.
    fn revisions_for(&self, id: ApplicationId) -> Result<Vec<Revision>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("application with id: {0} not found")]
    NotFound(ApplicationId),
    #[error("application number {0} is already taken")]
    DuplicateNumber(ApplicationNumber),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Filtered, paged listing request. Absent filters match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub name: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub page: usize,
    pub size: usize,
}

impl ApplicationQuery {
    pub fn matches(&self, application: &Application) -> bool {
        let name_matches = self
            .name
            .as_deref()
            .map_or(true, |needle| application.name.contains(needle));
        let status_matches = self
            .status
            .map_or(true, |status| application.status == status);
        name_matches && status_matches
    }
}

/// One page of results plus the totals needed to walk the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice a full, already ordered result set.
    pub fn from_sorted(all: Vec<T>, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(size);
        let items = all.into_iter().skip(page.saturating_mul(size)).take(size).collect();

        Self {
            items,
            page,
            size,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_report_totals() {
        let page = Page::from_sorted((0..23).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, vec![20, 21, 22]);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Page::from_sorted(vec![1, 2, 3], 5, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page = Page::from_sorted(Vec::<u8>::new(), 0, 10);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_items, 0);
    }
}
