use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::Mutex;

use super::domain::{Application, ApplicationId, ApplicationNumber, Revision, RevisionType};
use super::repository::{ApplicationQuery, ApplicationStore, Page, RepositoryError, RevisionStore};

/// In-process store keeping current rows and their revision log behind one lock.
///
/// Holding a single lock for the row, the number index and the log makes each write
/// and its revision one unit of work.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    rows: BTreeMap<ApplicationId, Application>,
    numbers: HashMap<ApplicationNumber, ApplicationId>,
    revisions: Vec<Revision>,
    last_id: u64,
    last_revision: u64,
}

impl StoreState {
    fn record(&mut self, revision_type: RevisionType, application: Application) {
        self.last_revision += 1;
        self.revisions.push(Revision {
            revision_number: self.last_revision,
            timestamp: Utc::now(),
            revision_type,
            application,
        });
    }

    fn ensure_number_free(&self, application: &Application) -> Result<(), RepositoryError> {
        if let Some(number) = application.application_number {
            match self.numbers.get(&number) {
                Some(owner) if *owner != application.id => {
                    return Err(RepositoryError::DuplicateNumber(number));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn write_row(&mut self, application: Application) -> Option<Application> {
        let previous = self.rows.insert(application.id, application.clone());
        if let Some(number) = previous.as_ref().and_then(|row| row.application_number) {
            self.numbers.remove(&number);
        }
        if let Some(number) = application.application_number {
            self.numbers.insert(number, application.id);
        }
        previous
    }
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total revisions across all ids.
    pub fn revision_count(&self) -> usize {
        self.state.lock().revisions.len()
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        let mut state = self.state.lock();
        state.last_id += 1;
        Ok(ApplicationId(state.last_id))
    }

    fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.state.lock().rows.get(&id).cloned())
    }

    fn find_by_number(
        &self,
        number: ApplicationNumber,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.state.lock();
        Ok(state
            .numbers
            .get(&number)
            .and_then(|id| state.rows.get(id))
            .cloned())
    }

    fn save(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut state = self.state.lock();
        state.ensure_number_free(&application)?;

        let revision_type = match state.write_row(application.clone()) {
            Some(_) => RevisionType::Update,
            None => RevisionType::Insert,
        };
        state.record(revision_type, application.clone());
        Ok(application)
    }

    fn delete(&self, application: Application) -> Result<(), RepositoryError> {
        let mut state = self.state.lock();
        if !state.rows.contains_key(&application.id) {
            return Err(RepositoryError::NotFound(application.id));
        }

        state.record(RevisionType::Update, application.clone());
        if let Some(removed) = state.rows.remove(&application.id) {
            if let Some(number) = removed.application_number {
                state.numbers.remove(&number);
            }
        }
        state.record(RevisionType::Delete, application);
        Ok(())
    }

    fn query(&self, query: &ApplicationQuery) -> Result<Page<Application>, RepositoryError> {
        let state = self.state.lock();
        let matching: Vec<Application> = state
            .rows
            .values()
            .filter(|application| query.matches(application))
            .cloned()
            .collect();
        Ok(Page::from_sorted(matching, query.page, query.size))
    }
}

impl RevisionStore for InMemoryApplicationStore {
    fn revisions_for(&self, id: ApplicationId) -> Result<Vec<Revision>, RepositoryError> {
        let state = self.state.lock();
        let mut revisions: Vec<Revision> = state
            .revisions
            .iter()
            .filter(|revision| revision.application.id == id)
            .cloned()
            .collect();
        revisions.sort_by_key(|revision| revision.revision_number);
        Ok(revisions)
    }
}
