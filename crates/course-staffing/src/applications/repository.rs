use std::collections::HashSet;

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus, CourseId, UserId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `insert` must reject a record whose id exists or whose (submitter, course) pair is
/// already taken, atomically with the write. `modify` runs `apply` against the current
/// record and stores the result in the same critical section; nothing is written when
/// `apply` fails.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn modify<E, F>(&self, id: &ApplicationId, apply: F) -> Result<ApplicationRecord, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut ApplicationRecord) -> Result<(), E>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn find_by_submitter(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Matching records ordered by submission time, then id.
    fn query(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Listing constraints. Empty constraints match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub submitted_by: Option<UserId>,
    pub statuses: HashSet<ApplicationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid userId parameter.")]
    InvalidUserId,
    #[error("Invalid status filter \"{0}\". Status must be one of pending, selected, rejected.")]
    InvalidStatus(String),
}

impl ApplicationFilter {
    /// Build a filter from raw `status` and `userId` query parameters.
    ///
    /// Quotes are stripped from the status list and blank parameters are ignored.
    pub fn from_query(status: Option<&str>, user_id: Option<&str>) -> Result<Self, FilterError> {
        let submitted_by = match user_id.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(UserId::parse(raw).ok_or(FilterError::InvalidUserId)?),
            None => None,
        };

        let mut statuses = HashSet::new();
        if let Some(raw) = status {
            let sanitized: String = raw.chars().filter(|c| *c != '\'' && *c != '"').collect();
            for part in sanitized.trim().split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let parsed = ApplicationStatus::parse(part)
                    .ok_or_else(|| FilterError::InvalidStatus(part.to_string()))?;
                statuses.insert(parsed);
            }
        }

        Ok(Self {
            submitted_by,
            statuses,
        })
    }

    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        let user_matches = self
            .submitted_by
            .as_ref()
            .map_or(true, |user| &record.submitted_by == user);
        let status_matches = self.statuses.is_empty() || self.statuses.contains(&record.status);
        user_matches && status_matches
    }
}
