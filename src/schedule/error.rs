use crate::backend::BackendError;

/// Scheduling failures, each with a stable short code so UI surfaces can
/// show the same message everywhere the operation is invoked.
#[derive(Debug)]
pub enum ScheduleError {
    /// S001: the proposed range overlaps an existing entry on that day.
    Conflict,
    /// S002: zero/negative-length or out-of-grid range.
    InvalidRange(&'static str),
    /// S003: the commit's delete step succeeded but the insert step did
    /// not: the tenant's persisted schedule is now EMPTY. The draft is
    /// untouched; retrying the save is the only way to restore the data.
    SaveIncomplete { message: String },
    /// Upstream collaborator failure, message preserved verbatim.
    Backend(BackendError),
}

impl ScheduleError {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ScheduleError::Conflict => Some("S001"),
            ScheduleError::InvalidRange(_) => Some("S002"),
            ScheduleError::SaveIncomplete { .. } => Some("S003"),
            ScheduleError::Backend(_) => None,
        }
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::Conflict => write!(
                f,
                "S001: time slot conflict, a video is already scheduled in this time range"
            ),
            ScheduleError::InvalidRange(msg) => write!(f, "S002: invalid time range: {msg}"),
            ScheduleError::SaveIncomplete { message } => write!(
                f,
                "S003: save incomplete: the existing schedule was cleared but the new one \
                 could not be written ({message}); the schedule is currently empty, retry \
                 the save and do not assume nothing changed"
            ),
            ScheduleError::Backend(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<BackendError> for ScheduleError {
    fn from(e: BackendError) -> Self {
        ScheduleError::Backend(e)
    }
}
