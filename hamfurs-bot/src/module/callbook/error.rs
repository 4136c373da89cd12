use super::types::Source;

/// Terminal outcome of a failed lookup. Each variant maps to one reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("callsign not found in {origin}")]
    NotFound { origin: Source },

    #[error("{origin} lookup failed: {reason}")]
    Transient { origin: Source, reason: String },

    #[error("not a valid callsign")]
    Unclassified,

    #[error("no callsign registered for @{handle}")]
    AliasNotFound { handle: String },
}

impl LookupError {
    pub fn transient(origin: Source, reason: impl ToString) -> Self {
        LookupError::Transient {
            origin,
            reason: reason.to_string(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            LookupError::NotFound { origin } => match origin {
                Source::Ic | Source::Nkom | Source::Acma => {
                    format!("Callsign not found in {} database", origin.label())
                }
                _ => "Callsign not found".to_string(),
            },
            LookupError::Transient { origin, .. } => {
                format!("Error while looking up callsign in {}, try again later", origin.label())
            }
            LookupError::Unclassified => "Please specify a valid callsign".to_string(),
            LookupError::AliasNotFound { .. } => {
                "No associated callsign found for given telegram handle".to_string()
            }
        }
    }
}
