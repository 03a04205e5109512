use serde::Serialize;

use super::enums::RejectionReason;

/// Outcome of the admission gate for one selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum AdmissionVerdict {
    Accepted,
    Rejected { reason: RejectionReason },
}

impl AdmissionVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected { reason } => Some(*reason),
        }
    }
}

impl From<RejectionReason> for AdmissionVerdict {
    fn from(reason: RejectionReason) -> Self {
        Self::Rejected { reason }
    }
}
