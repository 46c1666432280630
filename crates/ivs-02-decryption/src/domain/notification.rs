//! Completion notifications as seen by the registry.

use crate::error::NotificationError;
use shared_types::entities::{DataKind, RequestId, UserId};
use shared_types::ipc::DecryptionCompleted;

/// A relayer completion whose data kind tag has been recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotification {
    pub request_id: RequestId,
    pub subject: UserId,
    pub raw_value: u64,
    pub kind: DataKind,
    /// Display-only value computed by the contract. Never used for rendering.
    pub scaled_value: u64,
}

impl CompletionNotification {
    /// Check that this notification answers a request for `subject` and `kind`.
    pub fn check(&self, subject: UserId, kind: DataKind) -> Result<(), NotificationError> {
        if self.kind != kind {
            return Err(NotificationError::KindMismatch {
                request_id: self.request_id,
                expected: kind,
                actual: self.kind,
            });
        }
        if self.subject != subject {
            return Err(NotificationError::SubjectMismatch {
                request_id: self.request_id,
                expected: subject,
                actual: self.subject,
            });
        }
        Ok(())
    }
}

impl TryFrom<DecryptionCompleted> for CompletionNotification {
    type Error = NotificationError;

    fn try_from(record: DecryptionCompleted) -> Result<Self, Self::Error> {
        let kind = DataKind::from_wire_tag(&record.data_type).ok_or_else(|| {
            NotificationError::UnknownDataKind {
                request_id: record.request_id,
                tag: record.data_type.clone(),
            }
        })?;

        Ok(Self {
            request_id: record.request_id,
            subject: record.user_id,
            raw_value: record.decrypted_value,
            kind,
            scaled_value: record.scaled_value,
        })
    }
}
