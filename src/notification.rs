use futures::channel::mpsc::UnboundedSender;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::metadata::Metadata;

const CLOSE_ACTION: &str = "Close";

/// A user-facing message with the label of its dismiss action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub action: String,
}

impl Notification {
    fn close(message: String) -> Self {
        Self {
            message,
            action: CLOSE_ACTION.to_string(),
        }
    }

    pub fn loaded(metadata: &Metadata) -> Self {
        Self::close(format!("✅ {} files successfully loaded", metadata.total()))
    }

    pub fn load_failed(error: &SessionError) -> Self {
        Self::close(format!("⚠️ Could not load files: {error}"))
    }

    pub fn rejected(error: &SessionError) -> Self {
        Self::close(format!("⚠️ {error}"))
    }

    /// Message for the outcome of opening files
    pub fn for_load(outcome: &Result<Metadata, SessionError>) -> Self {
        match outcome {
            Ok(metadata) => Self::loaded(metadata),
            Err(error) => Self::load_failed(error),
        }
    }
}

pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl NotificationSink for UnboundedSender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if self.unbounded_send(notification).is_err() {
            warn!("Notification receiver is gone");
        }
    }
}

/// Logs and forwards a load outcome
pub fn notify_load(sink: &mut impl NotificationSink, outcome: &Result<Metadata, SessionError>) {
    let notification = Notification::for_load(outcome);
    match outcome {
        Ok(_) => info!("{}", notification.message),
        Err(_) => warn!("{}", notification.message),
    }
    sink.notify(notification);
}

/// Logs and forwards a rejected gesture
pub fn notify_rejected(sink: &mut impl NotificationSink, error: &SessionError) {
    let notification = Notification::rejected(error);
    warn!("{}", notification.message);
    sink.notify(notification);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, InvalidOperation, ReadError};
    use futures::StreamExt;
    use futures::channel::mpsc;

    #[test]
    fn success_message_carries_total() {
        let notification = Notification::for_load(&Ok(Metadata::new(0, 24)));
        assert_eq!(notification.message, "✅ 24 files successfully loaded");
        assert_eq!(notification.action, "Close");
    }

    #[test]
    fn failure_message_carries_cause() {
        let error = SessionError::from(DecodeError::Parse {
            index: 2,
            message: "bad magic".to_string(),
        });
        let notification = Notification::for_load(&Err(error));
        assert_eq!(
            notification.message,
            "⚠️ Could not load files: File 2 is not a readable DICOM file: bad magic"
        );

        let error = SessionError::from(ReadError::Empty {
            source_name: "scan.dcm".to_string(),
        });
        assert!(Notification::load_failed(&error).message.ends_with("scan.dcm is empty"));
    }

    #[test]
    fn rejected_gesture_message() {
        let error = SessionError::from(InvalidOperation::NotLoaded);
        assert_eq!(Notification::rejected(&error).message, "⚠️ No files loaded");
    }

    #[test]
    fn channel_sink_delivers_in_order() {
        let (mut sender, receiver) = mpsc::unbounded();
        notify_load(&mut sender, &Ok(Metadata::new(0, 3)));
        notify_rejected(&mut sender, &InvalidOperation::LoadInProgress.into());
        drop(sender);

        let received: Vec<_> = futures::executor::block_on(receiver.collect());
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].message, "✅ 3 files successfully loaded");
        assert_eq!(received[1].message, "⚠️ Files are still loading");
    }
}
