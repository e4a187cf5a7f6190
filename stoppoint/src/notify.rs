// Change notifications
//
// The manager publishes typed change events on a broadcast channel instead of
// calling listeners in-process. Publishing never blocks and never fails a
// mutation; with no subscribers the event is simply dropped.

use crate::group::GroupId;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakpointChange {
    Added,
    Modified,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupChange {
    Added,
    Enabled,
    Disabled,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ManagerEvent {
    Breakpoint {
        number: u32,
        change: BreakpointChange,
    },
    Group {
        id: GroupId,
        name: String,
        change: GroupChange,
    },
    /// Something went wrong but the engine carried on
    Warning { message: String },
    /// Informational output of a stop or a log monitor
    Notice { message: String },
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ManagerEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ManagerEvent) {
        if self.tx.send(event).is_err() {
            debug!("No notification subscribers");
        }
    }

    pub fn breakpoint(&self, number: u32, change: BreakpointChange) {
        self.publish(ManagerEvent::Breakpoint { number, change });
    }

    pub fn group(&self, id: GroupId, name: &str, change: GroupChange) {
        self.publish(ManagerEvent::Group {
            id,
            name: name.to_string(),
            change,
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(ManagerEvent::Warning {
            message: message.into(),
        });
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.publish(ManagerEvent::Notice {
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let notifier = Notifier::new(4);
        notifier.breakpoint(1, BreakpointChange::Added);
    }

    #[test]
    fn test_subscriber_receives_in_order() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();
        notifier.breakpoint(1, BreakpointChange::Added);
        notifier.warning("careful");

        assert_eq!(
            rx.try_recv().unwrap(),
            ManagerEvent::Breakpoint {
                number: 1,
                change: BreakpointChange::Added
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ManagerEvent::Warning {
                message: "careful".into()
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
