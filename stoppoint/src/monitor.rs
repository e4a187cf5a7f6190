// Breakpoint monitors
//
// Monitors are side effects executed, in order, once a breakpoint has
// decided to stop.

use crate::error::MonitorError;
use crate::notify::Notifier;
use crate::types::FrameContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Command interpreter collaborator
pub trait CommandInterpreter: Send + Sync {
    fn execute(&self, command: &str, frame: Option<&FrameContext>) -> Result<(), MonitorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Monitor {
    /// Run a debugger command
    Command { command: String },
    /// Emit a notice
    Log { message: String },
}

impl Monitor {
    pub fn command(command: impl Into<String>) -> Self {
        Monitor::Command {
            command: command.into(),
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        Monitor::Log {
            message: message.into(),
        }
    }

    pub fn perform(
        &self,
        frame: Option<&FrameContext>,
        interpreter: Option<&dyn CommandInterpreter>,
        notifier: &Notifier,
    ) -> Result<(), MonitorError> {
        match self {
            Monitor::Command { command } => match interpreter {
                Some(interpreter) => interpreter.execute(command, frame),
                None => Err(MonitorError("no command interpreter".to_string())),
            },
            Monitor::Log { message } => {
                info!("monitor: {}", message);
                notifier.notice(message.clone());
                Ok(())
            }
        }
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Monitor::Command { command } => write!(f, "CommandMonitor=[{}]", command),
            Monitor::Log { message } => write!(f, "LogMonitor=[{}]", message),
        }
    }
}
