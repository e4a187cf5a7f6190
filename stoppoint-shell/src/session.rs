// Shell session state
//
// Holds the shared breakpoint manager and renders its change feed

use std::path::PathBuf;
use stoppoint::{
    BreakpointChange, BreakpointManager, BreakpointResult, EngineConfig, GroupChange,
    ManagerEvent, SharedBreakpointManager,
};
use tokio::sync::broadcast;
use tracing::info;

pub struct ShellSession {
    manager: SharedBreakpointManager,
    breakpoints_file: Option<PathBuf>,
}

impl ShellSession {
    /// Open the manager, restoring the configured breakpoints file
    pub fn open(config: EngineConfig) -> BreakpointResult<Self> {
        let breakpoints_file = config.breakpoints_file.clone();
        let manager = BreakpointManager::open(config)?;
        info!("Session opened with {} breakpoints", manager.len());
        Ok(Self {
            manager: manager.shared(),
            breakpoints_file,
        })
    }

    pub fn manager(&self) -> &SharedBreakpointManager {
        &self.manager
    }

    pub fn breakpoints_file(&self) -> Option<&PathBuf> {
        self.breakpoints_file.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.manager.lock().subscribe()
    }

    /// Save (if configured) and release everything
    pub fn close(&self) -> BreakpointResult<()> {
        self.manager.lock().close()?;
        info!("Session closed");
        Ok(())
    }
}

/// One `[event]` line for the change feed
pub fn describe_event(event: &ManagerEvent) -> String {
    match event {
        ManagerEvent::Breakpoint { number, change } => {
            let what = match change {
                BreakpointChange::Added => "added",
                BreakpointChange::Modified => "modified",
                BreakpointChange::Removed => "removed",
            };
            format!("breakpoint {} {}", number, what)
        }
        ManagerEvent::Group { name, change, .. } => {
            let what = match change {
                GroupChange::Added => "added",
                GroupChange::Enabled => "enabled",
                GroupChange::Disabled => "disabled",
                GroupChange::Removed => "removed",
            };
            format!("group {} {}", name, what)
        }
        ManagerEvent::Warning { message } => format!("warning: {}", message),
        ManagerEvent::Notice { message } => message.clone(),
    }
}
