// Breakpoint engine for JVM debugger front-ends
//
// Owns the breakpoint model and decides what target events mean:
// - Parsing location specifications and class patterns
// - Resolving breakpoints against loaded and later-loaded classes
// - Firing policy (skip/expire counts, conditions, monitors)
// - Breakpoint groups and change notification
// - Saving and restoring the breakpoint tree

pub mod types;
pub mod error;
pub mod pattern;
pub mod target;
pub mod events;
pub mod notify;
pub mod group;
pub mod condition;
pub mod monitor;
pub mod breakpoint;
pub mod parse;
pub mod config;
pub mod persist;
pub mod manager;
pub mod mock;

pub use breakpoint::{Breakpoint, BreakpointKind};
pub use condition::{Condition, Evaluator};
pub use config::EngineConfig;
pub use error::{BreakpointError, BreakpointResult, ParseError, ResolveError, TargetError};
pub use events::{Decision, EventKind, TargetEvent};
pub use group::GroupId;
pub use manager::{BreakpointManager, SessionContext, SharedBreakpointManager};
pub use monitor::{CommandInterpreter, Monitor};
pub use notify::{BreakpointChange, GroupChange, ManagerEvent};
pub use pattern::ReferenceTypeSpec;
pub use target::{SuspendPolicy, Target};
