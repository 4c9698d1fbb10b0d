// Built-in robot agents: the client handle, the runtime that drives a brain, and the brains.

pub mod brains;
pub mod client;
pub mod runtime;

pub use brains::{BRAIN_NAMES, Brain, brain_by_name};
pub use client::{AgentError, ArenaInfo, PendingCommand, RobotClient};
pub use runtime::run_agent;
