//! Task lifecycle management
//!
//! Wraps a fan-out run as a named, stateful, controllable unit. The
//! controller owns all task mutation; everything observable from outside is
//! a snapshot.

mod controller;
mod state;
#[allow(clippy::module_inception)]
mod task;

pub use controller::TaskController;
pub use state::{ControlAction, TaskStatus};
pub use task::{Task, TaskSummary};
