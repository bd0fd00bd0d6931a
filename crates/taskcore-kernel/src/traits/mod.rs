//! Trait boundaries (C1–C9) plus external-collaborator seams. Concrete
//! implementations live in `taskcore-foundation`; the gateway and CLI depend
//! only on these traits.

pub mod auth;
pub mod bus;
pub mod checkpoint;
pub mod context;
pub mod dispatcher;
pub mod notification;
pub mod planner;
pub mod plugin;
pub mod scheduler;
pub mod store;
pub mod orchestrator;

pub use auth::{AuthProvider, AuthenticatedUser};
pub use bus::{EventBus, Subscription};
pub use checkpoint::CheckpointManager;
pub use context::TaskContext;
pub use dispatcher::{DispatchOutcome, FileContext, FileService, StepDispatcher};
pub use notification::{NotificationMessage, NotificationProvider};
pub use orchestrator::Orchestrator;
pub use planner::{LLMProvider, PlanProposal, Planner};
pub use plugin::{FieldSpec, PluginExecutor, PluginRegistry, PluginSpec};
pub use scheduler::Scheduler;
pub use store::{TaskFilter, TaskPatch, TaskStore};
