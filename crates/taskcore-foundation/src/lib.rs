//! Concrete implementations of the `taskcore-kernel` trait boundaries: the
//! in-memory task store, event bus, checkpoint manager, plugin registry,
//! planner, step dispatcher, scheduler, orchestrator, and the application
//! use cases that compose them.

pub mod bus;
pub mod checkpoint;
pub mod dispatcher;
pub mod orchestrator;
pub mod planner;
pub mod plugins;
pub mod scheduler;
pub mod store;
pub mod usecases;

pub use bus::InMemoryEventBus;
pub use checkpoint::InMemoryCheckpointManager;
pub use dispatcher::DefaultStepDispatcher;
pub use orchestrator::TaskOrchestrator;
pub use planner::LlmPlanner;
pub use plugins::{with_builtin_plugins, InMemoryPluginRegistry};
pub use scheduler::TokioScheduler;
pub use store::InMemoryTaskStore;
pub use usecases::UseCases;
