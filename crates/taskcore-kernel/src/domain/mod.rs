//! Domain model: Task, Step, Finding, Checkpoint, UserPreference, Event.

pub mod checkpoint;
pub mod dag;
pub mod event;
pub mod finding;
pub mod preference;
pub mod step;
pub mod task;

pub use checkpoint::{Checkpoint, CheckpointDecision, CheckpointResponse};
pub use event::{Event, EventSourceType};
pub use finding::{Finding, FindingKind};
pub use preference::{PreferenceDecision, PreferenceScope, UserPreference};
pub use step::{CheckpointDescriptor, CheckpointType, OnDepFailure, RetryPolicy, Step, StepError, StepKind, StepStatus};
pub use task::{ConstraintValue, Constraints, Task, TaskId, TaskOwner, TaskStatus, TriggeredBy};
