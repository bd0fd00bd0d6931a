//! C4 — Plugin Registry & Executor implementation, plus the three built-in
//! system plugins.

mod http_get;
mod policy;
mod registry;
mod send_email;
mod transform;

pub use http_get::HttpGetPlugin;
pub use policy::is_host_allowed;
pub use registry::{with_builtin_plugins, InMemoryPluginRegistry};
pub use send_email::{RecordingNotificationProvider, SendEmailPlugin};
pub use transform::TransformPlugin;
