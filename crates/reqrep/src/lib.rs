pub mod body;
pub mod builder;
pub mod error;
pub mod executor;
pub mod host;
pub mod message;
pub mod options;
pub mod payload;
pub mod plan;
pub mod provider;
pub mod redact;
pub mod route;
pub mod telemetry;
pub mod transform;

pub use builder::DetailBuilder;
pub use executor::{Executor, ExecutorError};
pub use message::{Address, BufferedView, MessageContext, StreamingView};
pub use options::GlobalOptions;
pub use payload::Payload;
pub use plan::{FailureMode, FailureModeSetting, Plan, PlanEntry, Side};
pub use provider::{DetailProvider, InMemoryDetailProvider};
pub use route::RouteEntry;
pub use transform::{AnyTransform, BufferedTransform, ParamBag, Registry, StreamingTransform};
