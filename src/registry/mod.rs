pub mod context;
pub mod resources;
pub mod tools;

pub use context::RequestContext;
pub use resources::{Resource, ResourceDescriptor, ResourceRegistry};
pub use tools::{Tool, ToolDefinition, ToolRegistry};
