mod behavior;
mod component;
mod components;
mod cosmos;
mod dynamo;
mod registry;

pub mod history;

pub use behavior::{BehaviorFn, BehaviorRegistry, BehaviorTag};
pub use component::{Component, ComponentCategory, ComponentKind, SerializationFilter, Signature};
pub use components::{Behavior, CausalChain, Timejump, Transform, Velocity};
pub use cosmos::{Cosmos, Departure};
pub use dynamo::Dynamo;
pub use registry::ComponentRegistry;
