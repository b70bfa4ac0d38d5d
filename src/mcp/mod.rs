// Simple mod.rs to expose the protocol, dispatcher, and tool registry
pub mod handler;
pub mod protocol;
pub mod registry;
