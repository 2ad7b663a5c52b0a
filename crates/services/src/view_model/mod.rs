//! View-model state machines. Each one owns its own observable state
//! (`tokio::sync::watch`), mutated only by its own callbacks; there is no
//! shared mutable state across view-models. Live subscriptions are cancelled
//! before being replaced and on teardown.

pub mod detail;
pub mod feed;
pub mod map;
pub mod owner;
pub mod upload;
