mod batch_buffer;
mod commit_applier;
mod commit_stream;
mod engine;
mod message;
pub(crate) mod slot;
mod timer;
pub(crate) mod view_change;

pub(crate) use commit_applier::*;
pub use commit_stream::*;
pub use engine::ConsensusEngine;
pub use engine::CommitHandle;
pub use message::*;

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod message_test;
