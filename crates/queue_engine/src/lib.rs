//! Queue engine: remote channel, poll timer and effect execution.
mod channel;
mod engine;
mod timer;
mod types;

pub use channel::{ChannelSettings, QueueChannel, ReqwestChannel};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use timer::PollTimer;
pub use types::{ChannelError, EngineEvent, FailureKind};
