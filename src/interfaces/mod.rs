// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_handler;

pub use event_handler::{
    ChannelEventHandler, EngineEvent, EventHandler, LoggingEventHandler, NoOpEventHandler,
    RecordingEventHandler,
};
