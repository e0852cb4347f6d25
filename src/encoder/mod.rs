//! Frame-pacing encoder pipeline
//!
//! Producer/consumer pipeline decoupling frame production from frame
//! delivery: a bounded handoff queue, a pacer that duplicates frames so
//! the delivered stream matches the configured output rate, a delivery
//! worker draining the queue to the sink, and the session that ties the
//! lifecycle together.

pub mod pacer;
pub mod queue;
pub mod session;
pub mod settings;
pub mod types;

pub(crate) mod worker;

pub use pacer::FramePacer;
pub use queue::FrameQueue;
pub use session::EncoderSession;
pub use settings::{EncoderSettings, EncoderSettingsBuilder, PixelFormat};
pub use types::{EncoderError, EncoderResult, Frame, SessionState, SessionStats};
