//! Command runner adapters.

mod recording;
mod system;

pub use recording::RecordingRunner;
pub use system::SystemRunner;
