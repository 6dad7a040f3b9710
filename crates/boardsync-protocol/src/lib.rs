pub mod command;
pub mod delta;
pub mod extract;
pub mod message;
pub mod normalizer;

pub use command::{Command, PwmAction};
pub use delta::{HardwareDelta, PwmTransition};
pub use extract::extract_line;
pub use message::{EmuEventPayload, EngineMessage, KNOWN_MESSAGE_TYPES};
pub use normalizer::EventNormalizer;
