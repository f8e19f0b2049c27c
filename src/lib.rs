// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod corpus;
pub mod cursor;
pub mod error;
pub mod frame_loop;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod session;
pub mod terminal;
pub mod typing_policy;

pub use error::WpmError;
pub use frame_loop::{FrameLoop, LoopOptions, LoopOutcome, LoopState};
pub use session::{Stats, TypingSession, WordBasis};
pub use typing_policy::CompletionPolicy;
