//! DocQA Session — the document store and chat transcript of one user
//! session, and the turn that connects them to a completion client.

pub mod context;
pub mod manager;
pub mod session;
pub mod transcript;

pub use context::{assemble, system_prompt};
pub use manager::{SessionManager, SessionSummary};
pub use session::{run_turn, Session, TurnEvent};
pub use transcript::{ChatSession, TurnState, GREETING};
