pub mod analysis;
pub mod conversation;
pub mod gate;
pub mod ids;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::AnalysisRunner;
pub use conversation::{ConversationManager, SendOutcome};
pub use gate::SessionGate;
pub use services::{AppServices, AppServicesBuilder};
