pub mod analysis;
pub mod chat;
pub mod connection;
pub mod document;
pub mod route;

pub use analysis::{AnalysisResult, QuestionTemplate, default_templates};
pub use chat::{ChatMessage, MessageRole};
pub use connection::ConnectionState;
pub use document::Document;
pub use route::AppRoute;
