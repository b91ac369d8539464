mod backend;
mod error;
mod http;

pub use backend::{
    AiConfigRequest, BackendApi, ConfigureOutcome, ConnectOutcome, HealthReport, HistoryReply,
    QueryReply, QueryRequest, StatusReport, UploadReceipt, UploadRequest,
};
pub use error::ApiError;
pub use http::HttpBackendClient;
