use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A PDF previously uploaded to the workspace, as known to the client.
/// The workspace path is the opaque unique key; the set of known documents
/// is replaced wholesale on every list refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub workspace_path: String,
    pub display_name: String,
    pub size_bytes: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(workspace_path: impl Into<String>) -> Self {
        let workspace_path = workspace_path.into();
        let display_name = workspace_path
            .rsplit('/')
            .next()
            .unwrap_or(workspace_path.as_str())
            .to_owned();
        Self {
            workspace_path,
            display_name,
            size_bytes: 0,
            uploaded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_path_basename() {
        let document = Document::new("/Workspace/pdfs/report-2024.pdf");
        assert_eq!(document.display_name, "report-2024.pdf");
    }

    #[test]
    fn bare_path_is_its_own_display_name() {
        let document = Document::new("report.pdf");
        assert_eq!(document.display_name, "report.pdf");
    }
}
