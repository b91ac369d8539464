use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use core_types::{default_templates, AnalysisResult, QuestionTemplate};
use parking_lot::Mutex;
use paperlens_api::{ApiError, BackendApi, QueryRequest};
use tracing::debug;

use crate::conversation::EMPTY_ANSWER_CONTENT;
use crate::ids;

/// Runs catalog questions against a document, keeping at most one result
/// per template. Re-running a template overwrites its previous result;
/// when the same template is raced, whichever reply lands last wins.
pub struct AnalysisRunner {
    api: Arc<dyn BackendApi>,
    catalog: Vec<QuestionTemplate>,
    results: Mutex<HashMap<String, AnalysisResult>>,
}

impl AnalysisRunner {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self::with_catalog(api, default_templates())
    }

    pub fn with_catalog(api: Arc<dyn BackendApi>, catalog: Vec<QuestionTemplate>) -> Self {
        Self {
            api,
            catalog,
            results: Mutex::new(HashMap::new()),
        }
    }

    pub fn templates(&self) -> &[QuestionTemplate] {
        &self.catalog
    }

    /// Snapshot of the results table, keyed by template id.
    pub fn results(&self) -> HashMap<String, AnalysisResult> {
        self.results.lock().clone()
    }

    pub fn result_for(&self, template_id: &str) -> Option<AnalysisResult> {
        self.results.lock().get(template_id).cloned()
    }

    pub fn clear_all(&self) {
        self.results.lock().clear();
    }

    /// Runs one template against the document. Each run uses a throwaway
    /// conversation id so analysis never pollutes chat history. Failures
    /// propagate and leave any previous result for the template intact.
    pub async fn run_one(
        &self,
        template_id: &str,
        document_path: &str,
    ) -> Result<AnalysisResult, ApiError> {
        let template = self
            .catalog
            .iter()
            .find(|template| template.id == template_id)
            .ok_or_else(|| {
                ApiError::Validation(format!("unknown analysis template: {template_id}"))
            })?;
        if document_path.trim().is_empty() {
            return Err(ApiError::Validation(
                "select a document before running analysis".to_owned(),
            ));
        }

        let request = QueryRequest {
            question: template.question.clone(),
            pdf_path: document_path.to_owned(),
            conversation_id: ids::analysis_conversation_id(template_id),
        };
        debug!(template_id, document = document_path, "running analysis");
        let reply = self.api.query_pdf(&request).await?;

        let result = AnalysisResult {
            question: template.question.clone(),
            document_path: document_path.to_owned(),
            answer: reply
                .answer
                .filter(|answer| !answer.trim().is_empty())
                .unwrap_or_else(|| EMPTY_ANSWER_CONTENT.to_owned()),
            completed_at: Utc::now(),
        };
        self.results
            .lock()
            .insert(template_id.to_owned(), result.clone());
        Ok(result)
    }

    /// Runs the whole catalog in order, continuing past failures. Returns
    /// each template id with its outcome.
    pub async fn run_all(
        &self,
        document_path: &str,
    ) -> Vec<(String, Result<AnalysisResult, ApiError>)> {
        let ids: Vec<String> = self
            .catalog
            .iter()
            .map(|template| template.id.clone())
            .collect();
        let mut outcomes = Vec::with_capacity(ids.len());
        for template_id in ids {
            let outcome = self.run_one(&template_id, document_path).await;
            outcomes.push((template_id, outcome));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::runtime::Runtime;

    use super::*;
    use crate::testing::MockBackend;

    const DOC: &str = "/Workspace/pdfs/report.pdf";

    #[test]
    fn run_one_stores_the_result_under_its_template() {
        let mock = MockBackend::arc();
        mock.answer("A concise summary.");
        let runner = AnalysisRunner::new(mock.clone());

        let runtime = Runtime::new().expect("runtime");
        let result = runtime
            .block_on(runner.run_one("summary", DOC))
            .expect("analysis");

        assert_eq!(result.answer, "A concise summary.");
        assert_eq!(result.document_path, DOC);
        assert_eq!(
            runner.result_for("summary").expect("stored result").answer,
            "A concise summary."
        );

        let requests = mock.query_requests.lock();
        assert!(requests[0].conversation_id.starts_with("analyze_summary_"));
        assert_eq!(requests[0].question, result.question);
    }

    #[test]
    fn rerunning_a_template_overwrites_its_result() {
        let mock = MockBackend::arc();
        mock.answer("First pass.");
        mock.answer("Second pass.");
        let runner = AnalysisRunner::new(mock);

        let runtime = Runtime::new().expect("runtime");
        runtime.block_on(async {
            runner.run_one("summary", DOC).await.expect("first run");
            runner.run_one("summary", DOC).await.expect("second run");
        });

        assert_eq!(runner.results().len(), 1);
        assert_eq!(
            runner.result_for("summary").expect("result").answer,
            "Second pass."
        );
    }

    #[test]
    fn failures_keep_the_previous_result() {
        let mock = MockBackend::arc();
        mock.answer("Original answer.");
        mock.query_fails("cluster unavailable");
        let runner = AnalysisRunner::new(mock);

        let runtime = Runtime::new().expect("runtime");
        runtime.block_on(async {
            runner.run_one("summary", DOC).await.expect("first run");
            let error = runner
                .run_one("summary", DOC)
                .await
                .expect_err("second run should fail");
            assert_eq!(error, ApiError::Backend("cluster unavailable".to_owned()));
        });

        assert_eq!(
            runner.result_for("summary").expect("result").answer,
            "Original answer."
        );
    }

    #[test]
    fn unknown_template_and_missing_document_are_rejected_locally() {
        let mock = MockBackend::arc();
        let runner = AnalysisRunner::new(mock.clone());

        let runtime = Runtime::new().expect("runtime");
        let unknown = runtime.block_on(runner.run_one("nonexistent", DOC));
        assert!(matches!(unknown, Err(ApiError::Validation(_))));

        let undirected = runtime.block_on(runner.run_one("summary", "  "));
        assert!(matches!(undirected, Err(ApiError::Validation(_))));

        assert_eq!(mock.query_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn run_all_continues_past_failures() {
        let mock = MockBackend::arc();
        mock.answer("Summary.");
        mock.query_fails("transient");
        mock.answer("Entities.");
        mock.answer("Figures.");
        mock.answer("Action items.");
        let runner = AnalysisRunner::new(mock);

        let runtime = Runtime::new().expect("runtime");
        let outcomes = runtime.block_on(runner.run_all(DOC));

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[0].1.is_ok());
        assert!(outcomes[1].1.is_err());
        assert!(outcomes[2].1.is_ok());
        assert_eq!(runner.results().len(), 4);
    }

    #[test]
    fn clear_all_empties_the_table() {
        let mock = MockBackend::arc();
        mock.answer("Summary.");
        let runner = AnalysisRunner::new(mock);

        let runtime = Runtime::new().expect("runtime");
        runtime
            .block_on(runner.run_one("summary", DOC))
            .expect("run");
        runner.clear_all();
        assert!(runner.results().is_empty());
    }
}
