use std::sync::Arc;

use config::AppConfig;
use core_types::{AppRoute, ConnectionState};
use parking_lot::Mutex;
use paperlens_api::{AiConfigRequest, ApiError, BackendApi, ConfigureOutcome, ConnectOutcome};
use tracing::{info, warn};

/// Tracks the platform connection and AI configuration as a single state
/// machine, and decides which routes are reachable. AI configuration is
/// never reported without a live platform connection.
pub struct SessionGate {
    api: Arc<dyn BackendApi>,
    state: Mutex<ConnectionState>,
}

impl SessionGate {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Where a navigation request actually lands given the current state.
    pub fn resolve_route(&self, requested: AppRoute) -> AppRoute {
        requested.resolve(self.state())
    }

    /// Startup sequence: probe for an existing backend connection; when the
    /// probe already reports connected, adopt it and stop. Only a fresh
    /// auto-connect goes on to apply the configured AI defaults. Every step
    /// is best-effort; the resulting state reflects whatever succeeded.
    pub async fn initialize(&self, config: &AppConfig) -> ConnectionState {
        let already_connected = match self.api.status().await {
            Ok(report) => report.connected,
            Err(error) => {
                info!(error = %error, "no existing platform connection");
                false
            }
        };

        if already_connected {
            let mut state = self.state.lock();
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connected;
            }
            return *state;
        }

        if let Some(auto) = &config.auto_connect {
            match self.connect(&auto.host, &auto.token).await {
                Ok(outcome) => {
                    info!(message = %outcome.message, "auto-connect succeeded");
                    if let Some(defaults) = &config.ai_defaults {
                        let request =
                            AiConfigRequest::new(defaults.provider.clone(), defaults.model.clone());
                        match self.configure_ai(&request).await {
                            Ok(outcome) => info!(model = %outcome.model, "ai defaults applied"),
                            Err(error) => warn!(error = %error, "ai auto-configuration failed"),
                        }
                    }
                }
                Err(error) => warn!(error = %error, "auto-connect failed"),
            }
        }

        self.state()
    }

    /// Connects to the platform with explicit credentials. Success replaces
    /// the whole state with `Connected`: one connect request stands alone,
    /// so a previous AI configuration no longer applies. Failure leaves the
    /// state as it was.
    pub async fn connect(&self, host: &str, token: &str) -> Result<ConnectOutcome, ApiError> {
        let host = host.trim();
        let token = token.trim();
        if host.is_empty() || token.is_empty() {
            return Err(ApiError::Validation(
                "host and token are both required".to_owned(),
            ));
        }

        let outcome = self.api.connect(host, token).await?;
        *self.state.lock() = ConnectionState::Connected;
        Ok(outcome)
    }

    /// Configures the AI provider. The session only becomes `Ready` when a
    /// platform connection is already established; a success reported while
    /// disconnected cannot promote the state.
    pub async fn configure_ai(
        &self,
        request: &AiConfigRequest,
    ) -> Result<ConfigureOutcome, ApiError> {
        if request.model.trim().is_empty() {
            return Err(ApiError::Validation("a model name is required".to_owned()));
        }

        let outcome = self.api.configure_ai(request).await?;
        let mut state = self.state.lock();
        if state.platform_connected() {
            *state = ConnectionState::Ready;
        }
        Ok(outcome)
    }

    /// Re-probes the backend connection. A dead connection drops the whole
    /// session; a live one restores at least `Connected`.
    pub async fn refresh(&self) -> ConnectionState {
        let connected = match self.api.status().await {
            Ok(report) => report.connected,
            Err(error) => {
                info!(error = %error, "status probe failed; treating as disconnected");
                false
            }
        };

        let mut state = self.state.lock();
        if connected {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connected;
            }
        } else {
            *state = ConnectionState::Disconnected;
        }
        *state
    }
}
