use crate::connection::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Dashboard,
    Upload,
    Chat,
    Analysis,
    Settings,
}

impl AppRoute {
    pub const ALL: [AppRoute; 5] = [
        AppRoute::Dashboard,
        AppRoute::Upload,
        AppRoute::Chat,
        AppRoute::Analysis,
        AppRoute::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AppRoute::Dashboard => "Dashboard",
            AppRoute::Upload => "Upload",
            AppRoute::Chat => "Chat",
            AppRoute::Analysis => "Analysis",
            AppRoute::Settings => "Settings",
        }
    }

    /// Pure enablement rule, recomputed on every check.
    pub fn enabled(self, state: ConnectionState) -> bool {
        match self {
            AppRoute::Dashboard | AppRoute::Settings => true,
            AppRoute::Upload => state.platform_connected(),
            AppRoute::Chat | AppRoute::Analysis => {
                state.platform_connected() && state.ai_configured()
            }
        }
    }

    /// Disabled routes redirect to Settings instead of rendering.
    pub fn resolve(self, state: ConnectionState) -> AppRoute {
        if self.enabled(state) {
            self
        } else {
            AppRoute::Settings
        }
    }
}
