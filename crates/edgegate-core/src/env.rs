//! Process-wide gateway environment
//!
//! [`Env`] is read-only for the lifetime of a request. Every request holds an
//! `Arc<Env>`; loading it from process variables lives in
//! `edgegate_extras::config`.

/// Deployment profile
///
/// Loaded from `EDGEGATE_ENV` by `edgegate_extras::config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Verbose errors and debug logging
    #[default]
    Development,
    /// Error details are masked in responses
    Production,
}

impl Profile {
    /// Map a profile name to a profile
    ///
    /// `production`/`prod` select production, anything else development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether internal error details may be shown to clients
    pub fn show_error_details(&self) -> bool {
        !self.is_production()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Gateway environment: feature flags and collaborator endpoints
#[derive(Debug, Clone, Default)]
pub struct Env {
    /// Whether egress bytes are measured and reported
    pub egress_tracking_enabled: bool,
    /// Base URL of the usage accounting service
    pub accounting_service_url: Option<String>,
    /// Deployment profile
    pub profile: Profile,
}

impl Env {
    /// An environment with every feature flag off
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_egress_tracking(mut self, enabled: bool) -> Self {
        self.egress_tracking_enabled = enabled;
        self
    }

    pub fn with_accounting_service_url(mut self, url: impl Into<String>) -> Self {
        self.accounting_service_url = Some(url.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn is_production(&self) -> bool {
        self.profile.is_production()
    }
}
