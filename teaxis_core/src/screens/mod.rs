//! Screen controllers.
//!
//! One controller per feature area. Each is built from an [`AppContext`]
//! and follows the same contract:
//! - reads set a [`Loadable`] and return `Result<(), Notice>`;
//! - mutations return `Ok(Notice)` (acknowledgment) or `Err(Notice)`, and
//!   only change local state after the backend confirmed;
//! - role-gated actions are refused locally, before any request.
//!
//! Mutating methods take `&mut self`, so a control cannot fire twice while
//! its call is in flight. Dropping a screen drops its pending future.

pub mod appointments;
pub mod auth;
pub mod matching;
pub mod professionals;
pub mod profile;
pub mod settings;

use crate::api::ApiClient;
use crate::config::Config;
use crate::session::{SessionPhase, SessionStore};
use crate::{Error, Result, User, UserRole};
use std::fmt;
use std::future::Future;

pub use appointments::{AppointmentDetailScreen, AppointmentsScreen};
pub use auth::{HomeScreen, LoginScreen, RegisterScreen};
pub use matching::MatchingScreen;
pub use professionals::{ProfessionalDetailScreen, ProfessionalsScreen};
pub use profile::{ProfessionalProfileScreen, UserProfileScreen};
pub use settings::SettingsScreen;

/// Everything a screen needs, injected at construction
#[derive(Clone, Debug)]
pub struct AppContext {
    pub session: SessionStore,
    pub api: ApiClient,
}

impl AppContext {
    /// Build a context whose API client shares `api`'s session
    pub fn new(api: ApiClient) -> Self {
        Self {
            session: api.session().clone(),
            api,
        }
    }

    /// Restore the persisted session and connect to the configured backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = SessionStore::open(config.session_path());
        let api = ApiClient::from_config(&config.api, session.clone())?;
        Ok(Self { session, api })
    }

    /// Screens reachable right now
    pub fn screen_set(&self) -> ScreenSet {
        ScreenSet::for_phase(self.session.phase())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A user-facing alert
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Alert for a failed action; validation and gating errors keep their
    /// own titles, backend errors use `title`
    pub fn from_error(title: &str, error: &Error) -> Self {
        match error {
            Error::Validation(v) => Self::error(v.title(), v.to_string()),
            Error::Api(api) => Self::error(title, api.message.clone()),
            Error::AccessDenied(reason) => Self::error("Access denied", reason.clone()),
            Error::NotSignedIn => Self::error("Not signed in", "Please sign in first."),
            other => Self::error(title, other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// View state of data fetched from the backend
#[derive(Clone, Debug, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(Notice),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Idle
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn failure(&self) -> Option<&Notice> {
        match self {
            Loadable::Failed(notice) => Some(notice),
            _ => None,
        }
    }
}

/// Run a read into `slot`: loading while pending, then ready or failed
pub(crate) async fn load_into<T, F>(
    slot: &mut Loadable<T>,
    title: &str,
    read: F,
) -> std::result::Result<(), Notice>
where
    F: Future<Output = Result<T>>,
{
    *slot = Loadable::Loading;
    match read.await {
        Ok(value) => {
            *slot = Loadable::Ready(value);
            Ok(())
        }
        Err(e) => {
            tracing::warn!("{}: {}", title, e);
            let notice = Notice::from_error(title, &e);
            *slot = Loadable::Failed(notice.clone());
            Err(notice)
        }
    }
}

/// The signed-in user, or a "not signed in" alert
pub(crate) fn signed_in(session: &SessionStore) -> std::result::Result<User, Notice> {
    crate::api::require_user(session).map_err(|e| Notice::from_error("Error", &e))
}

/// The signed-in user if they hold `role`; refused locally otherwise
pub(crate) fn require_role(
    session: &SessionStore,
    role: UserRole,
    denial: &str,
) -> std::result::Result<User, Notice> {
    let user = signed_in(session)?;
    if user.role == role {
        Ok(user)
    } else {
        tracing::debug!("Refusing action for role {}: {}", user.role, denial);
        Err(Notice::from_error("Error", &Error::AccessDenied(denial.to_string())))
    }
}

// ============================================================================
// Navigation gate
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Welcome,
    Login,
    Register,
    Home,
    UserProfile,
    ProfessionalProfile,
    Professionals,
    ProfessionalDetail,
    Appointments,
    AppointmentDetail,
    Matching,
    Settings,
}

/// Which screens exist for the current session phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenSet {
    Anonymous,
    Authenticated,
}

impl ScreenSet {
    pub fn for_phase(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Anonymous => ScreenSet::Anonymous,
            SessionPhase::Authenticated => ScreenSet::Authenticated,
        }
    }

    pub fn routes(&self) -> &'static [Route] {
        match self {
            ScreenSet::Anonymous => &[Route::Welcome, Route::Login, Route::Register],
            ScreenSet::Authenticated => &[
                Route::Home,
                Route::UserProfile,
                Route::ProfessionalProfile,
                Route::Professionals,
                Route::ProfessionalDetail,
                Route::Appointments,
                Route::AppointmentDetail,
                Route::Matching,
                Route::Settings,
            ],
        }
    }

    pub fn allows(&self, route: Route) -> bool {
        self.routes().contains(&route)
    }

    /// Where the app lands for this phase
    pub fn landing(&self) -> Route {
        match self {
            ScreenSet::Anonymous => Route::Welcome,
            ScreenSet::Authenticated => Route::Home,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_screen_sets() {
        let anon = ScreenSet::for_phase(SessionPhase::Anonymous);
        assert!(anon.allows(Route::Login));
        assert!(!anon.allows(Route::Appointments));
        assert_eq!(anon.landing(), Route::Welcome);

        let auth = ScreenSet::for_phase(SessionPhase::Authenticated);
        assert!(auth.allows(Route::Matching));
        assert!(!auth.allows(Route::Register));
        assert_eq!(auth.landing(), Route::Home);
    }

    #[test]
    fn test_context_follows_session() {
        let ctx = testing::offline_context();
        assert_eq!(ctx.screen_set(), ScreenSet::Anonymous);
        ctx.session.login(testing::user("USUARIO"), "t").unwrap();
        assert_eq!(ctx.screen_set(), ScreenSet::Authenticated);
    }

    #[test]
    fn test_notice_titles() {
        let n = Notice::from_error("Login error", &ValidationError::InvalidEmail.into());
        assert_eq!(n.title, "Invalid e-mail");

        let n = Notice::from_error("Error", &Error::AccessDenied("nope".into()));
        assert_eq!(n.title, "Access denied");
        assert_eq!(n.message, "nope");
        assert!(n.is_error());
    }

    #[test]
    fn test_role_gate() {
        let ctx = testing::offline_context();
        let denied = require_role(&ctx.session, UserRole::Patient, "patients only").unwrap_err();
        assert_eq!(denied.title, "Not signed in");

        ctx.session.login(testing::user("PROFISSIONAL"), "t").unwrap();
        let denied = require_role(&ctx.session, UserRole::Patient, "patients only").unwrap_err();
        assert_eq!(denied.message, "patients only");
        assert!(require_role(&ctx.session, UserRole::Professional, "x").is_ok());
    }
}
