//! Sign-in, registration and the signed-in landing screen.

use super::{AppContext, Notice};
use crate::failure::SESSION_EXPIRED;
use crate::validation::{self, RegistrationForm};
use crate::{Error, Registration, UserRole};

const INVALID_CREDENTIALS: &str = "Invalid e-mail or password.";

pub struct LoginScreen {
    ctx: AppContext,
    pub email: String,
    pub password: String,
}

impl LoginScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            email: String::new(),
            password: String::new(),
        }
    }

    pub async fn submit(&mut self) -> Result<Notice, Notice> {
        validation::validate_login(&self.email, &self.password)
            .map_err(|e| Notice::from_error("Login error", &Error::from(e)))?;

        match self.ctx.api.login(self.email.trim(), &self.password).await {
            Ok(user) => {
                self.password.clear();
                Ok(Notice::success("Signed in", format!("Welcome, {}!", user.name)))
            }
            // a 401 here means bad credentials, not an expired session
            Err(Error::Api(e)) if e.is_unauthorized() && e.message == SESSION_EXPIRED => {
                Err(Notice::error("Login error", INVALID_CREDENTIALS))
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                Err(Notice::from_error("Login error", &e))
            }
        }
    }
}

pub struct RegisterScreen {
    ctx: AppContext,
    pub form: RegistrationForm,
}

impl RegisterScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            form: RegistrationForm::default(),
        }
    }

    /// Self-registration always creates a patient account
    pub async fn submit(&mut self) -> Result<Notice, Notice> {
        let birth_date = validation::validate_registration(&self.form)
            .map_err(|e| Notice::from_error("Registration error", &Error::from(e)))?;

        let registration = Registration {
            name: self.form.name.trim().to_string(),
            email: self.form.email.trim().to_string(),
            password: self.form.password.clone(),
            birth_date,
            role: UserRole::Patient,
            neurodivergence: validation::non_blank(&self.form.neurodivergence),
            communication_mode: validation::non_blank(&self.form.communication_mode),
            sensory_preferences: validation::non_blank(&self.form.sensory_preferences),
            hobbies: validation::split_list(&self.form.hobbies),
        };

        match self.ctx.api.register(&registration).await {
            Ok(()) => {
                tracing::info!("Registered {}", self.form);
                self.form = RegistrationForm::default();
                Ok(Notice::success(
                    "Success",
                    "Your account was created! Sign in to continue.",
                ))
            }
            Err(e) => Err(Notice::from_error("Registration error", &e)),
        }
    }
}

pub struct HomeScreen {
    ctx: AppContext,
}

impl HomeScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn greeting(&self) -> Option<String> {
        self.ctx.session.current_user().map(|user| {
            format!("Hello, {}! You are signed in as a {}.", user.name, user.role)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{offline_context, user};
    use crate::failure::CONNECTIVITY;

    #[tokio::test]
    async fn test_login_validation_happens_before_network() {
        let mut screen = LoginScreen::new(offline_context());
        let notice = screen.submit().await.unwrap_err();
        assert_eq!(notice.title, "Required fields");
    }

    #[tokio::test]
    async fn test_login_unreachable_backend() {
        let mut screen = LoginScreen::new(offline_context());
        screen.email = "ana@x.com".into();
        screen.password = "secret1".into();
        let notice = screen.submit().await.unwrap_err();
        assert_eq!(notice.title, "Login error");
        assert_eq!(notice.message, CONNECTIVITY);
    }

    #[tokio::test]
    async fn test_register_rejects_mismatch() {
        let mut screen = RegisterScreen::new(offline_context());
        screen.form = RegistrationForm {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
            confirm_password: "secret2".into(),
            birth_date: "1995-08-20".into(),
            ..Default::default()
        };
        let notice = screen.submit().await.unwrap_err();
        assert_eq!(notice.title, "Password error");
        // form is kept for correction
        assert_eq!(screen.form.name, "Ana");
    }

    #[test]
    fn test_greeting() {
        let ctx = offline_context();
        let home = HomeScreen::new(ctx.clone());
        assert!(home.greeting().is_none());

        ctx.session.login(user("PROFISSIONAL"), "t").unwrap();
        assert_eq!(
            home.greeting().unwrap(),
            "Hello, Ana! You are signed in as a professional."
        );
    }
}
