use super::{load_into, require_role, AppContext, Loadable, Notice};
use crate::{Matching, UserRole};

const NO_SUGGESTIONS: &str = "No professional matches your profile yet. \
    Completing your neurodivergence type, sensory preferences, communication mode \
    and hobbies in your profile helps us find better matches.";

/// Professionals the backend suggests for the signed-in patient
pub struct MatchingScreen {
    ctx: AppContext,
    pub suggestions: Loadable<Vec<Matching>>,
}

impl MatchingScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            suggestions: Loadable::Idle,
        }
    }

    /// Ask for fresh suggestions. An empty answer is not an error; it comes
    /// back as an info notice with hints for completing the profile.
    pub async fn suggest(&mut self) -> Result<Option<Notice>, Notice> {
        require_role(
            &self.ctx.session,
            UserRole::Patient,
            "Matching suggestions are only available to patients.",
        )?;

        let api = self.ctx.api.clone();
        load_into(
            &mut self.suggestions,
            "Could not fetch suggestions",
            api.suggest_matchings(),
        )
        .await?;

        let count = self.suggestions.ready().map_or(0, Vec::len);
        tracing::info!("Received {} matching suggestions", count);
        if count == 0 {
            Ok(Some(Notice::info("No suggestions", NO_SUGGESTIONS)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{offline_context, user};

    #[tokio::test]
    async fn test_professionals_are_refused() {
        let ctx = offline_context();
        ctx.session.login(user("PROFISSIONAL"), "t").unwrap();
        let mut screen = MatchingScreen::new(ctx);

        let notice = screen.suggest().await.unwrap_err();
        assert_eq!(notice.title, "Access denied");
        assert_eq!(screen.suggestions, Loadable::Idle);
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_the_screen() {
        let ctx = offline_context();
        ctx.session.login(user("USUARIO"), "t").unwrap();
        let mut screen = MatchingScreen::new(ctx);

        let notice = screen.suggest().await.unwrap_err();
        assert_eq!(notice.title, "Could not fetch suggestions");
        assert!(screen.suggestions.failure().is_some());
    }
}
