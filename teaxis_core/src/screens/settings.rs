use super::{signed_in, AppContext, Notice};

/// Account settings: sign out and account deletion
pub struct SettingsScreen {
    ctx: AppContext,
}

impl SettingsScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Delete the signed-in account. Nothing is sent unless `confirmed`; the
    /// session is cleared only once the backend deleted the account.
    pub async fn delete_account(&mut self, confirmed: bool) -> Result<Notice, Notice> {
        let user = signed_in(&self.ctx.session)?;
        if !confirmed {
            return Err(Notice::info(
                "Delete account",
                "Account deletion needs an explicit confirmation. This cannot be undone.",
            ));
        }

        match self.ctx.api.delete_user(user.id).await {
            Ok(()) => {
                tracing::info!("Deleted account {}", user.id);
                self.ctx.session.logout();
                Ok(Notice::success("Account deleted", "Your account was deleted."))
            }
            Err(e) => {
                tracing::warn!("Account deletion failed: {}", e);
                Err(Notice::from_error("Error", &e))
            }
        }
    }

    pub fn logout(&mut self) -> Notice {
        self.ctx.session.logout();
        Notice::info("Signed out", "You have been signed out.")
    }
}
