//! Editing the signed-in user's own profile, and the professional profile
//! that professionals publish.

use super::{load_into, require_role, signed_in, AppContext, Loadable, Notice};
use crate::validation::{self, ValidationError};
use crate::{Error, Gender, Professional, ProfessionalProfileUpdate, ProfilePatch, User, UserRole};

// ============================================================================
// User profile
// ============================================================================

/// Editable text fields of the profile form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
    pub city: String,
    pub state: String,
    pub neurodivergence: String,
    pub sensory_preferences: String,
    pub communication_mode: String,
    pub school_history: String,
    /// Comma-separated
    pub hobbies: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            birth_date: user
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            gender: user.gender,
            city: user.city.clone().unwrap_or_default(),
            state: user.state.clone().unwrap_or_default(),
            neurodivergence: user.neurodivergence.clone().unwrap_or_default(),
            sensory_preferences: user.sensory_preferences.clone().unwrap_or_default(),
            communication_mode: user.communication_mode.clone().unwrap_or_default(),
            school_history: user.school_history.clone().unwrap_or_default(),
            hobbies: user.hobbies.clone().unwrap_or_default().join(", "),
        }
    }

    /// Every field is sent, so clearing a field clears it on the server
    pub fn to_patch(&self) -> Result<ProfilePatch, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingFields(vec!["name"]));
        }
        let birth_date = if self.birth_date.trim().is_empty() {
            None
        } else {
            Some(validation::parse_date(&self.birth_date)?)
        };

        Ok(ProfilePatch {
            name: Some(self.name.trim().to_string()),
            birth_date,
            gender: self.gender,
            city: Some(self.city.trim().to_string()),
            state: Some(self.state.trim().to_string()),
            neurodivergence: Some(self.neurodivergence.trim().to_string()),
            sensory_preferences: Some(self.sensory_preferences.trim().to_string()),
            communication_mode: Some(self.communication_mode.trim().to_string()),
            school_history: Some(self.school_history.trim().to_string()),
            hobbies: Some(validation::split_list(&self.hobbies)),
            ..Default::default()
        })
    }
}

pub struct UserProfileScreen {
    ctx: AppContext,
    pub view: Loadable<User>,
    pub form: ProfileForm,
}

impl UserProfileScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            view: Loadable::Idle,
            form: ProfileForm::default(),
        }
    }

    /// Show the profile held by the session, fetching it if the session has
    /// none
    pub async fn load(&mut self) -> Result<(), Notice> {
        match self.ctx.session.current_user() {
            Some(user) => {
                self.form = ProfileForm::from_user(&user);
                self.view = Loadable::Ready(user);
                Ok(())
            }
            None => self.refresh().await,
        }
    }

    /// Fetch `/usuarios/me` and merge it into the session
    pub async fn refresh(&mut self) -> Result<(), Notice> {
        if self.ctx.session.token().is_none() {
            let notice = Notice::from_error("Error", &Error::NotSignedIn);
            self.view = Loadable::Failed(notice.clone());
            return Err(notice);
        }

        let api = self.ctx.api.clone();
        load_into(&mut self.view, "Could not load your profile", api.me()).await?;
        if let Some(user) = self.view.ready() {
            self.ctx.session.update_profile(ProfilePatch::from(user.clone()));
            self.form = ProfileForm::from_user(user);
        }
        Ok(())
    }

    /// Submit the form; the session is updated from the server's echo
    pub async fn save(&mut self) -> Result<Notice, Notice> {
        let user = signed_in(&self.ctx.session)?;
        let patch = self
            .form
            .to_patch()
            .map_err(|e| Notice::from_error("Error", &Error::from(e)))?;

        match self.ctx.api.update_user(user.id, &patch).await {
            Ok(updated) => {
                self.ctx.session.update_profile(ProfilePatch::from(updated.clone()));
                self.form = ProfileForm::from_user(&updated);
                self.view = Loadable::Ready(updated);
                Ok(Notice::success("Success", "Profile updated successfully!"))
            }
            Err(e) => {
                tracing::warn!("Profile update failed: {}", e);
                Err(Notice::from_error("Error", &e))
            }
        }
    }
}

// ============================================================================
// Professional profile
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileMode {
    /// Showing a stored profile
    View,
    /// No profile exists yet; saving creates it
    Create,
}

/// Comma-separated list fields plus free-text availability
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfessionalForm {
    pub availability: String,
    pub certifications: String,
    pub specializations: String,
    pub methods: String,
    pub hobbies: String,
}

impl ProfessionalForm {
    pub fn from_profile(p: &Professional) -> Self {
        let join = |v: &Option<Vec<String>>| v.clone().unwrap_or_default().join(", ");
        Self {
            availability: p.availability.clone().unwrap_or_default(),
            certifications: join(&p.certifications),
            specializations: join(&p.specializations),
            methods: join(&p.methods),
            hobbies: join(&p.hobbies),
        }
    }

    pub fn to_update(&self) -> ProfessionalProfileUpdate {
        ProfessionalProfileUpdate {
            availability: self.availability.trim().to_string(),
            certifications: validation::split_list(&self.certifications),
            specializations: validation::split_list(&self.specializations),
            methods: validation::split_list(&self.methods),
            hobbies: validation::split_list(&self.hobbies),
        }
    }
}

const PROFESSIONALS_ONLY: &str = "Only professionals have a professional profile.";

pub struct ProfessionalProfileScreen {
    ctx: AppContext,
    pub view: Loadable<Professional>,
    pub mode: ProfileMode,
    pub form: ProfessionalForm,
    /// Set when there is no profile yet
    pub hint: Option<Notice>,
}

impl ProfessionalProfileScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            view: Loadable::Idle,
            mode: ProfileMode::View,
            form: ProfessionalForm::default(),
            hint: None,
        }
    }

    /// Fetch the caller's professional profile. A 404 is not an error: it
    /// switches the screen to [`ProfileMode::Create`].
    pub async fn load(&mut self) -> Result<(), Notice> {
        require_role(&self.ctx.session, UserRole::Professional, PROFESSIONALS_ONLY)?;

        self.view = Loadable::Loading;
        match self.ctx.api.my_professional_profile().await {
            Ok(profile) => {
                self.form = ProfessionalForm::from_profile(&profile);
                self.mode = ProfileMode::View;
                self.hint = None;
                self.view = Loadable::Ready(profile);
                Ok(())
            }
            Err(e) if e.as_api().is_some_and(|api| api.is_not_found()) => {
                tracing::info!("No professional profile yet, switching to create mode");
                self.mode = ProfileMode::Create;
                self.hint = Some(Notice::info(
                    "Professional profile",
                    "You have no professional profile yet. Fill in the form to create one.",
                ));
                self.view = Loadable::Idle;
                Ok(())
            }
            Err(e) => {
                let notice = Notice::from_error("Could not load your professional profile", &e);
                self.view = Loadable::Failed(notice.clone());
                Err(notice)
            }
        }
    }

    /// Create or update the profile from the form, then reload it
    pub async fn save(&mut self) -> Result<Notice, Notice> {
        require_role(&self.ctx.session, UserRole::Professional, PROFESSIONALS_ONLY)?;

        let update = self.form.to_update();
        if let Err(e) = self.ctx.api.save_professional_profile(&update).await {
            tracing::warn!("Professional profile update failed: {}", e);
            return Err(Notice::from_error("Error", &e));
        }

        if let Err(refresh) = self.load().await {
            tracing::warn!("Saved, but reloading the profile failed: {}", refresh);
        }
        Ok(Notice::success(
            "Success",
            "Professional profile updated successfully!",
        ))
    }

    /// Ask the backend to turn the caller's account into a professional one
    pub async fn become_professional(&mut self) -> Result<Notice, Notice> {
        let user = require_role(
            &self.ctx.session,
            UserRole::Patient,
            "Your account is already a professional account.",
        )?;

        match self.ctx.api.become_professional(user.id).await {
            Ok(promoted) => {
                self.ctx.session.update_profile(ProfilePatch::from(promoted));
                self.mode = ProfileMode::Create;
                self.view = Loadable::Idle;
                Ok(Notice::success(
                    "Success",
                    "Your account is now a professional account. Complete your professional profile!",
                ))
            }
            Err(e) => Err(Notice::from_error("Error", &e)),
        }
    }
}
