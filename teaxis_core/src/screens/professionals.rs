//! Professional discovery: the list (with a patient's favorites) and the
//! detail screen where a patient schedules an appointment.

use super::{load_into, require_role, signed_in, AppContext, Loadable, Notice};
use crate::validation;
use crate::{
    AppointmentKind, Error, NewAppointment, Professional, UserRole,
    DEFAULT_DURATION_MINUTES,
};
use std::collections::HashSet;

const PATIENTS_ONLY_FAVORITES: &str = "Only patients can keep favorite professionals.";
const PATIENTS_ONLY_SCHEDULING: &str = "Only patients can schedule appointments.";

pub struct ProfessionalsScreen {
    ctx: AppContext,
    pub list: Loadable<Vec<Professional>>,
    /// Ids of favorited professionals; empty when unknown
    pub favorites: HashSet<i64>,
}

impl ProfessionalsScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            list: Loadable::Idle,
            favorites: HashSet::new(),
        }
    }

    /// Fetch the list and, for patients, their favorites at the same time.
    /// Only the list can fail the screen.
    pub async fn load(&mut self) -> Result<(), Notice> {
        let user = signed_in(&self.ctx.session)?;
        let api = self.ctx.api.clone();

        self.list = Loadable::Loading;
        let (list, favorites) = if user.is_patient() {
            let (list, favorites) = tokio::join!(api.professionals(), api.favorites());
            (list, Some(favorites))
        } else {
            (api.professionals().await, None)
        };

        match favorites {
            Some(Ok(favorites)) => {
                self.favorites = favorites.iter().map(|f| f.professional.id).collect();
            }
            Some(Err(e)) => {
                tracing::warn!("Could not load favorites: {}", e);
                self.favorites.clear();
            }
            None => self.favorites.clear(),
        }

        load_into(&mut self.list, "Could not load professionals", async move { list }).await
    }

    pub fn is_favorite(&self, professional_id: i64) -> bool {
        self.favorites.contains(&professional_id)
    }

    /// Add or remove a favorite; the marker only flips after the server
    /// confirmed
    pub async fn toggle_favorite(&mut self, professional_id: i64) -> Result<Notice, Notice> {
        require_role(&self.ctx.session, UserRole::Patient, PATIENTS_ONLY_FAVORITES)?;

        if self.is_favorite(professional_id) {
            match self.ctx.api.remove_favorite(professional_id).await {
                Ok(()) => {
                    self.favorites.remove(&professional_id);
                    Ok(Notice::success("Favorites", "Removed from favorites."))
                }
                Err(e) => Err(Notice::from_error("Error", &e)),
            }
        } else {
            match self.ctx.api.add_favorite(professional_id).await {
                Ok(()) => {
                    self.favorites.insert(professional_id);
                    Ok(Notice::success("Favorites", "Added to favorites!"))
                }
                Err(e) => Err(Notice::from_error("Error", &e)),
            }
        }
    }
}

/// Raw scheduling form input
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleForm {
    /// `YYYY-MM-DDTHH:MM:SS`
    pub date_time: String,
    pub kind: AppointmentKind,
    pub location: String,
    pub notes: String,
    pub duration: String,
}

impl Default for ScheduleForm {
    fn default() -> Self {
        Self {
            date_time: String::new(),
            kind: AppointmentKind::Online,
            location: String::new(),
            notes: String::new(),
            duration: DEFAULT_DURATION_MINUTES.to_string(),
        }
    }
}

impl ScheduleForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_request(&self, professional_id: i64) -> Result<NewAppointment, Error> {
        let scheduled_for = validation::validate_schedule(&self.date_time, &self.location)?;
        Ok(NewAppointment {
            professional_id,
            scheduled_for,
            kind: self.kind,
            location: validation::non_blank(&self.location),
            user_notes: validation::non_blank(&self.notes),
            duration_minutes: Some(validation::parse_duration(
                &self.duration,
                DEFAULT_DURATION_MINUTES,
            )),
        })
    }
}

pub struct ProfessionalDetailScreen {
    ctx: AppContext,
    professional_id: i64,
    pub view: Loadable<Professional>,
    pub form: ScheduleForm,
}

impl ProfessionalDetailScreen {
    pub fn new(ctx: AppContext, professional_id: i64) -> Self {
        Self {
            ctx,
            professional_id,
            view: Loadable::Idle,
            form: ScheduleForm::default(),
        }
    }

    pub fn professional_id(&self) -> i64 {
        self.professional_id
    }

    pub async fn load(&mut self) -> Result<(), Notice> {
        let api = self.ctx.api.clone();
        load_into(
            &mut self.view,
            "Could not load the professional",
            api.professional(self.professional_id),
        )
        .await
    }

    /// Request an appointment with this professional. The form is cleared
    /// only when the backend accepted it.
    pub async fn schedule(&mut self) -> Result<Notice, Notice> {
        require_role(&self.ctx.session, UserRole::Patient, PATIENTS_ONLY_SCHEDULING)?;
        let request = self
            .form
            .to_request(self.professional_id)
            .map_err(|e| Notice::from_error("Error", &e))?;

        match self.ctx.api.create_appointment(&request).await {
            Ok(()) => {
                tracing::info!(
                    "Scheduled appointment with professional {} at {}",
                    self.professional_id,
                    request.scheduled_for
                );
                self.form.reset();
                Ok(Notice::success("Success", "Appointment scheduled successfully!"))
            }
            Err(e) => {
                tracing::warn!("Scheduling failed: {}", e);
                Err(Notice::from_error("Scheduling error", &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{offline_context, user};
    use crate::validation::ValidationError;

    #[test]
    fn test_schedule_form_defaults() {
        let form = ScheduleForm::default();
        assert_eq!(form.duration, "50");
        assert_eq!(form.kind, AppointmentKind::Online);
    }

    #[test]
    fn test_schedule_form_to_request() {
        let form = ScheduleForm {
            date_time: "2025-07-15T14:00:00".into(),
            location: "https://meet.example/abc".into(),
            notes: "  ".into(),
            duration: "abc".into(),
            ..Default::default()
        };
        let request = form.to_request(4).unwrap();
        assert_eq!(request.professional_id, 4);
        assert_eq!(request.user_notes, None);
        assert_eq!(request.duration_minutes, Some(50));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dataHoraAgendamento"], "2025-07-15T14:00:00");
        assert_eq!(json["tipoAtendimento"], "ONLINE");
    }

    #[test]
    fn test_schedule_form_requires_location() {
        let form = ScheduleForm {
            date_time: "2025-07-15T14:00:00".into(),
            ..Default::default()
        };
        let err = form.to_request(4).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingFields(ref f)) if f == &vec!["place or link"]
        ));
    }

    #[tokio::test]
    async fn test_professionals_cannot_schedule() {
        let ctx = offline_context();
        ctx.session.login(user("PROFISSIONAL"), "t").unwrap();
        let mut screen = ProfessionalDetailScreen::new(ctx, 4);
        screen.form.date_time = "2025-07-15T14:00:00".into();
        screen.form.location = "room 2".into();

        let notice = screen.schedule().await.unwrap_err();
        assert_eq!(notice.title, "Access denied");
        // form survives a refusal
        assert_eq!(screen.form.location, "room 2");
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_favorites() {
        let ctx = offline_context();
        ctx.session.login(user("USUARIO"), "t").unwrap();
        let mut screen = ProfessionalsScreen::new(ctx);
        screen.favorites.insert(4);

        assert!(screen.toggle_favorite(4).await.is_err());
        assert!(screen.is_favorite(4));
    }

    #[tokio::test]
    async fn test_load_requires_sign_in() {
        let mut screen = ProfessionalsScreen::new(offline_context());
        let notice = screen.load().await.unwrap_err();
        assert_eq!(notice.title, "Not signed in");
        assert_eq!(screen.list, Loadable::Idle);
    }
}
