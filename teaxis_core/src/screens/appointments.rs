//! The caller's appointments and the per-appointment detail screen: status
//! changes, patient cancellation and rating.
//!
//! Who may do what is decided by the pure functions at the top of this
//! module; the screens check them before sending anything.

use super::{load_into, signed_in, AppContext, Loadable, Notice};
use crate::validation;
use crate::{
    Appointment, AppointmentStatus, Error, NewRating, Rating, StatusChange, User, UserRole,
};

// ============================================================================
// Permissions
// ============================================================================

/// One-tap transitions offered in the list for an appointment
pub fn quick_actions(role: UserRole, status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match (role, status) {
        (UserRole::Professional, AppointmentStatus::Scheduled) => &[
            AppointmentStatus::Completed,
            AppointmentStatus::CancelledByProfessional,
        ],
        (UserRole::Patient, AppointmentStatus::Scheduled) => {
            &[AppointmentStatus::CancelledByPatient]
        }
        _ => &[],
    }
}

/// Statuses a professional may pick in the detail screen
pub const PROFESSIONAL_STATUS_OPTIONS: [AppointmentStatus; 3] = [
    AppointmentStatus::Scheduled,
    AppointmentStatus::Completed,
    AppointmentStatus::CancelledByProfessional,
];

/// A professional may change the status unless either party cancelled
pub fn can_update_status(role: UserRole, status: AppointmentStatus) -> bool {
    role == UserRole::Professional
        && !matches!(
            status,
            AppointmentStatus::CancelledByPatient | AppointmentStatus::CancelledByProfessional
        )
}

pub fn can_cancel(role: UserRole, status: AppointmentStatus) -> bool {
    role == UserRole::Patient && status == AppointmentStatus::Scheduled
}

pub fn can_rate(role: UserRole, status: AppointmentStatus) -> bool {
    role == UserRole::Patient && status == AppointmentStatus::Completed
}

fn denied(reason: &str) -> Notice {
    Notice::from_error("Error", &Error::AccessDenied(reason.to_string()))
}

// ============================================================================
// List
// ============================================================================

pub struct AppointmentsScreen {
    ctx: AppContext,
    pub list: Loadable<Vec<Appointment>>,
}

impl AppointmentsScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            list: Loadable::Idle,
        }
    }

    /// Fetch the caller's appointments from the endpoint matching their role
    pub async fn load(&mut self) -> Result<(), Notice> {
        let user = signed_in(&self.ctx.session)?;
        let api = self.ctx.api.clone();
        load_into(
            &mut self.list,
            "Could not load your appointments",
            api.my_appointments(user.role),
        )
        .await
    }

    /// Quick actions for one listed appointment
    pub fn actions_for(&self, appointment: &Appointment) -> &'static [AppointmentStatus] {
        match self.ctx.session.role() {
            Some(role) => quick_actions(role, appointment.status),
            None => &[],
        }
    }

    /// Apply a quick action to a listed appointment, then reload the list.
    /// Ids missing from the loaded list are refused without a request.
    pub async fn quick_update(
        &mut self,
        id: i64,
        status: AppointmentStatus,
        note: Option<String>,
    ) -> Result<Notice, Notice> {
        let user = signed_in(&self.ctx.session)?;
        let current = self
            .find(id)
            .map(|a| a.status)
            .ok_or_else(|| {
                Notice::error("Error", format!("Appointment {} is not in your list.", id))
            })?;
        if !quick_actions(user.role, current).contains(&status) {
            return Err(denied(&format!(
                "A {} cannot move this appointment from {} to {}.",
                user.role, current, status
            )));
        }

        let change = StatusChange {
            new_status: status,
            notes: note.as_deref().and_then(validation::non_blank),
        };
        if let Err(e) = self.ctx.api.update_appointment_status(id, &change).await {
            return Err(Notice::from_error("Error", &e));
        }

        if let Err(refresh) = self.load().await {
            tracing::warn!("Status updated, but the refresh failed: {}", refresh);
        }
        Ok(Notice::success("Success", "Appointment status updated."))
    }

    fn find(&self, id: i64) -> Option<&Appointment> {
        self.list.ready()?.iter().find(|a| a.id == id)
    }
}

// ============================================================================
// Detail
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct StatusForm {
    pub status: AppointmentStatus,
    pub notes: String,
}

impl Default for StatusForm {
    fn default() -> Self {
        Self {
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RatingForm {
    pub score: f64,
    pub comment: String,
}

impl Default for RatingForm {
    fn default() -> Self {
        Self {
            score: 5.0,
            comment: String::new(),
        }
    }
}

pub struct AppointmentDetailScreen {
    ctx: AppContext,
    appointment_id: i64,
    pub view: Loadable<Appointment>,
    /// The caller's earlier rating of this professional, if any
    pub existing_rating: Option<Rating>,
    pub status_form: StatusForm,
    pub rating_form: RatingForm,
}

impl AppointmentDetailScreen {
    pub fn new(ctx: AppContext, appointment_id: i64) -> Self {
        Self {
            ctx,
            appointment_id,
            view: Loadable::Idle,
            existing_rating: None,
            status_form: StatusForm::default(),
            rating_form: RatingForm::default(),
        }
    }

    pub fn appointment_id(&self) -> i64 {
        self.appointment_id
    }

    pub async fn load(&mut self) -> Result<(), Notice> {
        let api = self.ctx.api.clone();
        load_into(
            &mut self.view,
            "Could not load the appointment",
            api.appointment(self.appointment_id),
        )
        .await?;

        if let Some(appointment) = self.view.ready() {
            self.status_form.status = appointment.status;
        }
        self.load_existing_rating().await;
        Ok(())
    }

    /// Only a patient looking at a completed appointment has a rating to
    /// show; a found rating pre-fills the rating form and a failed read
    /// leaves the section empty
    async fn load_existing_rating(&mut self) {
        let (role, status, professional_id) = match (self.ctx.session.role(), self.view.ready()) {
            (Some(role), Some(a)) => (role, a.status, a.professional.id),
            _ => return,
        };
        if !can_rate(role, status) {
            self.existing_rating = None;
            return;
        }

        match self.ctx.api.my_ratings_for(professional_id).await {
            Ok(ratings) => {
                self.existing_rating = ratings.into_iter().next();
                if let Some(rating) = &self.existing_rating {
                    self.rating_form = RatingForm {
                        score: rating.score,
                        comment: rating.comment.clone().unwrap_or_default(),
                    };
                }
            }
            Err(e) => {
                tracing::warn!("Could not load your rating: {}", e);
                self.existing_rating = None;
            }
        }
    }

    /// The loaded appointment and the signed-in user
    fn current(&self) -> Result<(User, &Appointment), Notice> {
        let user = signed_in(&self.ctx.session)?;
        let appointment = self
            .view
            .ready()
            .ok_or_else(|| Notice::error("Error", "The appointment is not loaded yet."))?;
        Ok((user, appointment))
    }

    /// Professional: set the status chosen in the status form
    pub async fn update_status(&mut self) -> Result<Notice, Notice> {
        let (user, appointment) = self.current()?;
        if !can_update_status(user.role, appointment.status) {
            return Err(denied(
                "Only the professional can change the status of an appointment that was not cancelled.",
            ));
        }
        if !PROFESSIONAL_STATUS_OPTIONS.contains(&self.status_form.status) {
            return Err(denied("That status cannot be chosen here."));
        }

        let change = StatusChange {
            new_status: self.status_form.status,
            notes: validation::non_blank(&self.status_form.notes),
        };
        self.send_status(change, "Appointment status updated successfully!")
            .await
    }

    /// Patient: cancel a scheduled appointment
    pub async fn cancel(&mut self) -> Result<Notice, Notice> {
        let (user, appointment) = self.current()?;
        if !can_cancel(user.role, appointment.status) {
            return Err(denied("Only a scheduled appointment can be cancelled by the patient."));
        }

        let change = StatusChange {
            new_status: AppointmentStatus::CancelledByPatient,
            notes: Some("Cancelled by the patient.".to_string()),
        };
        self.send_status(change, "Appointment cancelled.").await
    }

    async fn send_status(&mut self, change: StatusChange, ack: &str) -> Result<Notice, Notice> {
        match self
            .ctx
            .api
            .update_appointment_status(self.appointment_id, &change)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "Appointment {} moved to {}",
                    self.appointment_id,
                    change.new_status
                );
                self.status_form.notes.clear();
                if let Err(refresh) = self.load().await {
                    tracing::warn!("Status updated, but the refresh failed: {}", refresh);
                }
                Ok(Notice::success("Success", ack))
            }
            Err(e) => Err(Notice::from_error("Error", &e)),
        }
    }

    /// Patient: rate the professional of a completed appointment, dated today
    pub async fn submit_rating(&mut self) -> Result<Notice, Notice> {
        let (user, appointment) = self.current()?;
        if !can_rate(user.role, appointment.status) {
            return Err(denied("Only patients can rate, and only after a completed appointment."));
        }
        let score = validation::validate_rating(self.rating_form.score)
            .map_err(|e| Notice::from_error("Error", &Error::from(e)))?;

        let rating = NewRating {
            professional_id: appointment.professional.id,
            score,
            comment: validation::non_blank(&self.rating_form.comment),
            rated_on: Some(chrono::Local::now().date_naive()),
        };

        match self.ctx.api.create_rating(&rating).await {
            Ok(()) => {
                self.rating_form = RatingForm::default();
                self.load_existing_rating().await;
                Ok(Notice::success("Thank you!", "Your rating was sent."))
            }
            Err(e) => Err(Notice::from_error("Error", &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{offline_context, user};
    use crate::AppointmentStatus::*;

    #[test]
    fn test_quick_actions() {
        assert_eq!(
            quick_actions(UserRole::Professional, Scheduled),
            &[Completed, CancelledByProfessional]
        );
        assert_eq!(quick_actions(UserRole::Patient, Scheduled), &[CancelledByPatient]);
        assert!(quick_actions(UserRole::Patient, Completed).is_empty());
        assert!(quick_actions(UserRole::Professional, CancelledByPatient).is_empty());
    }

    #[test]
    fn test_status_permissions() {
        assert!(can_update_status(UserRole::Professional, Scheduled));
        assert!(can_update_status(UserRole::Professional, Completed));
        assert!(!can_update_status(UserRole::Professional, CancelledByPatient));
        assert!(!can_update_status(UserRole::Professional, CancelledByProfessional));
        assert!(!can_update_status(UserRole::Patient, Scheduled));
    }

    #[test]
    fn test_cancel_and_rate_permissions() {
        assert!(can_cancel(UserRole::Patient, Scheduled));
        assert!(!can_cancel(UserRole::Patient, Completed));
        assert!(!can_cancel(UserRole::Professional, Scheduled));

        assert!(can_rate(UserRole::Patient, Completed));
        assert!(!can_rate(UserRole::Patient, Scheduled));
        assert!(!can_rate(UserRole::Professional, Completed));
    }

    #[test]
    fn test_form_defaults() {
        assert_eq!(RatingForm::default().score, 5.0);
        assert_eq!(StatusForm::default().status, Scheduled);
    }

    #[tokio::test]
    async fn test_actions_need_a_loaded_appointment() {
        let ctx = offline_context();
        ctx.session.login(user("USUARIO"), "t").unwrap();
        let mut screen = AppointmentDetailScreen::new(ctx, 9);

        let notice = screen.cancel().await.unwrap_err();
        assert_eq!(notice.message, "The appointment is not loaded yet.");
    }

    #[tokio::test]
    async fn test_list_load_failure_is_reported() {
        let ctx = offline_context();
        ctx.session.login(user("PROFISSIONAL"), "t").unwrap();
        let mut screen = AppointmentsScreen::new(ctx.clone());

        let notice = screen.load().await.unwrap_err();
        assert_eq!(notice.title, "Could not load your appointments");
        assert!(screen.list.failure().is_some());
        // only a 401 may clear the session
        assert!(ctx.session.is_authenticated());
    }
}
