//! Core domain types for the Teaxis client.
//!
//! Field names on the wire follow the backend's JSON contract; the Rust
//! names are their English equivalents.
//! - Users, roles and profile patches
//! - Professionals and their editable profile
//! - Appointments ("sessoes" on the backend) and status changes
//! - Ratings, matching suggestions and favorites

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enumerations
// ============================================================================

/// Role tag distinguishing patients/families from professionals
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "USUARIO")]
    Patient,
    #[serde(rename = "PROFISSIONAL")]
    Professional,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Professional => write!(f, "professional"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "Masculino")]
    Male,
    #[serde(rename = "Feminino")]
    Female,
    #[serde(rename = "Outro")]
    Other,
}

/// Lifecycle status of an appointment
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    #[serde(rename = "AGENDADA")]
    Scheduled,
    #[serde(rename = "REALIZADA")]
    Completed,
    #[serde(rename = "CANCELADA")]
    Cancelled,
    #[serde(rename = "CANCELADA_PACIENTE")]
    CancelledByPatient,
    #[serde(rename = "CANCELADA_PROFISSIONAL")]
    CancelledByProfessional,
}

impl AppointmentStatus {
    /// Wire name, as the backend spells it
    pub fn as_wire(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "AGENDADA",
            AppointmentStatus::Completed => "REALIZADA",
            AppointmentStatus::Cancelled => "CANCELADA",
            AppointmentStatus::CancelledByPatient => "CANCELADA_PACIENTE",
            AppointmentStatus::CancelledByProfessional => "CANCELADA_PROFISSIONAL",
        }
    }

    /// Parse either the wire name or a short English alias
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "agendada" | "scheduled" => Some(AppointmentStatus::Scheduled),
            "realizada" | "completed" | "done" => Some(AppointmentStatus::Completed),
            "cancelada" | "cancelled" => Some(AppointmentStatus::Cancelled),
            "cancelada_paciente" | "cancelled_by_patient" => {
                Some(AppointmentStatus::CancelledByPatient)
            }
            "cancelada_profissional" | "cancelled_by_professional" => {
                Some(AppointmentStatus::CancelledByProfessional)
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled
                | AppointmentStatus::CancelledByPatient
                | AppointmentStatus::CancelledByProfessional
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Whether an appointment happens online or in person
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AppointmentKind {
    #[default]
    #[serde(rename = "ONLINE")]
    Online,
    #[serde(rename = "PRESENCIAL")]
    InPerson,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchingStatus {
    #[serde(rename = "SUGERIDO")]
    Suggested,
    #[serde(rename = "ACEITO")]
    Accepted,
    #[serde(rename = "RECUSADO")]
    Declined,
}

// ============================================================================
// Users
// ============================================================================

/// A user record as returned by the backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "tipo")]
    pub role: UserRole,
    #[serde(rename = "dataNascimento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "genero", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(rename = "cidade", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "tipoNeurodivergencia", default, skip_serializing_if = "Option::is_none")]
    pub neurodivergence: Option<String>,
    #[serde(rename = "preferenciasSensoriais", default, skip_serializing_if = "Option::is_none")]
    pub sensory_preferences: Option<String>,
    #[serde(rename = "modoComunicacao", default, skip_serializing_if = "Option::is_none")]
    pub communication_mode: Option<String>,
    #[serde(rename = "historicoEscolar", default, skip_serializing_if = "Option::is_none")]
    pub school_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
}

/// Partial update of a user's mutable profile fields
///
/// `None` means "leave as is". The role is never sent by the profile form;
/// it is only carried when merging a record the server has already
/// confirmed (see `From<User>`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfilePatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub role: Option<UserRole>,
    #[serde(rename = "dataNascimento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "genero", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(rename = "cidade", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "tipoNeurodivergencia", skip_serializing_if = "Option::is_none")]
    pub neurodivergence: Option<String>,
    #[serde(rename = "preferenciasSensoriais", skip_serializing_if = "Option::is_none")]
    pub sensory_preferences: Option<String>,
    #[serde(rename = "modoComunicacao", skip_serializing_if = "Option::is_none")]
    pub communication_mode: Option<String>,
    #[serde(rename = "historicoEscolar", skip_serializing_if = "Option::is_none")]
    pub school_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }
}

impl From<User> for ProfilePatch {
    fn from(user: User) -> Self {
        Self {
            name: Some(user.name),
            email: Some(user.email),
            role: Some(user.role),
            birth_date: user.birth_date,
            gender: user.gender,
            city: user.city,
            state: user.state,
            neurodivergence: user.neurodivergence,
            sensory_preferences: user.sensory_preferences,
            communication_mode: user.communication_mode,
            school_history: user.school_history,
            hobbies: user.hobbies,
        }
    }
}

impl User {
    /// Shallow-merge a patch into this record; the id is never touched
    pub fn merge(&mut self, patch: ProfilePatch) {
        fn take<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn take_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.name, patch.name);
        take(&mut self.email, patch.email);
        take(&mut self.role, patch.role);
        take_opt(&mut self.birth_date, patch.birth_date);
        take_opt(&mut self.gender, patch.gender);
        take_opt(&mut self.city, patch.city);
        take_opt(&mut self.state, patch.state);
        take_opt(&mut self.neurodivergence, patch.neurodivergence);
        take_opt(&mut self.sensory_preferences, patch.sensory_preferences);
        take_opt(&mut self.communication_mode, patch.communication_mode);
        take_opt(&mut self.school_history, patch.school_history);
        take_opt(&mut self.hobbies, patch.hobbies);
    }

    pub fn is_patient(&self) -> bool {
        self.role == UserRole::Patient
    }

    pub fn is_professional(&self) -> bool {
        self.role == UserRole::Professional
    }
}

/// Self-registration payload; the password never leaves this struct
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "tipo")]
    pub role: UserRole,
    #[serde(rename = "tipoNeurodivergencia")]
    pub neurodivergence: Option<String>,
    #[serde(rename = "modoComunicacao")]
    pub communication_mode: Option<String>,
    #[serde(rename = "preferenciasSensoriais")]
    pub sensory_preferences: Option<String>,
    pub hobbies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

/// Body of a successful `/login`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "usuario")]
    pub user: User,
}

// ============================================================================
// Professionals
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Professional {
    pub id: i64,
    #[serde(rename = "usuario", default)]
    pub user: Option<User>,
    #[serde(rename = "disponibilidade", default)]
    pub availability: Option<String>,
    #[serde(rename = "avaliacaoMedia", default)]
    pub average_rating: Option<f64>,
    #[serde(rename = "certificacoes", default)]
    pub certifications: Option<Vec<String>>,
    #[serde(rename = "especializacoes", default)]
    pub specializations: Option<Vec<String>>,
    #[serde(rename = "metodosUtilizados", default)]
    pub methods: Option<Vec<String>>,
    #[serde(default)]
    pub hobbies: Option<Vec<String>>,
}

impl Professional {
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("Unknown professional")
    }
}

/// Body of `PUT /profissionais/meu-perfil`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfessionalProfileUpdate {
    #[serde(rename = "disponibilidade")]
    pub availability: String,
    #[serde(rename = "certificacoes")]
    pub certifications: Vec<String>,
    #[serde(rename = "especializacoes")]
    pub specializations: Vec<String>,
    #[serde(rename = "metodosUtilizados")]
    pub methods: Vec<String>,
    pub hobbies: Vec<String>,
}

// ============================================================================
// Appointments
// ============================================================================

/// Default estimated duration of a new appointment, in minutes
pub const DEFAULT_DURATION_MINUTES: u32 = 50;

/// A scheduled appointment between a user and a professional
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    #[serde(rename = "usuario")]
    pub user: User,
    #[serde(rename = "profissional")]
    pub professional: Professional,
    #[serde(rename = "dataHoraAgendamento")]
    pub scheduled_for: NaiveDateTime,
    #[serde(rename = "tipoAtendimento")]
    pub kind: AppointmentKind,
    #[serde(rename = "localOuLink", default)]
    pub location: Option<String>,
    pub status: AppointmentStatus,
    #[serde(rename = "observacoesUsuario", default)]
    pub user_notes: Option<String>,
    #[serde(rename = "observacoesProfissional", default)]
    pub professional_notes: Option<String>,
    #[serde(rename = "duracaoEstimadaMinutos", default)]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "dataCriacao", default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(rename = "dataUltimaModificacao", default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Appointment {
    /// Name of the other party, from the viewer's point of view
    pub fn counterpart_name(&self, viewer: UserRole) -> &str {
        match viewer {
            UserRole::Patient => self.professional.display_name(),
            UserRole::Professional => &self.user.name,
        }
    }
}

/// Body of `POST /sessoes`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewAppointment {
    #[serde(rename = "profissionalId")]
    pub professional_id: i64,
    #[serde(rename = "dataHoraAgendamento")]
    pub scheduled_for: NaiveDateTime,
    #[serde(rename = "tipoAtendimento")]
    pub kind: AppointmentKind,
    #[serde(rename = "localOuLink", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "observacoesUsuario", skip_serializing_if = "Option::is_none")]
    pub user_notes: Option<String>,
    #[serde(rename = "duracaoEstimadaMinutos", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// Body of `PATCH /sessoes/{id}/status`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StatusChange {
    #[serde(rename = "novoStatus")]
    pub new_status: AppointmentStatus,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Ratings, matching, favorites
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: i64,
    #[serde(rename = "profissional", default)]
    pub professional: Option<Professional>,
    #[serde(rename = "usuario", default)]
    pub user: Option<User>,
    #[serde(rename = "nota")]
    pub score: f64,
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
    #[serde(rename = "dataAvaliacao", default)]
    pub rated_on: Option<NaiveDate>,
}

/// Body of `POST /avaliacoes`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewRating {
    #[serde(rename = "profissionalId")]
    pub professional_id: i64,
    #[serde(rename = "nota")]
    pub score: f64,
    #[serde(rename = "comentario", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "dataAvaliacao", skip_serializing_if = "Option::is_none")]
    pub rated_on: Option<NaiveDate>,
}

/// A professional suggested for the current user by the backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Matching {
    pub id: i64,
    #[serde(rename = "usuario", default)]
    pub user: Option<User>,
    #[serde(rename = "profissional")]
    pub professional: Professional,
    pub status: MatchingStatus,
    #[serde(rename = "dataSugestao", default)]
    pub suggested_on: Option<NaiveDate>,
    #[serde(rename = "pontuacao", default)]
    pub score: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub id: i64,
    #[serde(rename = "usuario", default)]
    pub user: Option<User>,
    #[serde(rename = "profissional")]
    pub professional: Professional,
}

/// Body of `POST /favoritos`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewFavorite {
    #[serde(rename = "profissionalId")]
    pub professional_id: i64,
}
