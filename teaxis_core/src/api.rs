//! Authenticated access to the Teaxis backend.
//!
//! [`ApiClient`] sits between the screens and the [`Transport`]. For every
//! call it reads the current token from the injected [`SessionStore`], runs
//! one exchange, and turns the [`Outcome`] into a typed result. It is the
//! only place that reacts to an authorization failure: a 401 clears the
//! session before the (classified) error is handed back unchanged.
//!
//! There is no retry, queueing or de-duplication; each call stands alone.

use crate::config::ApiConfig;
use crate::failure::{classify, ApiError};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, Failure, Outcome, Transport};
use crate::types::*;
use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// A successful response, before decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::decode(self.status, e.to_string()).into())
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    transport: Transport,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(transport: Transport, session: SessionStore) -> Self {
        Self { transport, session }
    }

    pub fn from_config(config: &ApiConfig, session: SessionStore) -> Result<Self> {
        let transport = Transport::new(&config.base_url, config.timeout())?;
        Ok(Self::new(transport, session))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Run one request with the token the session holds right now
    pub async fn execute(&self, request: ApiRequest) -> Result<Reply> {
        let token = self.session.token();
        match self.transport.send(&request, token.as_deref()).await {
            Outcome::Success { status, body } => Ok(Reply { status, body }),
            Outcome::Unauthorized { body } => {
                if self.session.is_authenticated() {
                    tracing::warn!(
                        "{} {} was unauthorized; session expired, clearing it",
                        request.method,
                        request.path
                    );
                }
                self.session.logout();
                Err(classify(401, &body).into())
            }
            Outcome::Failed(Failure::Status { status, body }) => {
                Err(classify(status, &body).into())
            }
            Outcome::Failed(Failure::Unreachable(reason)) => {
                Err(ApiError::transport(reason).into())
            }
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.execute(request).await?.decode()
    }

    async fn call_unit(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    // ------------------------------------------------------------------
    // Authentication and account
    // ------------------------------------------------------------------

    /// Exchange credentials for a token and sign the session in
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let reply = self
            .execute(ApiRequest::post("/login").json(&credentials)?)
            .await?;
        let response: LoginResponse = reply.decode()?;
        if response.token.is_empty() {
            return Err(ApiError::decode(reply.status, "login response carried no token").into());
        }
        self.session.login(response.user.clone(), response.token)?;
        Ok(response.user)
    }

    pub async fn register(&self, registration: &Registration) -> Result<()> {
        self.call_unit(ApiRequest::post("/usuarios/registrar").json(registration)?)
            .await
    }

    pub async fn me(&self) -> Result<User> {
        self.call(ApiRequest::get("/usuarios/me")).await
    }

    pub async fn update_user(&self, user_id: i64, patch: &ProfilePatch) -> Result<User> {
        self.call(ApiRequest::put(format!("/usuarios/{}", user_id)).json(patch)?)
            .await
    }

    pub async fn become_professional(&self, user_id: i64) -> Result<User> {
        self.call(ApiRequest::patch(format!(
            "/usuarios/{}/tornar-profissional",
            user_id
        )))
        .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        self.call_unit(ApiRequest::delete(format!("/usuarios/{}", user_id)))
            .await
    }

    // ------------------------------------------------------------------
    // Professionals
    // ------------------------------------------------------------------

    pub async fn my_professional_profile(&self) -> Result<Professional> {
        self.call(ApiRequest::get("/profissionais/meu-perfil")).await
    }

    /// Create or update the caller's professional profile (the backend upserts)
    pub async fn save_professional_profile(
        &self,
        profile: &ProfessionalProfileUpdate,
    ) -> Result<()> {
        self.call_unit(ApiRequest::put("/profissionais/meu-perfil").json(profile)?)
            .await
    }

    pub async fn professionals(&self) -> Result<Vec<Professional>> {
        self.call(ApiRequest::get("/profissionais")).await
    }

    pub async fn professional(&self, id: i64) -> Result<Professional> {
        self.call(ApiRequest::get(format!("/profissionais/{}", id)))
            .await
    }

    // ------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------

    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<()> {
        self.call_unit(ApiRequest::post("/sessoes").json(appointment)?)
            .await
    }

    /// The caller's appointments; the endpoint depends on their role
    pub async fn my_appointments(&self, role: UserRole) -> Result<Vec<Appointment>> {
        let path = match role {
            UserRole::Patient => "/sessoes/minhas",
            UserRole::Professional => "/sessoes/profissional/minhas",
        };
        self.call(ApiRequest::get(path)).await
    }

    pub async fn appointment(&self, id: i64) -> Result<Appointment> {
        self.call(ApiRequest::get(format!("/sessoes/{}", id))).await
    }

    pub async fn update_appointment_status(&self, id: i64, change: &StatusChange) -> Result<()> {
        self.call_unit(ApiRequest::patch(format!("/sessoes/{}/status", id)).json(change)?)
            .await
    }

    // ------------------------------------------------------------------
    // Ratings
    // ------------------------------------------------------------------

    pub async fn create_rating(&self, rating: &NewRating) -> Result<()> {
        self.call_unit(ApiRequest::post("/avaliacoes").json(rating)?)
            .await
    }

    /// Ratings the caller gave to one professional
    pub async fn my_ratings_for(&self, professional_id: i64) -> Result<Vec<Rating>> {
        self.call(ApiRequest::get("/avaliacoes/me").query("profissionalId", professional_id))
            .await
    }

    // ------------------------------------------------------------------
    // Matching and favorites
    // ------------------------------------------------------------------

    pub async fn suggest_matchings(&self) -> Result<Vec<Matching>> {
        self.call(ApiRequest::post("/matching/sugerir")).await
    }

    pub async fn favorites(&self) -> Result<Vec<Favorite>> {
        self.call(ApiRequest::get("/favoritos/me")).await
    }

    pub async fn add_favorite(&self, professional_id: i64) -> Result<()> {
        let body = NewFavorite { professional_id };
        self.call_unit(ApiRequest::post("/favoritos").json(&body)?)
            .await
    }

    pub async fn remove_favorite(&self, professional_id: i64) -> Result<()> {
        self.call_unit(ApiRequest::delete(format!("/favoritos/{}", professional_id)))
            .await
    }
}

/// Requires a signed-in user and returns it
pub fn require_user(session: &SessionStore) -> Result<User> {
    session.current_user().ok_or(Error::NotSignedIn)
}
