//! Shared helpers for tests that talk to a mock backend.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use teaxis_core::{ApiClient, AppContext, SessionStore, Transport, User};
use wiremock::MockServer;

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// A signed-out context pointed at `server`
pub fn context(server: &MockServer) -> AppContext {
    context_with(server, SessionStore::in_memory())
}

pub fn context_with(server: &MockServer, session: SessionStore) -> AppContext {
    let transport = Transport::new(&server.uri(), Duration::from_secs(5)).expect("transport");
    AppContext::new(ApiClient::new(transport, session))
}

/// A context already signed in as `role` with token `abc`
pub fn signed_in(server: &MockServer, role: &str) -> AppContext {
    let ctx = context(server);
    ctx.session.login(user(1, role), "abc").expect("login");
    ctx
}

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "nome": "Ana",
        "email": "ana@x.com",
        "tipo": role,
    })
}

pub fn user(id: i64, role: &str) -> User {
    serde_json::from_value(user_json(id, role)).expect("user fixture")
}

pub fn professional_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "usuario": {"id": id + 100, "nome": name, "email": "p@x.com", "tipo": "PROFISSIONAL"},
        "disponibilidade": "weekdays",
        "avaliacaoMedia": 4.5,
        "especializacoes": ["TEA"],
    })
}

pub fn appointment_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "usuario": user_json(1, "USUARIO"),
        "profissional": professional_json(4, "Dr. Bruno"),
        "dataHoraAgendamento": "2025-07-15T14:00:00",
        "tipoAtendimento": "ONLINE",
        "localOuLink": "https://meet.example/abc",
        "status": status,
        "duracaoEstimadaMinutos": 50,
    })
}
