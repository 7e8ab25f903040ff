use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerRole {
    Company,
    Student,
}

impl CallerRole {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("company") {
            Some(CallerRole::Company)
        } else if raw.eq_ignore_ascii_case("student") {
            Some(CallerRole::Student)
        } else {
            None
        }
    }
}

/// Identity established from the bearer token. Handlers read it as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: CallerRole,
}

#[derive(Clone)]
pub struct AuthKeys {
    decoding: Arc<DecodingKey>,
}

impl AuthKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    fn caller(&self, req: &Request) -> Result<Caller, Error> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
        let header = header
            .to_str()
            .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?
            .claims;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("invalid_subject".to_string()))?;
        let role = claims
            .role
            .as_deref()
            .and_then(CallerRole::parse)
            .ok_or_else(|| Error::Unauthorized("invalid_role".to_string()))?;
        Ok(Caller { id, role })
    }
}

async fn require_role(keys: &AuthKeys, role: CallerRole, mut req: Request, next: Next) -> Response {
    let caller = match keys.caller(&req) {
        Ok(caller) => caller,
        Err(err) => return err.into_response(),
    };
    if caller.role != role {
        return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
    }
    req.extensions_mut().insert(caller);
    next.run(req).await
}

pub async fn require_company(State(keys): State<AuthKeys>, req: Request, next: Next) -> Response {
    require_role(&keys, CallerRole::Company, req, next).await
}

pub async fn require_student(State(keys): State<AuthKeys>, req: Request, next: Next) -> Response {
    require_role(&keys, CallerRole::Student, req, next).await
}
