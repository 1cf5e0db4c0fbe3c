//! Role gate middleware
//!
//! Routes declare the role groups they accept. A request passes when the
//! authenticated user holds any role from any group; otherwise it is
//! short-circuited before reaching the handler.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use cardmart_config::AuthorizationConfig;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::error::{RbacError, RbacResult};
use crate::roles::{Role, RoleSet};

/// Role groups a route accepts. OR across groups and within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredRoles {
    groups: Vec<Vec<Role>>,
}

impl RequiredRoles {
    /// No requirement beyond authentication
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse route declarations. Each group is a comma-separated list of
    /// role names, e.g. `["Admin,Employee"]`.
    pub fn parse<S: AsRef<str>>(groups: &[S]) -> RbacResult<Self> {
        let groups = groups
            .iter()
            .map(|group| {
                group
                    .as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::parse::<Role>)
                    .collect::<RbacResult<Vec<_>>>()
            })
            .collect::<RbacResult<Vec<_>>>()?;
        Ok(Self { groups })
    }

    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            groups: vec![roles.into_iter().collect()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }

    /// Every acceptable role name, deduplicated, in declaration order
    pub fn acceptable(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for role in self.groups.iter().flatten() {
            let name = role.as_str().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn is_satisfied_by(&self, roles: &RoleSet) -> bool {
        self.is_empty() || self.groups.iter().flatten().any(|role| roles.has(*role))
    }

    /// Gate decision for an optional caller
    pub fn check(&self, ctx: Option<&AuthContext>) -> RbacResult<()> {
        let ctx = ctx.ok_or(RbacError::Unauthenticated)?;
        if self.is_satisfied_by(&ctx.roles) {
            Ok(())
        } else {
            Err(RbacError::insufficient_role(self.acceptable()))
        }
    }
}

/// Middleware state: the route's requirement plus where to send browsers
#[derive(Debug, Clone)]
pub struct RoleGate {
    required: Arc<RequiredRoles>,
    login_path: Arc<str>,
}

impl RoleGate {
    pub fn new(required: RequiredRoles, login_path: impl Into<String>) -> Self {
        Self {
            required: Arc::new(required),
            login_path: Arc::from(login_path.into()),
        }
    }

    /// Parse comma-separated role groups into a gate
    pub fn require<S: AsRef<str>>(groups: &[S], login_path: impl Into<String>) -> RbacResult<Self> {
        Ok(Self::new(RequiredRoles::parse(groups)?, login_path))
    }

    /// Like [`require`](Self::require), redirecting to the configured login path
    pub fn from_config<S: AsRef<str>>(groups: &[S], config: &AuthorizationConfig) -> RbacResult<Self> {
        Self::require(groups, config.login_path.clone())
    }

    pub fn required(&self) -> &RequiredRoles {
        &self.required
    }

    /// axum middleware entry point, for use with
    /// `axum::middleware::from_fn_with_state`
    pub async fn enforce(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
        let ctx = request.extensions().get::<AuthContext>();

        match gate.required.check(ctx) {
            Ok(()) => {
                debug!(user_id = ctx.map(|c| c.user_id), path = %request.uri().path(), "Role gate passed");
                next.run(request).await
            }
            Err(err) => {
                warn!(
                    user_id = ctx.map(|c| c.user_id),
                    path = %request.uri().path(),
                    error = %err,
                    "Role gate rejected request"
                );
                let client = ClientKind::from_headers(request.headers());
                GateRejection::new(err, client, gate.login_path.to_string()).into_response()
            }
        }
    }
}

/// How the client wants to be told about an authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Browser,
    Api,
}

impl ClientKind {
    /// Browsers are clients that accept HTML and did not ask for JSON.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let ajax = headers
            .get("X-Requested-With")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        if !ajax && accept.contains("text/html") && !accept.contains("json") {
            ClientKind::Browser
        } else {
            ClientKind::Api
        }
    }
}

/// HTTP form of a gate failure
#[derive(Debug)]
pub struct GateRejection {
    error: RbacError,
    client: ClientKind,
    login_path: String,
}

impl GateRejection {
    pub fn new(error: RbacError, client: ClientKind, login_path: impl Into<String>) -> Self {
        Self {
            error,
            client,
            login_path: login_path.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match (&self.error, self.client) {
            (RbacError::Unauthenticated, ClientKind::Browser) => StatusCode::SEE_OTHER,
            (RbacError::Unauthenticated, ClientKind::Api) => StatusCode::UNAUTHORIZED,
            (RbacError::InsufficientRole { .. }, _) | (RbacError::RolePermissionDenied { .. }, _) => {
                StatusCode::FORBIDDEN
            }
            (RbacError::UnknownRole { .. }, _) | (RbacError::UserNotFound { .. }, _) => StatusCode::NOT_FOUND,
            (RbacError::InvariantViolation { .. }, _) => StatusCode::CONFLICT,
            (RbacError::TierUnavailable { .. }, _) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.error {
            RbacError::Unauthenticated if self.client == ClientKind::Browser => {
                Redirect::to(&self.login_path).into_response()
            }
            RbacError::Unauthenticated => (
                status,
                Json(json!({
                    "error": "Unauthenticated",
                    "message": "Authentication required",
                })),
            )
                .into_response(),
            RbacError::InsufficientRole { acceptable } => (
                status,
                Json(json!({
                    "error": "Forbidden",
                    "message": "Insufficient role",
                    "acceptable_roles": acceptable,
                })),
            )
                .into_response(),
            RbacError::RolePermissionDenied { .. } => (
                status,
                Json(json!({
                    "error": "Forbidden",
                    "message": self.error.to_string(),
                })),
            )
                .into_response(),
            other if other.is_infrastructure() => (
                status,
                Json(json!({
                    "error": "InternalError",
                    "message": "Request could not be completed",
                })),
            )
                .into_response(),
            other => (
                status,
                Json(json!({
                    "error": "RequestRejected",
                    "message": other.to_string(),
                })),
            )
                .into_response(),
        }
    }
}

impl From<RbacError> for GateRejection {
    fn from(error: RbacError) -> Self {
        Self::new(error, ClientKind::Api, "/login")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(gate: RoleGate) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(from_fn_with_state(gate, RoleGate::enforce))
    }

    fn request(ctx: Option<AuthContext>, accept: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri("/admin")
            .header(header::ACCEPT, accept)
            .body(Body::empty())
            .unwrap();
        if let Some(ctx) = ctx {
            request.extensions_mut().insert(ctx);
        }
        request
    }

    #[test]
    fn test_parse_groups() {
        let required = RequiredRoles::parse(&["Admin, Employee", "Customer"]).unwrap();
        assert_eq!(required.acceptable(), vec!["Admin", "Employee", "Customer"]);
        assert!(RequiredRoles::parse(&["Admin,employee"]).is_err());
        assert!(RequiredRoles::parse::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_gate_passes_iff_roles_intersect() {
        let required = RequiredRoles::parse(&["Admin", "Employee"]).unwrap();
        let all_sets = [
            vec![],
            vec![Role::Customer],
            vec![Role::Employee],
            vec![Role::Admin],
            vec![Role::Customer, Role::Employee],
            vec![Role::Customer, Role::Admin],
        ];
        for roles in all_sets {
            let set: RoleSet = roles.iter().copied().collect();
            let expected = roles.iter().any(|r| *r == Role::Admin || *r == Role::Employee);
            assert_eq!(required.is_satisfied_by(&set), expected, "roles {:?}", roles);
        }
    }

    #[test]
    fn test_no_groups_passes_any_authenticated_user() {
        let required = RequiredRoles::none();
        assert!(required.check(Some(&AuthContext::new(1))).is_ok());
        assert!(matches!(required.check(None), Err(RbacError::Unauthenticated)));
    }

    #[test]
    fn test_client_kind() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "text/html,application/xhtml+xml".parse().unwrap());
        assert_eq!(ClientKind::from_headers(&headers), ClientKind::Browser);

        headers.insert("X-Requested-With", "XMLHttpRequest".parse().unwrap());
        assert_eq!(ClientKind::from_headers(&headers), ClientKind::Api);

        assert_eq!(ClientKind::from_headers(&HeaderMap::new()), ClientKind::Api);
    }

    #[tokio::test]
    async fn test_anonymous_api_client_gets_401() {
        let gate = RoleGate::require(&["Admin,Employee"], "/login").unwrap();
        let response = app(gate).oneshot(request(None, "application/json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_browser_is_redirected() {
        let gate = RoleGate::require(&["Admin,Employee"], "/login").unwrap();
        let response = app(gate).oneshot(request(None, "text/html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_insufficient_role_lists_acceptable_roles_only() {
        let gate = RoleGate::require(&["Admin,Employee"], "/login").unwrap();
        let customer = AuthContext::new(3).with_role(Role::Customer);
        let response = app(gate).oneshot(request(Some(customer), "application/json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["acceptable_roles"], json!(["Admin", "Employee"]));
        assert!(!body.to_string().contains("Customer"));
    }

    #[tokio::test]
    async fn test_employee_passes() {
        let gate = RoleGate::require(&["Admin,Employee"], "/login").unwrap();
        let employee = AuthContext::new(2).with_role(Role::Employee);
        let response = app(gate).oneshot(request(Some(employee), "application/json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
