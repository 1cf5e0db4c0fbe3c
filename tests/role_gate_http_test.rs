//! Role gate and request connection binding behind a real axum router

use anyhow::Result;
use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::get,
    Extension, Router,
};
use cardmart_config::AuthorizationConfig;
use cardmart_rbac::{
    bind_request_connection, AuthContext, ConnectionHandle, ConnectionTier, Role, RoleGate, ScopedConnection,
};
use cardmart_storage::ConnectionRegistry;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Stand-in identity layer: `X-User-Id` and `X-Roles` become an
/// [`AuthContext`]. No header means anonymous.
async fn identity(mut request: Request, next: Next) -> Response {
    let user_id = request
        .headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i32>().ok());

    if let Some(user_id) = user_id {
        let roles: Vec<Role> = request
            .headers()
            .get("X-Roles")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .split(',')
            .filter_map(|name| name.trim().parse().ok())
            .collect();
        request
            .extensions_mut()
            .insert(AuthContext::new(user_id).with_roles(roles));
    }

    next.run(request).await
}

async fn bound_tier(Extension(connection): Extension<ScopedConnection>) -> String {
    connection.active_tier().to_string()
}

fn app(available: &[ConnectionTier]) -> Router {
    let registry = Arc::new(ConnectionRegistry::from_connections(
        DatabaseConnection::Disconnected,
        available.iter().map(|tier| (*tier, DatabaseConnection::Disconnected)),
    ));
    let config = AuthorizationConfig::default();
    let staff_gate = RoleGate::from_config(&["Admin,Employee"], &config).expect("valid role groups");
    let admin_gate = RoleGate::require(&["Admin"], "/login").expect("valid role groups");

    let staff = Router::new()
        .route("/staff/orders", get(bound_tier))
        .route_layer(from_fn_with_state(staff_gate, RoleGate::enforce));
    let admin = Router::new()
        .route("/admin/analytics", get(bound_tier))
        .route_layer(from_fn_with_state(admin_gate, RoleGate::enforce));
    let public = Router::new().route("/catalog", get(bound_tier));

    staff
        .merge(admin)
        .merge(public)
        .layer(from_fn_with_state(registry, bind_request_connection))
        .layer(from_fn(identity))
}

fn get_as(path: &str, user: Option<(i32, &str)>, accept: &str) -> Request<Body> {
    let mut builder = Request::builder().uri(path).header(header::ACCEPT, accept);
    if let Some((id, roles)) = user {
        builder = builder.header("X-User-Id", id.to_string()).header("X-Roles", roles);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> Result<String> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn test_anonymous_staff_route_is_unauthenticated() -> Result<()> {
    let response = app(&ConnectionTier::OPERATION_TIERS)
        .oneshot(get_as("/staff/orders", None, "application/json"))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body_text(response).await?)?;
    assert_eq!(body["error"], "Unauthenticated");
    Ok(())
}

#[tokio::test]
async fn test_anonymous_browser_redirects_to_login() -> Result<()> {
    let response = app(&ConnectionTier::OPERATION_TIERS)
        .oneshot(get_as("/staff/orders", None, "text/html"))
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    Ok(())
}

#[tokio::test]
async fn test_customer_on_staff_route_is_forbidden() -> Result<()> {
    let response = app(&ConnectionTier::OPERATION_TIERS)
        .oneshot(get_as("/staff/orders", Some((3, "Customer")), "application/json"))
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body_text(response).await?)?;
    assert_eq!(body["acceptable_roles"], serde_json::json!(["Admin", "Employee"]));
    Ok(())
}

#[tokio::test]
async fn test_request_binds_tier_of_highest_role() -> Result<()> {
    let cases = [
        ("/staff/orders", Some((2, "Employee")), "data_entry"),
        ("/staff/orders", Some((1, "Customer,Admin")), "admin_ops"),
        ("/admin/analytics", Some((1, "Admin")), "admin_ops"),
        ("/catalog", Some((3, "Customer")), "read"),
        ("/catalog", None, "read"),
    ];

    for (path, user, expected) in cases {
        let response = app(&ConnectionTier::OPERATION_TIERS)
            .oneshot(get_as(path, user, "application/json"))
            .await?;
        assert_eq!(response.status(), StatusCode::OK, "{} as {:?}", path, user);
        assert_eq!(body_text(response).await?, expected, "{} as {:?}", path, user);
    }
    Ok(())
}

#[tokio::test]
async fn test_employee_cannot_reach_admin_route() -> Result<()> {
    let response = app(&ConnectionTier::OPERATION_TIERS)
        .oneshot(get_as("/admin/analytics", Some((2, "Employee")), "application/json"))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_missing_tier_falls_back_to_default_connection() -> Result<()> {
    let response = app(&[ConnectionTier::Read])
        .oneshot(get_as("/staff/orders", Some((2, "Employee")), "application/json"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await?, "default");
    Ok(())
}
