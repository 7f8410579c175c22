//! OpenAPI document served at `/api-docs/openapi.json`

use crate::auth::{JwtResponse, LoginRequest, MessageResponse, SignupRequest, UserInfo};
use crate::error::{ApiError, FieldError};
use crate::handlers::{auth, contents, health};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Web Editor API",
        description = "Accounts, bearer-token login, and author-owned content"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        auth::signup_handler,
        auth::login_handler,
        auth::me_handler,
        contents::create_content,
        contents::update_content,
        contents::delete_content,
        contents::get_content,
        contents::list_contents,
        contents::my_contents,
        contents::contents_by_status,
        contents::search_contents,
    ),
    components(schemas(
        ApiError,
        FieldError,
        SignupRequest,
        LoginRequest,
        JwtResponse,
        MessageResponse,
        UserInfo,
        contents::ContentRequest,
        contents::ContentResponse,
        contents::ContentPage,
        health::HealthResponse,
        health::ReadinessResponse,
        health::ReadinessChecks,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Signup, login, and current user"),
        (name = "contents", description = "Content management")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by guarded paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
