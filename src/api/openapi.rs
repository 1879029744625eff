//! OpenAPI document for the REST surface, generated at compile time by utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the paraphrase-worker REST API
///
/// Served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "paraphrase-worker REST API",
        version = "0.1.0",
        description = "Register users, upload spreadsheets for row-by-row paraphrasing and read back stored text pairs"
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        crate::api::routes::register_user,
        crate::api::routes::get_user_texts,
        crate::api::routes::process_document,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::TextPair,
        crate::types::BatchSummary,
        crate::types::Requester,
        crate::types::TaskErrorKind,
        crate::types::Event,
        crate::types::WebhookPayload,
        crate::config::WebhookEvent,
        crate::api::routes::RegisterUserRequest,
        crate::api::routes::RegisterUserResponse,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "users", description = "Registration and stored text pairs"),
        (name = "documents", description = "Spreadsheet upload and paraphrasing"),
        (name = "system", description = "Health check and OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `X-Api-Key` scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/users",
            "/users/{id}/texts",
            "/documents",
            "/health",
            "/openapi.json",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn test_openapi_spec_has_error_schema() {
        let components = ApiDoc::openapi().components.unwrap();
        assert!(components.schemas.contains_key("ApiError"));
        assert!(components.schemas.contains_key("TextPair"));
        assert!(components.security_schemes.contains_key("api_key"));
    }

    #[test]
    fn test_openapi_spec_tags() {
        let tags = ApiDoc::openapi().tags.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["users", "documents", "system"]);
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "paraphrase-worker REST API");

        let json = serde_json::to_value(&spec).expect("Should serialize to JSON");
        let version = json["openapi"].as_str().unwrap();
        assert!(version.starts_with("3."), "Should use OpenAPI 3.x version");
    }
}
