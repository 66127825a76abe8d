//! OpenAPI description of the HTTP surface
//!
//! Served only when enabled with `--openapi` / `FSG_OPENAPI`.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fsg_core::ObjectInfo;

use crate::handlers::{self, Health};

/// Location of the browsable UI
pub const DOCS_UI_PATH: &str = "/swagger-ui";

/// Location of the raw OpenAPI document
pub const DOCS_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "filestore-gateway", description = "HTTP facade for S3-compatible file storage"),
    paths(
        handlers::list_files,
        handlers::get_file,
        handlers::save_file,
        handlers::delete_file,
        handlers::health
    ),
    components(schemas(ObjectInfo, Health)),
    tags(
        (name = "files", description = "Get, list, upload and delete stored files"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Add the OpenAPI document and the Swagger UI to a router
pub fn with_api_docs(router: Router) -> Router {
    router.merge(SwaggerUi::new(DOCS_UI_PATH).url(DOCS_JSON_PATH, ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/s3"));
        assert!(paths.contains_key("/health"));

        let object = paths.get("/api/s3/{path}/{file_name}").unwrap();
        assert!(object.get.is_some());
        assert!(object.post.is_some());
        assert!(object.delete.is_some());
        assert!(object.put.is_none());
    }

    #[test]
    fn test_document_has_item_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.schemas.contains_key("ObjectInfo"));
        assert!(components.schemas.contains_key("Health"));
    }
}
