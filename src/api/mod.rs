//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! History endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "rental-chat",
        description = "Direct messaging between platform users: conversation history over REST, live delivery over WebSocket at `/messages/connect`."
    ),
    paths(
        handlers::system::health_handler,
        handlers::chat::list_conversations,
        handlers::chat::get_conversation,
    ),
    components(schemas(
        handlers::system::HealthResponse,
        dto::ChatSummaryDto,
        dto::MessageDto,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Chat", description = "Conversation history"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
