use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Todo API",
        version = "0.1.0",
        description = "API for managing an ordered todo list with priorities, filters and export"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/todos", api = domain_todos::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
