use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::shopping::{ShoppingList, ShoppingListRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::ApiResponse,
    services::shopping_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(shopping_list))
}

#[utoipa::path(
    post,
    path = "/api/shopping-list",
    request_body = ShoppingListRequest,
    responses(
        (status = 200, description = "Consolidated shopping list with the given edits applied", body = ApiResponse<ShoppingList>),
        (status = 400, description = "Edit targets an unknown item or has an invalid quantity"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shopping"
)]
pub async fn shopping_list(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ShoppingListRequest>,
) -> AppResult<Json<ApiResponse<ShoppingList>>> {
    let resp = shopping_service::shopping_list(&state, &user, payload).await?;
    Ok(Json(resp))
}
