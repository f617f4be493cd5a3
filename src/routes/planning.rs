use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::planning::{AddMealRequest, AddMenuRequest, FamilySize, PlanningList, PlanningQuery},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::PlanningEntry,
    response::ApiResponse,
    services::planning_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_planning).post(add_meal))
        .route("/menu", post(add_menu))
        .route("/family-size", get(get_family_size).put(set_family_size))
        .route("/{id}", delete(remove_entry))
}

#[utoipa::path(
    get,
    path = "/api/planning",
    params(("from" = Option<String>, Query, description = "Only entries on or after this date (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Planned meals of the current user", body = ApiResponse<PlanningList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn list_planning(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PlanningQuery>,
) -> AppResult<Json<ApiResponse<PlanningList>>> {
    let resp = planning_service::list_entries(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/planning",
    request_body = AddMealRequest,
    responses(
        (status = 200, description = "Plan a recipe on a date and slot", body = ApiResponse<PlanningEntry>),
        (status = 400, description = "Person count outside 1 to 100"),
        (status = 404, description = "Recipe not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn add_meal(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddMealRequest>,
) -> AppResult<Json<ApiResponse<PlanningEntry>>> {
    let resp = planning_service::add_meal(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/planning/menu",
    request_body = AddMenuRequest,
    responses(
        (status = 200, description = "Plan every resolvable recipe of a menu", body = ApiResponse<PlanningList>),
        (status = 400, description = "Person count outside 1 to 100"),
        (status = 404, description = "Menu not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn add_menu(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddMenuRequest>,
) -> AppResult<Json<ApiResponse<PlanningList>>> {
    let resp = planning_service::add_menu(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/planning/{id}",
    params(("id" = Uuid, Path, description = "Planning entry ID")),
    responses(
        (status = 200, description = "Entry removed"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn remove_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = planning_service::remove_entry(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/planning/family-size",
    responses((status = 200, description = "Household size", body = ApiResponse<FamilySize>)),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn get_family_size(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FamilySize>>> {
    let resp = planning_service::get_family_size(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/planning/family-size",
    request_body = FamilySize,
    responses(
        (status = 200, description = "Household size updated", body = ApiResponse<FamilySize>),
        (status = 400, description = "Family size outside 1 to 50"),
    ),
    security(("bearer_auth" = [])),
    tag = "Planning"
)]
pub async fn set_family_size(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<FamilySize>,
) -> AppResult<Json<ApiResponse<FamilySize>>> {
    let resp = planning_service::set_family_size(&state, &user, payload).await?;
    Ok(Json(resp))
}
