use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::category;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::category::{CategoryListQuery, CategoryPayload, validate_category_payload};
use crate::models::shared::escape_like;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/category",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List all categories",
    description = "Returns every category ordered by id descending, with an optional case-insensitive name filter. Not paginated.",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "All matching categories", body = Vec<category::Model>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<category::Model>>, AppError> {
    let mut select = category::Entity::find();

    if let Some(ref name) = query.name {
        let term = escape_like(name.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(category::Column::CategoryName)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let rows = select
        .order_by_desc(category::Column::CategoryId)
        .all(state.conn())
        .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by ID",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = category::Model),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<category::Model>, AppError> {
    let model = find_category(state.conn(), id).await?;
    Ok(Json(model))
}

#[utoipa::path(
    post,
    path = "/api/category",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category created", body = category::Model),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.category_name))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryPayload>,
) -> Result<Json<category::Model>, AppError> {
    validate_category_payload(&payload)?;

    let model = category::ActiveModel {
        category_name: Set(payload.category_name.trim().to_string()),
        category_status: Set(payload.category_status),
        ..Default::default()
    }
    .insert(state.conn())
    .await?;

    Ok(Json(model))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Replace a category's name and status",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = category::Model),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CategoryPayload>,
) -> Result<Json<category::Model>, AppError> {
    validate_category_payload(&payload)?;

    let existing = find_category(state.conn(), id).await?;

    let mut active: category::ActiveModel = existing.into();
    active.category_name = Set(payload.category_name.trim().to_string());
    active.category_status = Set(payload.category_status);

    let model = active.update(state.conn()).await?;
    Ok(Json(model))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Removes the category row. Products referencing it keep existing; their categoryId is nulled by the foreign key's SET NULL action.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted category", body = category::Model),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<category::Model>, AppError> {
    let model = find_category(state.conn(), id).await?;

    category::Entity::delete_by_id(id).exec(state.conn()).await?;

    Ok(Json(model))
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}
