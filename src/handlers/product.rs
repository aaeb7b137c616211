use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, product};
use crate::error::{AppError, ErrorBody};
use crate::models::product::{
    ProductListQuery, ProductListResponse, ProductUpload, ProductView, normalize_paging,
    parse_product_form,
};
use crate::models::shared::escape_like;
use crate::state::AppState;
use crate::utils::image;

#[utoipa::path(
    get,
    path = "/api/product",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products with pagination and search",
    description = "Returns `{total, products}` where rows are joined with their category name. `total` is the filtered count before the page window; ordering is product id descending. A page past the end yields an empty list with the correct total.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "One page of products", body = ProductListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let (page, limit) = normalize_paging(query.page, query.limit);

    let mut select = select_product_view();

    if let Some(ref pname) = query.pname {
        let term = escape_like(pname.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::ProductName)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    if let Some(category_id) = query.category_id {
        select = select.filter(product::Column::CategoryId.eq(category_id));
    }

    let total = select.clone().count(state.conn()).await?;

    let products = select
        .order_by_desc(product::Column::ProductId)
        .offset(Some(page.saturating_sub(1).saturating_mul(limit)))
        .limit(Some(limit))
        .into_model::<ProductView>()
        .all(state.conn())
        .await?;

    Ok(Json(ProductListResponse { total, products }))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product by ID, with its category name joined",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductView),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductView>, AppError> {
    let view = select_product_view()
        .filter(product::Column::ProductId.eq(id))
        .into_model::<ProductView>()
        .one(state.conn())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/product",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Multipart form with scalar fields and an optional `image` file. An uploaded image is stored under a fresh unique filename; without one the picture is the `no-image` sentinel.",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product created", body = product::Model),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<product::Model>, AppError> {
    let (form, upload) = parse_product_form(multipart).await?;

    // Image bytes hit the disk before the row insert; on a DB failure the
    // orphaned file is left behind rather than risking a row without its file.
    let picture = match upload {
        Some(upload) => {
            let file_name = image::unique_filename(&upload.file_name);
            image::save_image(&state.config.uploads.dir, &file_name, &upload.bytes).await?;
            file_name
        }
        None => image::NO_IMAGE.to_string(),
    };

    let now = chrono::Local::now().naive_local();
    let model = product::ActiveModel {
        category_id: Set(form.category_id),
        product_name: Set(form.product_name),
        unit_price: Set(form.unit_price),
        unit_in_stock: Set(form.unit_in_stock),
        product_picture: Set(Some(picture)),
        created_date: Set(now),
        modified_date: Set(now),
        ..Default::default()
    }
    .insert(state.conn())
    .await
    .map_err(map_category_fk_err)?;

    Ok(Json(model))
}

#[utoipa::path(
    put,
    path = "/api/product/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Replace a product's fields",
    description = "Multipart form like create. A new image is written under a fresh name first, then the previous file is deleted unless it is the sentinel; a missing old file is ignored. Without an image part the picture is unchanged.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = product::Model),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(id))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<product::Model>, AppError> {
    let existing = find_product(state.conn(), id).await?;

    let (form, upload) = parse_product_form(multipart).await?;

    let old_picture = existing.product_picture.clone();
    let mut active: product::ActiveModel = existing.into();
    active.category_id = Set(form.category_id);
    active.product_name = Set(form.product_name);
    active.unit_price = Set(form.unit_price);
    active.unit_in_stock = Set(form.unit_in_stock);
    active.modified_date = Set(chrono::Local::now().naive_local());

    if let Some(upload) = upload {
        let file_name = image::unique_filename(&upload.file_name);
        // Write the replacement before dropping the only existing copy.
        image::save_image(&state.config.uploads.dir, &file_name, &upload.bytes).await?;
        if let Some(ref old) = old_picture {
            image::delete_image(&state.config.uploads.dir, old).await;
        }
        active.product_picture = Set(Some(file_name));
    }

    let model = active
        .update(state.conn())
        .await
        .map_err(map_category_fk_err)?;

    Ok(Json(model))
}

#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Removes the row, then best-effort deletes the stored image file unless it is the sentinel.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product", body = product::Model),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<product::Model>, AppError> {
    let existing = find_product(state.conn(), id).await?;

    product::Entity::delete_by_id(id).exec(state.conn()).await?;

    if let Some(ref picture) = existing.product_picture {
        image::delete_image(&state.config.uploads.dir, picture).await;
    }

    Ok(Json(existing))
}

/// Product columns plus the category name, joined through the nullable FK so
/// un-categorized products still appear.
fn select_product_view() -> Select<product::Entity> {
    product::Entity::find()
        .select_only()
        .columns([
            product::Column::ProductId,
            product::Column::ProductName,
            product::Column::UnitPrice,
            product::Column::UnitInStock,
            product::Column::ProductPicture,
            product::Column::CreatedDate,
            product::Column::ModifiedDate,
            product::Column::CategoryId,
        ])
        .column(category::Column::CategoryName)
        .join(JoinType::LeftJoin, product::Relation::Category.def())
}

async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

fn map_category_fk_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Validation(
            "categoryId does not reference an existing category".into(),
        ),
        _ => AppError::from(e),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path as FsPath;

    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    use super::*;
    use crate::state::test_util::state_with;

    const BOUNDARY: &str = "test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, file_name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{value}\r\n"
        )
    }

    async fn multipart_from(parts: &[String]) -> Multipart {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        let req = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    fn sample_time() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn cola(picture: &str) -> product::Model {
        product::Model {
            product_id: 1,
            category_id: Some(1),
            product_name: Some("Cola".into()),
            unit_price: Some(Decimal::new(150, 2)),
            unit_in_stock: Some(100),
            product_picture: Some(picture.into()),
            created_date: sample_time(),
            modified_date: sample_time(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::from(n))])
    }

    fn view_row(id: i32, name: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("product_id", Value::from(id)),
            ("product_name", Value::from(name)),
            ("unit_price", Value::from(Decimal::new(150, 2))),
            ("unit_in_stock", Value::from(100i32)),
            ("product_picture", Value::from(image::NO_IMAGE)),
            ("created_date", Value::from(sample_time())),
            ("modified_date", Value::from(sample_time())),
            ("category_id", Value::from(1i32)),
            ("category_name", Value::from("Beverages")),
        ])
    }

    fn query(page: Option<u64>, limit: Option<u64>) -> ProductListQuery {
        ProductListQuery {
            page,
            limit,
            pname: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn list_joins_category_name_and_reports_total() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(2)]])
            .append_query_results([vec![view_row(2, "Fanta"), view_row(1, "Cola")]]);
        let state = state_with(db.into_connection(), std::env::temp_dir());

        let Json(resp) = list_products(State(state), Query(query(None, None)))
            .await
            .unwrap();

        assert_eq!(resp.total, 2);
        assert_eq!(resp.products.len(), 2);
        assert_eq!(resp.products[0].product_id, 2);
        assert_eq!(resp.products[0].category_name.as_deref(), Some("Beverages"));
    }

    #[tokio::test]
    async fn list_past_the_last_page_is_empty_with_correct_total() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let state = state_with(db.into_connection(), std::env::temp_dir());

        let Json(resp) = list_products(State(state), Query(query(Some(9), Some(10))))
            .await
            .unwrap();

        assert_eq!(resp.total, 3);
        assert!(resp.products.is_empty());
    }

    #[tokio::test]
    async fn list_with_huge_page_numbers_does_not_overflow() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let state = state_with(db.into_connection(), std::env::temp_dir());

        let Json(resp) = list_products(State(state), Query(query(Some(u64::MAX), Some(1000))))
            .await
            .unwrap();

        assert_eq!(resp.total, 3);
        assert!(resp.products.is_empty());
    }

    #[tokio::test]
    async fn get_missing_product_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let state = state_with(db.into_connection(), std::env::temp_dir());

        let err = get_product(State(state), Path(404)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_without_image_uses_the_sentinel() {
        let uploads = tempfile::tempdir().unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cola(image::NO_IMAGE)]]);
        let state = state_with(db.into_connection(), uploads.path().to_path_buf());

        let mp = multipart_from(&[
            text_part("productName", "Cola"),
            text_part("categoryId", "1"),
            text_part("unitPrice", "1.50"),
            text_part("unitInStock", "100"),
        ])
        .await;

        let Json(created) = create_product(State(state), mp).await.unwrap();
        assert_eq!(created.product_picture.as_deref(), Some(image::NO_IMAGE));
        assert_eq!(created.created_date, created.modified_date);

        // Nothing was written to the uploads dir.
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn create_with_image_persists_the_file_first() {
        let uploads = tempfile::tempdir().unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cola("whatever.png")]]);
        let state = state_with(db.into_connection(), uploads.path().to_path_buf());

        let mp = multipart_from(&[
            text_part("productName", "Cola"),
            file_part("image", "cola.PNG", "PNGBYTES"),
        ])
        .await;

        create_product(State(state), mp).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(uploads.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".png"));
        assert_ne!(files[0], image::NO_IMAGE);
    }

    #[tokio::test]
    async fn update_with_new_image_replaces_the_old_file() {
        let uploads = tempfile::tempdir().unwrap();
        std::fs::write(uploads.path().join("old.png"), b"OLD").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cola("old.png")]])
            .append_query_results([[cola("new.jpg")]]);
        let state = state_with(db.into_connection(), uploads.path().to_path_buf());

        let mp = multipart_from(&[
            text_part("productName", "Cola"),
            text_part("unitInStock", "90"),
            file_part("image", "fresh.jpg", "JPGBYTES"),
        ])
        .await;

        update_product(State(state), Path(1), mp).await.unwrap();

        assert!(!uploads.path().join("old.png").exists());
        let files: Vec<_> = std::fs::read_dir(uploads.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".jpg"));
    }

    #[tokio::test]
    async fn delete_removes_the_stored_image_but_not_the_sentinel() {
        let uploads = tempfile::tempdir().unwrap();
        std::fs::write(uploads.path().join("pic.png"), b"PIC").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cola("pic.png")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let state = state_with(db.into_connection(), uploads.path().to_path_buf());

        let Json(deleted) = delete_product(State(state), Path(1)).await.unwrap();
        assert_eq!(deleted.product_id, 1);
        assert!(!uploads.path().join("pic.png").exists());

        // Sentinel case leaves the filesystem alone.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cola(image::NO_IMAGE)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let state = state_with(db.into_connection(), uploads.path().to_path_buf());
        delete_product(State(state), Path(1)).await.unwrap();
        assert!(FsPath::new(uploads.path()).exists());
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found_before_reading_the_form() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let state = state_with(db.into_connection(), std::env::temp_dir());

        let mp = multipart_from(&[text_part("productName", "Ghost")]).await;
        let err = update_product(State(state), Path(77), mp).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
