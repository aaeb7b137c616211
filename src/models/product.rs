use std::str::FromStr;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use rust_decimal::Decimal;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Query string for the paginated product list.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u64>,
    /// Page size (default 10).
    pub limit: Option<u64>,
    /// Case-insensitive substring filter on the product name.
    pub pname: Option<String>,
    /// Exact category filter.
    pub category_id: Option<i32>,
}

/// Product row joined with its category's name.
#[derive(Debug, PartialEq, FromQueryResult, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub product_id: i32,
    pub product_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub unit_in_stock: Option<i32>,
    pub product_picture: Option<String>,
    pub created_date: chrono::NaiveDateTime,
    pub modified_date: chrono::NaiveDateTime,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
}

/// Product list envelope: the filtered count plus one page of rows.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub total: u64,
    pub products: Vec<ProductView>,
}

/// Floor page and limit at 1, applying the defaults (page 1, limit 10).
pub fn normalize_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).max(1);
    (page, limit)
}

/// OpenAPI shape of the product create/update multipart form. Parsing goes
/// through [`parse_product_form`]; this type only feeds the documentation.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpload {
    pub category_id: Option<i32>,
    /// Product name (at most 50 characters).
    pub product_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub unit_in_stock: Option<i32>,
    /// Image file contents.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Scalar fields of the product create/update multipart form.
#[derive(Debug, Default, PartialEq)]
pub struct ProductForm {
    pub category_id: Option<i32>,
    pub product_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub unit_in_stock: Option<i32>,
}

/// An uploaded image file, still carrying the client's original filename.
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart body of a product create/update request.
///
/// Empty scalar fields are treated as absent; an empty image part means
/// "no image supplied". Unknown parts are skipped.
pub async fn parse_product_form(
    mut multipart: Multipart,
) -> Result<(ProductForm, Option<UploadedImage>), AppError> {
    let mut form = ProductForm::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read image upload: {e}"))
                })?;
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "productName" => {
                let value = text_field(&name, field).await?;
                if !value.is_empty() {
                    form.product_name = Some(value);
                }
            }
            "categoryId" => form.category_id = scalar_field(&name, field).await?,
            "unitPrice" => form.unit_price = scalar_field(&name, field).await?,
            "unitInStock" => form.unit_in_stock = scalar_field(&name, field).await?,
            _ => {}
        }
    }

    if let Some(ref name) = form.product_name {
        if name.chars().count() > 50 {
            return Err(AppError::Validation(
                "Product name must be at most 50 characters".into(),
            ));
        }
    }

    Ok((form, image))
}

async fn text_field(name: &str, field: Field<'_>) -> Result<String, AppError> {
    let value = field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
    Ok(value.trim().to_string())
}

async fn scalar_field<T>(name: &str, field: Field<'_>) -> Result<Option<T>, AppError>
where
    T: FromStr,
{
    let value = text_field(name, field).await?;
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Field '{name}' has an invalid value")))
}
