use serde::Deserialize;

use crate::error::AppError;

/// Body for category create and full-replace update.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    /// Category name (1-128 characters).
    #[schema(example = "Beverages")]
    pub category_name: String,
    #[schema(example = 1)]
    pub category_status: i32,
}

pub fn validate_category_payload(payload: &CategoryPayload) -> Result<(), AppError> {
    let name = payload.category_name.trim();
    if name.is_empty() || name.chars().count() > 128 {
        return Err(AppError::Validation(
            "Category name must be 1-128 characters".into(),
        ));
    }
    Ok(())
}

/// Query string for the category list.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CategoryListQuery {
    /// Case-insensitive substring filter on the category name.
    pub name: Option<String>,
}
