use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i32,

    pub category_id: Option<i32>,

    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub product_name: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub unit_price: Option<Decimal>,
    pub unit_in_stock: Option<i32>,

    /// Stored image filename, or the `"no-image"` sentinel.
    #[sea_orm(column_type = "String(StringLen::N(1024))", nullable)]
    pub product_picture: Option<String>,

    // Naive local timestamps, matching the `timestamp without time zone` columns.
    pub created_date: DateTime,
    pub modified_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::CategoryId",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
