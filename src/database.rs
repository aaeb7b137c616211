use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
    sea_query::TableCreateStatement,
};

use crate::entity;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    create_tables(&db).await?;

    Ok(db)
}

/// Create the schema from the entity definitions if it does not exist yet.
///
/// Foreign key actions come from the entity relations, including the
/// ON DELETE SET NULL on `products.category_id`.
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Referenced tables first.
    let mut stmts: [TableCreateStatement; 5] = [
        schema.create_table_from_entity(entity::category::Entity),
        schema.create_table_from_entity(entity::product::Entity),
        schema.create_table_from_entity(entity::user::Entity),
        schema.create_table_from_entity(entity::role::Entity),
        schema.create_table_from_entity(entity::user_role::Entity),
    ];

    for stmt in &mut stmts {
        stmt.if_not_exists();
        db.execute(builder.build(&*stmt)).await?;
    }

    Ok(())
}
