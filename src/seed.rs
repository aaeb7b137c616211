use sea_orm::*;
use tracing::info;

use crate::entity::role::{self, Role};

/// Idempotently create the three fixed roles. Run once at startup and again
/// before every role assignment; a no-op when all roles already exist.
pub async fn ensure_roles_exist<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let mut inserted = 0u64;
    for role in Role::ALL {
        let model = role::ActiveModel {
            name: Set(role.as_str().to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new roles", inserted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn seeds_all_three_roles() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        ensure_roles_exist(&db).await.unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn is_idempotent_when_roles_already_exist() {
        // ON CONFLICT DO NOTHING reports zero affected rows on the second run.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        assert!(ensure_roles_exist(&db).await.is_ok());
    }
}
