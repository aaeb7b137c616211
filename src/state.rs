use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

/// Shared application state, cloned per request. The connection sits behind
/// an `Arc` because `DatabaseConnection` itself is not cloneable when the
/// mock backend is compiled in.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Borrow the connection for query execution.
    pub fn conn(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::AppState;
    use crate::config::{
        AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, UploadsConfig,
    };

    pub(crate) fn test_config(uploads_dir: PathBuf) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["http://localhost:3000".into()],
                },
            },
            database: DatabaseConfig {
                url: "postgres://unused".into(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-not-for-production".into(),
                issuer: "store-api-tests".into(),
                audience: "store-clients-tests".into(),
            },
            uploads: UploadsConfig { dir: uploads_dir },
        }
    }

    pub(crate) fn state_with(db: sea_orm::DatabaseConnection, uploads_dir: PathBuf) -> AppState {
        AppState {
            db: Arc::new(db),
            config: Arc::new(test_config(uploads_dir)),
        }
    }
}
