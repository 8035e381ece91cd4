use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Apply pending schema migrations on startup.
    pub run_migrations: bool,
}

impl DatabaseConfig {
    fn connect_options(&self) -> ConnectOptions {
        let mut opts = ConnectOptions::new(self.url.clone());
        opts.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(CONNECT_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .sqlx_logging(true);
        opts
    }
}

/// The pool every repository shares.
pub struct DatabaseConnections {
    pub main: DbConn,
}

impl DatabaseConnections {
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let main = Database::connect(config.connect_options()).await?;
        tracing::info!(
            max = config.max_connections,
            min = config.min_connections,
            "Database pool ready"
        );
        Ok(Self { main })
    }
}
