use crate::{Result, TestInfraError};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tracing::debug;
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;
const READY_ATTEMPTS: u32 = 30;
const READY_BACKOFF: Duration = Duration::from_millis(500);

/// Database and credentials the container is initialized with.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(default = "linkhop".to_string(), setter(into)))]
pub struct MysqlConfig {
    database: String,
    username: String,
    password: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A throwaway MySQL server for integration tests. The container is removed
/// when this value is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .with_env_var("MYSQL_DATABASE", config.database.clone())
            .with_env_var("MYSQL_USER", config.username.clone())
            .with_env_var("MYSQL_PASSWORD", config.password.clone())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn connect_options(&self) -> Result<MySqlConnectOptions> {
        let host = self.container.get_host().await?.to_string();
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;

        Ok(MySqlConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&self.config.username)
            .password(&self.config.password)
            .database(&self.config.database))
    }

    /// DSN in the form accepted by `--mysql-dsn`.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        let MysqlConfig {
            database,
            username,
            password,
        } = &self.config;
        Ok(format!("mysql://{username}:{password}@{host}:{port}/{database}"))
    }

    /// Opens a small pool once the server accepts logins.
    ///
    /// The image restarts MySQL after running its init scripts, so the wait
    /// message can appear before the final server is up.
    pub async fn connect(&self) -> Result<MySqlPool> {
        let options = self.connect_options().await?;

        for attempt in 1..=READY_ATTEMPTS {
            let pool = MySqlPoolOptions::new()
                .max_connections(5)
                .connect_with(options.clone())
                .await;
            match pool {
                Ok(pool) => return Ok(pool),
                Err(e) => debug!(attempt, error = %e, "waiting for mysql"),
            }
            tokio::time::sleep(READY_BACKOFF).await;
        }

        Err(TestInfraError::NotReady {
            attempts: READY_ATTEMPTS,
        })
    }
}
