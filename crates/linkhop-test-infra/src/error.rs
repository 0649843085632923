use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to run container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
    #[error("failed to reach redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("failed to reach mysql: {0}")]
    MySql(#[from] sqlx::Error),
    #[error("service not ready after {attempts} attempts")]
    NotReady { attempts: u32 },
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;
