use async_trait::async_trait;

/// The analytical store the results are loaded into. Statements are plain
/// SQL text; nothing is bound as a parameter.
#[async_trait]
pub trait Warehouse: Send {
    async fn connect(&mut self) -> anyhow::Result<()>;
    async fn execute(&mut self, sql: &str) -> anyhow::Result<()>;
}

pub mod redshift;
