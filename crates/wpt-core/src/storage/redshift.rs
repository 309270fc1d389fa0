use super::Warehouse;
use crate::config::WarehouseConfig;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

/// Redshift speaks the Postgres wire protocol. The connection is opened once
/// and held until the process exits.
pub struct RedshiftWarehouse {
    cfg: WarehouseConfig,
    conn: Option<PgConnection>,
}

impl RedshiftWarehouse {
    pub fn new(cfg: WarehouseConfig) -> Self {
        Self { cfg, conn: None }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.cfg.host)
            .port(self.cfg.port)
            .database(&self.cfg.database)
            .username(&self.cfg.user)
            .password(&self.cfg.password)
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    async fn connect(&mut self) -> anyhow::Result<()> {
        let conn = PgConnection::connect_with(&self.connect_options())
            .await
            .with_context(|| {
                format!(
                    "connecting to {}:{}/{}",
                    self.cfg.host, self.cfg.port, self.cfg.database
                )
            })?;
        self.conn = Some(conn);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> anyhow::Result<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("warehouse is not connected"))?;
        // A bare &str carries no arguments, so it goes out over the simple query
        // protocol; Redshift does not cope well with prepared statements.
        sqlx::Executor::execute(&mut *conn, sql)
            .await
            .context("executing statement")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn config(port: u16) -> WarehouseConfig {
        WarehouseConfig {
            host: "127.0.0.1".into(),
            port,
            database: "fxa".into(),
            user: "loader".into(),
            password: "hunter2".into(),
        }
    }

    fn message(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend_from_slice(&((body.len() + 4) as i32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    async fn read_sized(sock: &mut TcpStream) -> std::io::Result<Vec<u8>> {
        let len = sock.read_i32().await? as usize;
        let mut body = vec![0; len.saturating_sub(4)];
        sock.read_exact(&mut body).await?;
        Ok(body)
    }

    /// Minimal Postgres backend: trusts every login and acknowledges every
    /// simple query. Returns the query texts it received.
    async fn fake_backend() -> std::io::Result<(u16, JoinHandle<std::io::Result<Vec<String>>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await?;

            // SSLRequest is answered with 'N'; the next packet is the startup message.
            let mut first = read_sized(&mut sock).await?;
            if first.len() == 4 && first[..] == 80877103i32.to_be_bytes() {
                sock.write_all(b"N").await?;
                first = read_sized(&mut sock).await?;
            }
            assert!(first.windows(6).any(|w| w == b"loader"), "startup carries the user");

            sock.write_all(&message(b'R', &0i32.to_be_bytes())).await?;
            sock.write_all(&message(b'S', b"server_version\x008.0.2\x00")).await?;
            sock.write_all(&message(b'K', &[0, 0, 0, 1, 0, 0, 0, 2])).await?;
            sock.write_all(&message(b'Z', b"I")).await?;

            let mut queries = Vec::new();
            loop {
                let tag = match sock.read_u8().await {
                    Ok(tag) => tag,
                    Err(_) => break,
                };
                let body = read_sized(&mut sock).await?;
                match tag {
                    b'Q' => {
                        let text = String::from_utf8_lossy(&body)
                            .trim_end_matches('\0')
                            .to_string();
                        queries.push(text);
                        sock.write_all(&message(b'C', b"CREATE TABLE\x00")).await?;
                        sock.write_all(&message(b'Z', b"I")).await?;
                    }
                    b'X' => break,
                    other => panic!("unexpected frontend message {:?}", other as char),
                }
            }
            Ok(queries)
        });
        Ok((port, handle))
    }

    #[tokio::test]
    async fn test_execute_before_connect_fails() {
        let mut wh = RedshiftWarehouse::new(config(5439));
        let err = wh.execute("SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn test_statements_go_out_as_simple_queries() -> anyhow::Result<()> {
        let (port, backend) = fake_backend().await?;

        let mut wh = RedshiftWarehouse::new(config(port));
        wh.connect().await?;
        wh.execute("CREATE TABLE IF NOT EXISTS latest_wpt_runs (test VARCHAR(32));")
            .await?;
        drop(wh);

        let queries = backend.await??;
        assert_eq!(
            queries,
            vec!["CREATE TABLE IF NOT EXISTS latest_wpt_runs (test VARCHAR(32));".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_failure_names_the_target() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let mut wh = RedshiftWarehouse::new(config(port));
        let err = wh.connect().await.unwrap_err();
        assert!(format!("{:#}", err).contains(&format!("127.0.0.1:{}/fxa", port)));
        Ok(())
    }
}
