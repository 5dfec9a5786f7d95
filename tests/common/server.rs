//! Test server management.
//!
//! Runs relayd in-process on an ephemeral port for integration testing.

use relayd::config::Config;
use relayd::network::Gateway;
use relayd::state::{Matrix, spawn_disconnect_worker};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

/// A test server instance, shut down when dropped.
pub struct TestServer {
    address: SocketAddr,
    matrix: Arc<Matrix>,
    shutdown: Option<oneshot::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl TestServer {
    /// Spawn a server with the default configuration.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(test_config()).await
    }

    /// Spawn a server with the given configuration; the listen address is
    /// always replaced by `127.0.0.1:0`.
    pub async fn spawn_with(mut config: Config) -> anyhow::Result<Self> {
        config.listen.address = "127.0.0.1:0".parse()?;

        let (matrix, disconnect_rx) = Matrix::new(&config);
        let matrix = Arc::new(matrix);
        let worker = spawn_disconnect_worker(Arc::clone(&matrix), disconnect_rx);

        let gateway = Gateway::bind(config.listen.address, Arc::clone(&matrix)).await?;
        let address = gateway.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let gateway_task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = gateway.run_until(shutdown).await {
                eprintln!("gateway error: {e}");
            }
        });

        Ok(Self {
            address,
            matrix,
            shutdown: Some(shutdown_tx),
            tasks: vec![worker, gateway_task],
        })
    }

    /// Get the server address as `host:port`.
    pub fn address(&self) -> String {
        self.address.to_string()
    }

    /// The server's shared state.
    #[allow(dead_code)]
    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    /// Poll the registry until `predicate` holds, for up to five seconds.
    #[allow(dead_code)]
    pub async fn wait_for<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Matrix) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if predicate(&self.matrix) {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        predicate(&self.matrix)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Configuration used by most tests: fixed server name and a 3-line MOTD.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.name = "test.server".to_string();
    config.server.network = "TestNet".to_string();
    config.motd.lines = vec![
        "Test Server".to_string(),
        "Be nice".to_string(),
        "Have fun".to_string(),
    ];
    config
}
