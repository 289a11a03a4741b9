//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result, ServerState};
use crate::orders::OrderWorker;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<(ServerState, OrderWorker)>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState, worker: OrderWorker) -> Self {
        Self {
            config,
            state: Some((state, worker)),
        }
    }

    /// Run until Ctrl-C, then drain HTTP connections and stop background tasks
    pub async fn run(self) -> Result<()> {
        let (state, worker) = match self.state {
            Some(s) => s,
            None => ServerState::initialize(&self.config).await?,
        };

        let mut tasks = BackgroundTasks::new();
        state.start_background_tasks(worker, &mut tasks);

        let app = crate::routes::build_app(&state).with_state(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Korm server listening");

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tasks.shutdown().await;
        state.pool.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}
