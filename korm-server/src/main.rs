use korm_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境 (dotenv, 配置, 工作目录, 日志)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        "Korm server starting..."
    );

    // 2. 初始化服务器状态
    let (state, worker) = ServerState::initialize(&config).await?;
    state.ensure_admin().await?;

    // 3. 启动 HTTP 服务器 (后台任务随之启动)
    let server = Server::with_state(config, state, worker);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
