//! 资产登记服务主入口

use asset_registry::{
    config::{AppConfig, StorageBackend},
    db,
    middleware::AppState,
    repository::{
        AssetRepository, AssetStore, CredentialStore, MemoryAssetStore, MemoryCredentialStore,
        UserRepository,
    },
    routes, telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("asset-registry {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境），生产环境直接设置环境变量
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Asset registry starting...");

    // 3. 存储后端
    let (users, assets, pool) = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database initialized");

            let users: Arc<dyn CredentialStore> = Arc::new(UserRepository::new(pool.clone()));
            let assets: Arc<dyn AssetStore> = Arc::new(AssetRepository::new(pool.clone()));
            (users, assets, Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");

            let users: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
            let assets: Arc<dyn AssetStore> = Arc::new(MemoryAssetStore::new());
            (users, assets, None)
        }
    };

    // 4. 构建应用状态与路由
    let app_state = Arc::new(AppState::new(config.clone(), users, assets, pool)?);
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 6. 优雅关闭，超时后强制退出
    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown.clone()));
    let grace = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);

    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal(shutdown: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    shutdown.notify_one();
}

/// 打印帮助信息
fn print_help() {
    println!("asset-registry {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: asset-registry [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --version     Print version and exit");
    println!("  --help        Print this help and exit");
    println!();
    println!("Environment:");
    println!("  All configuration is read from ASSETS_* variables");
    println!("  e.g. ASSETS_STORAGE__BACKEND=memory ASSETS_SECURITY__JWT_SECRET=...");
}
