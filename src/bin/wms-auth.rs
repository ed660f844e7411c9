use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use wms_auth::{
    auth::PasswordHasher,
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{RoleRepository, UserRepository},
    routes, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("wms-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    if let Ok(env) = std::env::var("WMS_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wms-auth starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    let config = Arc::new(config);
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(UserRepository::new(db_pool.clone())),
        Arc::new(RoleRepository::new(db_pool.clone())),
        Some(db_pool),
        PasswordHasher::new(),
    )?);

    if let Some((username, email, password)) = config.bootstrap.superadmin() {
        app_state
            .user_admin_service
            .ensure_superadmin(username, email, password)
            .await?;
    }

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    let shutdown = Arc::new(Notify::new());
    let signal_shutdown = shutdown.clone();
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                signal_shutdown.notify_one();
            })
            .await
    };

    // 收到信号后最多等待 graceful_shutdown_timeout_secs
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let forced = async {
        shutdown.notified().await;
        tokio::time::sleep(timeout).await;
    };

    tokio::select! {
        result = server => result?,
        _ = forced => tracing::warn!("Graceful shutdown timeout reached, forcing exit"),
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}

fn print_help() {
    println!("wms-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: wms-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 WMS_ 前缀的环境变量完成，嵌套字段用 __ 分隔:");
    println!("  WMS_DATABASE__URL                  PostgreSQL 连接串（必填）");
    println!("  WMS_SECURITY__JWT_SECRET           令牌签名密钥（至少 32 字符）");
    println!("  WMS_SERVER__ADDR                   监听地址（默认 0.0.0.0:8081）");
    println!("  WMS_LOGGING__LEVEL / FORMAT        日志级别与格式（json / pretty）");
    println!("  WMS_BOOTSTRAP__SUPERADMIN_*        首个超级管理员（USERNAME / EMAIL / PASSWORD）");
    println!("  WMS_ENV                            选择加载的 .env.<name> 文件");
}
