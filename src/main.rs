//! OPERA Cloud MCP server - main entry point.
//!
//! Speaks MCP over stdio. Logs go to stderr. An optional HTTP liveness
//! probe runs alongside when `--health-addr` is given.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use opera_cloud_mcp::mcp::McpServer;
use opera_cloud_mcp::{liveness, observability, Config};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "opera-cloud-mcp", version, about = "MCP server for the OPERA Cloud REST API")]
struct Args {
    /// TOML configuration file, merged under OPERA_* environment variables.
    #[arg(long, env = "OPERA_CONFIG")]
    config: Option<PathBuf>,

    /// Address for the HTTP liveness probe.
    #[arg(long, env = "OPERA_HEALTH_ADDR")]
    health_addr: Option<SocketAddr>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

/// Grace period for background tasks; a pending stdin read never completes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> ExitCode {
    let args = Args::parse();
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("opera-cloud-mcp: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(args));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

async fn run(args: Args) -> ExitCode {
    let mut config = match Config::load_validated(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("opera-cloud-mcp: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(format) = args.log_format {
        config.observability.json_logs = matches!(format, LogFormat::Json);
    }
    observability::init_tracing(&config.observability);

    let server = match McpServer::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("opera-cloud-mcp: {}", e);
            return ExitCode::from(2);
        }
    };
    let cancel = server.cancellation_token();

    tracing::info!(
        environment = config.environment.as_str(),
        base_url = %server.bridge().base_url(),
        tools = server.list_tools().len(),
        "OPERA Cloud MCP server starting on stdio"
    );

    let probe = args.health_addr.map(|addr| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = liveness::bind_and_serve(addr, cancel).await {
                tracing::error!(%addr, error = %e, "liveness probe failed");
            }
        })
    });

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received");
                cancel.cancel();
            }
        });
    }

    let outcome = server.serve_stdio().await;
    cancel.cancel();
    if let Some(probe) = probe {
        let _ = probe.await;
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "stdio transport failed");
            ExitCode::FAILURE
        }
    }
}
