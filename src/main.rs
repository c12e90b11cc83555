use log::*;
use service::{
    config::Config,
    error::{Error, ErrorKind},
    logging::Logger,
    static_document, AppState,
};
use sse::Manager;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    info!("Chat relay v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Error> {
    let index_html = static_document::load_index_html(&config).await?;
    let sse_manager = Arc::new(Manager::new());
    let listen_addr = config.listen_addr();

    let app_state = AppState::new(config, &sse_manager, index_html);
    let router = web::define_routes(app_state);

    let listener = TcpListener::bind(&listen_addr)
        .await
        .map_err(|err| Error::new(ErrorKind::Listener, err))?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&sse_manager)))
        .await
        .map_err(|err| Error::new(ErrorKind::Server, err))?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, after closing every open event stream.
/// Event streams never finish on their own, so graceful shutdown would wait forever.
async fn shutdown_signal(sse_manager: Arc<Manager>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    sse_manager.close_all();
}
