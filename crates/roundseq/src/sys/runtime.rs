use crate::events::AppEvent;
use async_channel::Sender;
use std::path::{Path, PathBuf};
use std::thread;
use tokio::runtime::Runtime;

/// Runs the socket server, config watcher and Ctrl-C handler on a tokio
/// runtime in a background thread. All of them feed `tx`.
pub fn start_background_services(tx: Sender<AppEvent>, config_path: PathBuf) {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create Tokio runtime: {}", e);
                let _ = tx.send_blocking(AppEvent::Shutdown);
                return;
            }
        };

        rt.block_on(async {
            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::sys::server::run_server(Path::new(super::SOCKET_PATH), tx).await;
                });
            }

            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::config::run_async_watcher(config_path, tx).await;
                });
            }

            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                        return;
                    }
                    log::info!("Interrupted, shutting down");
                    let _ = tx.send(AppEvent::Shutdown).await;
                });
            }

            std::future::pending::<()>().await;
        });
    });
}
