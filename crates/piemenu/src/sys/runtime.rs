use crate::events::AppEvent;
use crate::{config, sys::server};
use async_channel::Sender;
use std::io;
use std::thread::{self, JoinHandle};
use tokio::runtime::Builder;

/// Runs the control socket and the config watcher on their own tokio thread, leaving the
/// main thread to GTK.
pub fn start_background_services(tx: Sender<AppEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("piemenu-services".into())
        .spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create Tokio runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                tokio::join!(
                    server::run_server(tx.clone()),
                    config::run_async_watcher(tx)
                );
            });
            log::warn!("Background services stopped");
        })
}
