use crate::events::AppEvent;
use async_channel::Sender;
use strum::{Display as StrumDisplay, EnumString};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

pub const SOCKET_PATH: &str = "/tmp/piemenu.sock";

/// One line on the control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Request {
    Show,
    Hide,
}

impl From<Request> for AppEvent {
    fn from(request: Request) -> Self {
        match request {
            Request::Show => AppEvent::Show,
            Request::Hide => AppEvent::Hide,
        }
    }
}

pub async fn run_server(tx: Sender<AppEvent>) {
    // Cleanup old socket if it exists
    if fs_err::metadata(SOCKET_PATH).is_ok() {
        let _ = fs_err::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        match line.trim().parse::<Request>() {
                            Ok(request) => {
                                let _ = tx.send(request.into()).await;
                            }
                            Err(_) => log::warn!("Unknown request '{}'", line.trim()),
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}
