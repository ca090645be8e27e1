use crate::events::AppEvent;
use async_channel::Sender;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub async fn run_server(socket_path: &Path, tx: Sender<AppEvent>) {
    // Stale socket from a previous run
    if fs_err::metadata(socket_path).is_ok() {
        let _ = fs_err::remove_file(socket_path);
    }

    let listener = match UnixListener::bind(socket_path) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket {}: {}", socket_path.display(), e);
            return;
        }
    };
    log::info!("Listening for touch input on {}", socket_path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    handle_client(stream, tx).await;
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, tx: Sender<AppEvent>) {
    let mut lines = BufReader::new(stream).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<AppEvent>() {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            Err(e) => log::warn!("Ignoring '{}': {}", line, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radial::{Point, TouchId, TouchInput, TouchPhase};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_lines_become_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundseq.sock");
        let (tx, rx) = async_channel::unbounded();

        let server_path = path.clone();
        let server = tokio::spawn(async move { run_server(&server_path, tx).await });

        let mut stream = loop {
            match UnixStream::connect(&path).await {
                Ok(s) => break s,
                Err(_) => tokio::task::yield_now().await,
            }
        };
        stream
            .write_all(b"down 1 940 540\nbogus\n\n# comment\noctave up\n")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::Touch(TouchInput::new(
                TouchId::new(1),
                TouchPhase::Down,
                Point::new(940.0, 540.0)
            ))
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::Octave(crate::events::OctaveChange::Up)
        );
        server.abort();
    }
}
