//! The server: a Unix-domain socket accept loop, one client at a time.
//!
//! A client holds the server until it disconnects or issues `shutdown`;
//! session state lives exactly as long as the connection. The catalog is
//! loaded once at startup and flushed on shutdown, and the data directory
//! is held under an advisory lock for the server's lifetime.

pub mod protocol;

pub use protocol::{read_frame, write_frame, Status};

use crate::config::ServerConfig;
use crate::engine::{Response, Session};
use crate::error::{BasaltError, BasaltResult};
use crate::metrics::{Metric, MetricUnit, MetricsCollector};
use crate::persist;
use crate::PAGE_SIZE;
use std::io::{BufReader, BufWriter};
use std::os::unix::net::{UnixListener, UnixStream};

/// Runs the server until a client issues `shutdown`.
pub fn serve(config: &ServerConfig) -> BasaltResult<()> {
    let _lock = persist::lock_data_dir(&config.data_dir)?;

    let catalog = persist::load(&config.data_dir)?.unwrap_or_default();
    let mut session = Session::from_catalog(catalog);

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path).map_err(|e| BasaltError::IoError {
            operation: "unlink_socket".to_string(),
            reason: e.to_string(),
        })?;
    }
    let listener = UnixListener::bind(&config.socket_path).map_err(|e| BasaltError::IoError {
        operation: "bind_socket".to_string(),
        reason: e.to_string(),
    })?;

    for stream in listener.incoming() {
        let stream = stream.map_err(|e| BasaltError::IoError {
            operation: "accept".to_string(),
            reason: e.to_string(),
        })?;
        let shutting_down = handle_client(stream, &mut session)?;
        session.reset_context();
        if config.metrics_enabled {
            let _ = MetricsCollector::global().flush_to(&config.data_dir.join("metrics"));
        }
        if shutting_down {
            break;
        }
    }

    persist::save(&session.catalog, &config.data_dir)?;
    let _ = std::fs::remove_file(&config.socket_path);
    Ok(())
}

/// Serves one client; returns true when the client asked for shutdown.
fn handle_client(stream: UnixStream, session: &mut Session) -> BasaltResult<bool> {
    let session_id = uuid::Uuid::new_v4();
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| BasaltError::IoError {
        operation: "clone_stream".to_string(),
        reason: e.to_string(),
    })?);
    let mut writer = BufWriter::new(stream);
    let mut queries = 0u64;

    let shutting_down = loop {
        let (_, payload) = match read_frame(&mut reader)? {
            Some(frame) => frame,
            None => break false,
        };
        let line = String::from_utf8_lossy(&payload);
        queries += 1;

        match session.run(&line) {
            Ok(Response::Done(message)) => {
                write_frame(&mut writer, Status::OkDone, message.as_bytes())?;
            }
            Ok(Response::Print(payload)) => {
                send_print(&mut writer, &payload)?;
            }
            Ok(Response::Shutdown) => {
                write_frame(&mut writer, Status::ShutdownServer, b"Shutting down.")?;
                break true;
            }
            Err(err) => {
                let status = Status::from(&err);
                write_frame(&mut writer, status, err.to_string().as_bytes())?;
            }
        }
    };

    MetricsCollector::global().record(
        Metric::new("session_queries", queries as f64, MetricUnit::Count)
            .with_tag("session", &session_id.to_string()),
    );
    Ok(shutting_down)
}

/// Streams a print payload in page-sized chunks; the final chunk carries
/// `OkDone`, everything before it `OkWaitForResponse`.
fn send_print(writer: &mut impl std::io::Write, payload: &str) -> BasaltResult<()> {
    let bytes = payload.as_bytes();
    if bytes.len() <= PAGE_SIZE {
        return write_frame(writer, Status::OkDone, bytes);
    }
    let mut chunks = bytes.chunks(PAGE_SIZE).peekable();
    while let Some(chunk) = chunks.next() {
        let status = if chunks.peek().is_some() {
            Status::OkWaitForResponse
        } else {
            Status::OkDone
        };
        write_frame(writer, status, chunk)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_chunks_terminate_with_ok_done() {
        let mut wire = Vec::new();
        let payload = "x".repeat(PAGE_SIZE * 2 + 10);
        send_print(&mut wire, &payload).unwrap();

        let mut reader = wire.as_slice();
        let mut statuses = Vec::new();
        let mut total = 0usize;
        while let Some((status, chunk)) = read_frame(&mut reader).unwrap() {
            statuses.push(status);
            total += chunk.len();
        }
        assert_eq!(total, payload.len());
        assert_eq!(
            statuses,
            vec![
                Status::OkWaitForResponse as u32,
                Status::OkWaitForResponse as u32,
                Status::OkDone as u32,
            ]
        );
    }

    #[test]
    fn short_print_is_a_single_frame() {
        let mut wire = Vec::new();
        send_print(&mut wire, "1,2\n").unwrap();
        let mut reader = wire.as_slice();
        let (status, chunk) = read_frame(&mut reader).unwrap().unwrap();
        assert_eq!(status, Status::OkDone as u32);
        assert_eq!(chunk, b"1,2\n");
        assert_eq!(read_frame(&mut reader).unwrap(), None);
    }
}
