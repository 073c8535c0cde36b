//! basalt-client: interactive shell (or script runner) over the server
//! socket.

use anyhow::{Context, Result};
use basalt::config::DEFAULT_SOCKET_PATH;
use basalt::net::protocol::{read_frame, write_frame, Status};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::BufRead;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "basalt-client", about = "Basalt column store client", version)]
struct Args {
    /// Server socket path
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Output format: plain or json
    #[arg(long, default_value = "plain")]
    format: String,

    /// Script of queries to run instead of an interactive shell
    /// ("-" reads stdin)
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let json = match args.format.as_str() {
        "plain" => false,
        "json" => true,
        other => anyhow::bail!("unknown format '{}'", other),
    };

    let stream = UnixStream::connect(&args.socket)
        .with_context(|| format!("connecting to {}", args.socket.display()))?;

    match &args.script {
        Some(path) => run_script(&stream, path, json),
        None => run_shell(&stream, json),
    }
}

fn run_script(stream: &UnixStream, path: &PathBuf, json: bool) -> Result<()> {
    let lines: Vec<String> = if path.as_os_str() == "-" {
        std::io::stdin().lock().lines().collect::<Result<_, _>>()?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect()
    };
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if round_trip(stream, &line, json)? {
            break;
        }
    }
    Ok(())
}

fn run_shell(stream: &UnixStream, json: bool) -> Result<()> {
    println!("basalt shell (ctrl-d to quit)");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("basalt> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                if round_trip(stream, &line, json)? {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Sends one query and prints the response frames. Returns true when the
/// server is shutting down.
fn round_trip(stream: &UnixStream, line: &str, json: bool) -> Result<bool> {
    let mut writer = stream;
    write_frame(&mut writer, Status::OkDone, line.as_bytes())?;

    let mut reader = stream;
    loop {
        let Some((raw_status, payload)) = read_frame(&mut reader)? else {
            anyhow::bail!("server closed the connection");
        };
        let status = Status::from_u32(raw_status)
            .with_context(|| format!("unknown status word {}", raw_status))?;
        let text = String::from_utf8_lossy(&payload);

        if json {
            println!(
                "{}",
                serde_json::json!({ "status": status.name(), "payload": text })
            );
        } else if status.is_error() {
            eprintln!("{}: {}", status.name(), text);
        } else if !text.is_empty() {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }

        match status {
            Status::OkWaitForResponse => continue,
            Status::ShutdownServer => return Ok(true),
            _ => return Ok(false),
        }
    }
}
