mod config;
mod db;
mod ipc;
mod records;
mod table;

use simplelog::{ConfigBuilder, WriteLogger};
use std::io::{self, BufRead, Write};

fn main() {
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("schoold: {e:#}");
            std::process::exit(2);
        }
    };

    // stdout carries protocol frames only; logs go to stderr.
    let _ = WriteLogger::init(
        cfg.log_level,
        ConfigBuilder::new().set_time_format_rfc3339().build(),
        io::stderr(),
    );
    log::info!("schoold {} starting", env!("CARGO_PKG_VERSION"));

    let startup_workspace = cfg.workspace.clone();
    let mut state = ipc::AppState::new(cfg);
    if let Some(path) = startup_workspace {
        // The UI can still pick a workspace later; don't exit on failure.
        if let Err(e) = ipc::open_workspace(&mut state, &path) {
            log::error!("startup workspace {}: {e:?}", path.to_string_lossy());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("bad request line: {e}");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("stdin closed, shutting down");
}
