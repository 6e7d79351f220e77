use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Opens (creating if needed) the store under `path` and makes it current.
/// Open table sessions belong to the previous workspace and are dropped.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    if !state.tables.is_empty() {
        log::info!("closing {} table sessions on workspace switch", state.tables.len());
        state.tables.clear();
    }
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    log::info!("workspace open: {}", path.to_string_lossy());
    Ok(())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "openTables": state.tables.len()
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            log::error!("failed to open workspace {}: {e:?}", path.to_string_lossy());
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn handle_seed_demo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let today = chrono::Local::now().date_naive();
        records::seed_demo(conn, today)
            .map(|counts| json!({ "inserted": counts }))
            .map_err(|e| HandlerErr::from_record(e, "db_insert_failed"))
    });
    respond(&req.id, result)
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let key = get_required_str(&req.params, "key")?;
        let value = db::settings_get_json(conn, &key)
            .map_err(|e| HandlerErr::new("db_query_failed", format!("{e:?}")))?;
        Ok(json!({ "key": key, "value": value }))
    });
    respond(&req.id, result)
}

fn handle_settings_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let key = get_required_str(&req.params, "key")?;
        let Some(value) = req.params.get("value") else {
            return Err(HandlerErr::new("bad_params", "missing value"));
        };
        db::settings_set_json(conn, &key, value)
            .map_err(|e| HandlerErr::new("db_update_failed", format!("{e:?}")))?;
        Ok(json!({ "key": key, "value": value }))
    });
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.seedDemo" => Some(handle_seed_demo(state, req)),
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.set" => Some(handle_settings_set(state, req)),
        _ => None,
    }
}
