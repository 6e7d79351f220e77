use crate::db;
use crate::ipc::helpers::{get_entity, get_object, get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request, TableSession, TableSource};
use crate::records;
use crate::table::{resolve_columns, ColumnDef, Row, SortDirection, TableOptions, TableView};
use rusqlite::Connection;
use serde_json::{json, Value};
use uuid::Uuid;

const PAGE_SIZE_SETTING: &str = "tables.defaultPageSize";

fn parse_rows(params: &Value) -> Result<Vec<Row>, HandlerErr> {
    match params.get("rows") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value::<Vec<Row>>(v.clone())
            .map_err(|_| HandlerErr::new("bad_params", "rows must be an array of objects")),
    }
}

fn parse_columns(params: &Value) -> Result<Option<Vec<ColumnDef>>, HandlerErr> {
    match params.get("columns") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value::<Vec<ColumnDef>>(v.clone())
            .map(Some)
            .map_err(|e| HandlerErr::new("bad_columns", format!("columns: {e}"))),
    }
}

fn default_page_size(state: &AppState) -> usize {
    let stored = state
        .db
        .as_ref()
        .and_then(|conn| match db::settings_get_json(conn, PAGE_SIZE_SETTING) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("ignoring {PAGE_SIZE_SETTING}: {e:?}");
                None
            }
        })
        .and_then(|v| v.as_u64())
        .filter(|n| *n > 0);
    match stored {
        Some(n) => n as usize,
        None => state.config.default_page_size,
    }
}

fn parse_options(state: &AppState, params: &Value) -> Result<TableOptions, HandlerErr> {
    let raw = get_object(params, "options")?;
    let explicit_page_size = raw.contains_key("pageSize");
    let mut options: TableOptions = serde_json::from_value(Value::Object(raw))
        .map_err(|e| HandlerErr::new("bad_options", format!("options: {e}")))?;
    if !explicit_page_size {
        options.page_size = default_page_size(state);
    }
    Ok(options)
}

fn load_entity_rows(
    conn: &Connection,
    entity: records::Entity,
    filters: &Row,
) -> Result<Vec<Row>, HandlerErr> {
    records::list(conn, entity, filters).map_err(|e| HandlerErr::from_record(e, "db_query_failed"))
}

fn open_table(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (source, rows, defs) = if params.get("entity").is_some() {
        let conn = require_db(state.db.as_ref())?;
        let entity = get_entity(params)?;
        let filters = get_object(params, "filters")?;
        let rows = load_entity_rows(conn, entity, &filters)?;
        let defs = parse_columns(params)?.unwrap_or_else(|| entity.default_columns());
        (TableSource::Entity { entity, filters }, rows, defs)
    } else {
        let Some(defs) = parse_columns(params)? else {
            return Err(HandlerErr::new(
                "bad_params",
                "missing columns (or entity)",
            ));
        };
        (TableSource::Inline, parse_rows(params)?, defs)
    };

    let options = parse_options(state, params)?;
    let columns = resolve_columns(&defs, &state.config.currency_symbol)?;
    let mut view = TableView::new(columns, options)?.with_rows(rows);

    let table_id = Uuid::new_v4().to_string();
    let rendered = view.render();
    log::info!(
        "table {} opened with {} rows",
        table_id,
        view.rows().len()
    );
    let evicted = state.insert_table(
        table_id.clone(),
        TableSession {
            view,
            source,
            last_used: 0,
        },
    );
    Ok(json!({ "tableId": table_id, "table": rendered, "evicted": evicted }))
}

/// Runs `f` against the session named by `params.tableId` and returns the
/// session's fresh render.
fn with_session<F>(state: &mut AppState, params: &Value, f: F) -> Result<Value, HandlerErr>
where
    F: FnOnce(&mut TableSession, Option<&Connection>) -> Result<(), HandlerErr>,
{
    let table_id = get_required_str(params, "tableId")?;
    let now = state.tick();
    let Some(session) = state.tables.get_mut(&table_id) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("table {} is not open", table_id),
        ));
    };
    session.last_used = now;
    f(session, state.db.as_ref())?;
    Ok(json!({ "tableId": table_id, "table": session.view.render() }))
}

fn parse_page_target(params: &Value) -> Result<PageTarget, HandlerErr> {
    match params.get("page") {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|p| PageTarget::Number(p as usize))
            .ok_or_else(|| HandlerErr::new("bad_params", "page must be a positive integer")),
        Some(Value::String(s)) if s == "next" => Ok(PageTarget::Next),
        Some(Value::String(s)) if s == "prev" => Ok(PageTarget::Prev),
        _ => Err(HandlerErr::new(
            "bad_params",
            "page must be a number, \"next\" or \"prev\"",
        )),
    }
}

enum PageTarget {
    Number(usize),
    Next,
    Prev,
}

fn handle_open(state: &mut AppState, req: &Request) -> Value {
    let result = open_table(state, &req.params);
    respond(&req.id, result)
}

fn handle_render(state: &mut AppState, req: &Request) -> Value {
    let result = with_session(state, &req.params, |_, _| Ok(()));
    respond(&req.id, result)
}

fn handle_search(state: &mut AppState, req: &Request) -> Value {
    let result = get_required_str(&req.params, "query").and_then(|query| {
        with_session(state, &req.params, |s, _| {
            s.view.set_query(&query)?;
            Ok(())
        })
    });
    respond(&req.id, result)
}

fn handle_sort(state: &mut AppState, req: &Request) -> Value {
    let direction = match req.params.get("direction").and_then(|v| v.as_str()) {
        None => None,
        Some(d) => match SortDirection::parse(d) {
            Some(dir) => Some(dir),
            None => {
                return HandlerErr::new("bad_params", "direction must be asc or desc")
                    .response(&req.id)
            }
        },
    };
    if let Some(Value::Null) = req.params.get("key") {
        let result = with_session(state, &req.params, |s, _| {
            s.view.clear_sort();
            Ok(())
        });
        return respond(&req.id, result);
    }
    let result = get_required_str(&req.params, "key").and_then(|key| {
        with_session(state, &req.params, |s, _| {
            match direction {
                Some(dir) => s.view.set_sort(&key, dir)?,
                None => {
                    s.view.click_header(&key)?;
                }
            }
            Ok(())
        })
    });
    respond(&req.id, result)
}

fn handle_page(state: &mut AppState, req: &Request) -> Value {
    let result = parse_page_target(&req.params).and_then(|target| {
        with_session(state, &req.params, |s, _| {
            match target {
                PageTarget::Number(p) => s.view.go_to_page(p)?,
                PageTarget::Next => s.view.next_page()?,
                PageTarget::Prev => s.view.prev_page()?,
            };
            Ok(())
        })
    });
    respond(&req.id, result)
}

fn handle_set_rows(state: &mut AppState, req: &Request) -> Value {
    let result = parse_rows(&req.params).and_then(|rows| {
        with_session(state, &req.params, |s, _| {
            if let TableSource::Entity { .. } = s.source {
                return Err(HandlerErr::new(
                    "bad_params",
                    "table is backed by a record list; use tables.refresh",
                ));
            }
            s.view.set_rows(rows);
            Ok(())
        })
    });
    respond(&req.id, result)
}

fn handle_refresh(state: &mut AppState, req: &Request) -> Value {
    let result = with_session(state, &req.params, |s, db| {
        let TableSource::Entity { entity, filters } = &s.source else {
            return Err(HandlerErr::new(
                "bad_params",
                "table rows are supplied by the caller; use tables.setRows",
            ));
        };
        let conn = require_db(db)?;
        let rows = load_entity_rows(conn, *entity, filters)?;
        s.view.set_rows(rows);
        Ok(())
    });
    respond(&req.id, result)
}

fn click_row(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let table_id = get_required_str(params, "tableId")?;
    let position = params
        .get("position")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::new("bad_params", "missing position"))?;
    let now = state.tick();
    let Some(session) = state.tables.get_mut(&table_id) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("table {} is not open", table_id),
        ));
    };
    session.last_used = now;
    let row = session.view.click_row(position as usize)?;
    Ok(json!({ "tableId": table_id, "row": row }))
}

fn handle_row_click(state: &mut AppState, req: &Request) -> Value {
    let result = click_row(state, &req.params);
    respond(&req.id, result)
}

fn handle_close(state: &mut AppState, req: &Request) -> Value {
    let result = get_required_str(&req.params, "tableId").map(|table_id| {
        let closed = state.tables.remove(&table_id).is_some();
        if closed {
            log::info!("table {} closed", table_id);
        }
        json!({ "tableId": table_id, "closed": closed })
    });
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "tables.open" => Some(handle_open(state, req)),
        "tables.render" => Some(handle_render(state, req)),
        "tables.search" => Some(handle_search(state, req)),
        "tables.sort" => Some(handle_sort(state, req)),
        "tables.page" => Some(handle_page(state, req)),
        "tables.setRows" => Some(handle_set_rows(state, req)),
        "tables.refresh" => Some(handle_refresh(state, req)),
        "tables.rowClick" => Some(handle_row_click(state, req)),
        "tables.close" => Some(handle_close(state, req)),
        _ => None,
    }
}
