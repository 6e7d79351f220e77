use crate::ipc::helpers::{get_entity, get_object, get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, Entity};
use serde_json::json;

fn handle_entities(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let entities: Vec<serde_json::Value> = Entity::ALL
        .iter()
        .map(|e| json!({ "name": e.name(), "fields": e.fields() }))
        .collect();
    respond(&req.id, Ok(json!({ "entities": entities })))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let entity = get_entity(&req.params)?;
        let filters = get_object(&req.params, "filters")?;
        let rows = records::list(conn, entity, &filters)
            .map_err(|e| HandlerErr::from_record(e, "db_query_failed"))?;
        Ok(json!({ "entity": entity.name(), "rows": rows }))
    });
    respond(&req.id, result)
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let entity = get_entity(&req.params)?;
        let id = get_required_str(&req.params, "id")?;
        match records::get(conn, entity, &id)
            .map_err(|e| HandlerErr::from_record(e, "db_query_failed"))?
        {
            Some(row) => Ok(json!({ "row": row })),
            None => Err(HandlerErr::new(
                "not_found",
                format!("{} {} not found", entity.name(), id),
            )),
        }
    });
    respond(&req.id, result)
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let entity = get_entity(&req.params)?;
        let record = get_object(&req.params, "record")?;
        let id = records::create(conn, entity, &record)
            .map_err(|e| HandlerErr::from_record(e, "db_insert_failed"))?;
        Ok(json!({ "id": id }))
    });
    respond(&req.id, result)
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let entity = get_entity(&req.params)?;
        let id = get_required_str(&req.params, "id")?;
        let patch = get_object(&req.params, "patch")?;
        match records::update(conn, entity, &id, &patch)
            .map_err(|e| HandlerErr::from_record(e, "db_update_failed"))?
        {
            Some(row) => Ok(json!({ "row": row })),
            None => Err(HandlerErr::new(
                "not_found",
                format!("{} {} not found", entity.name(), id),
            )),
        }
    });
    respond(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let entity = get_entity(&req.params)?;
        let id = get_required_str(&req.params, "id")?;
        let deleted = records::delete(conn, entity, &id)
            .map_err(|e| HandlerErr::from_record(e, "db_delete_failed"))?;
        if !deleted {
            return Err(HandlerErr::new(
                "not_found",
                format!("{} {} not found", entity.name(), id),
            ));
        }
        Ok(json!({ "deleted": true }))
    });
    respond(&req.id, result)
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state.db.as_ref()).and_then(|conn| {
        let date = match req.params.get("date").and_then(|v| v.as_str()) {
            Some(d) => d.to_string(),
            None => chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
        };
        let summary = records::dashboard_summary(conn, &date)
            .map_err(|e| HandlerErr::from_record(e, "db_query_failed"))?;
        Ok(json!(summary))
    });
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.entities" => Some(handle_entities(state, req)),
        "records.list" => Some(handle_list(state, req)),
        "records.get" => Some(handle_get(state, req)),
        "records.create" => Some(handle_create(state, req)),
        "records.update" => Some(handle_update(state, req)),
        "records.delete" => Some(handle_delete(state, req)),
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        _ => None,
    }
}
