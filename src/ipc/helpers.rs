use crate::ipc::error::err;
use crate::records::{Entity, RecordError};
use crate::table::{Row, TableError};
use rusqlite::Connection;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    /// Maps a store failure; `db_code` names the operation that failed.
    pub fn from_record(e: RecordError, db_code: &'static str) -> Self {
        match e {
            RecordError::Invalid(message) => HandlerErr::new("bad_params", message),
            RecordError::Db(e) => HandlerErr::new(db_code, e.to_string()),
        }
    }
}

impl From<TableError> for HandlerErr {
    fn from(e: TableError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Optional JSON object parameter; absent or null reads as empty.
pub fn get_object(params: &serde_json::Value, key: &str) -> Result<Row, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(Row::new()),
        Some(serde_json::Value::Object(m)) => Ok(m.clone()),
        Some(_) => Err(HandlerErr::new(
            "bad_params",
            format!("{} must be an object", key),
        )),
    }
}

pub fn get_entity(params: &serde_json::Value) -> Result<Entity, HandlerErr> {
    let name = get_required_str(params, "entity")?;
    Entity::parse(&name)
        .ok_or_else(|| HandlerErr::new("bad_params", format!("unknown entity: {}", name)))
}

pub fn require_db(db: Option<&Connection>) -> Result<&Connection, HandlerErr> {
    db.ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => crate::ipc::error::ok(id, v),
        Err(e) => e.response(id),
    }
}
