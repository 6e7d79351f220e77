use crate::table::{ColumnDef, Row};
use chrono::{Duration, NaiveDate};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: &'static str,
    #[serde(skip)]
    pub column: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// False for optional fields the store fills with a default; those may
    /// be omitted but never set to null.
    pub nullable: bool,
}

const fn field(name: &'static str, column: &'static str, kind: FieldKind, required: bool) -> Field {
    Field {
        name,
        column,
        kind,
        required,
        nullable: !required,
    }
}

const fn defaulted(name: &'static str, column: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        column,
        kind,
        required: false,
        nullable: false,
    }
}

use FieldKind::{Integer, Real, Text};

const CLASS_FIELDS: &[Field] = &[
    field("name", "name", Text, true),
    field("grade", "grade", Integer, false),
    field("section", "section", Text, false),
    field("room", "room", Text, false),
    field("teacherId", "teacher_id", Text, false),
];

const STUDENT_FIELDS: &[Field] = &[
    field("name", "name", Text, true),
    field("admissionNo", "admission_no", Text, false),
    field("classId", "class_id", Text, false),
    field("gender", "gender", Text, false),
    field("dateOfBirth", "date_of_birth", Text, false),
    field("guardianName", "guardian_name", Text, false),
    field("phone", "phone", Text, false),
    defaulted("status", "status", Text),
];

const TEACHER_FIELDS: &[Field] = &[
    field("name", "name", Text, true),
    field("employeeNo", "employee_no", Text, false),
    field("subject", "subject", Text, false),
    field("email", "email", Text, false),
    field("phone", "phone", Text, false),
    field("joinedOn", "joined_on", Text, false),
    defaulted("status", "status", Text),
];

const ATTENDANCE_FIELDS: &[Field] = &[
    field("studentId", "student_id", Text, true),
    field("classId", "class_id", Text, false),
    field("date", "date", Text, true),
    field("status", "status", Text, true),
    field("remark", "remark", Text, false),
];

const FEE_FIELDS: &[Field] = &[
    field("studentId", "student_id", Text, true),
    field("feeType", "fee_type", Text, true),
    field("amount", "amount", Real, true),
    field("dueDate", "due_date", Text, false),
    field("paidOn", "paid_on", Text, false),
    defaulted("status", "status", Text),
];

const EXAM_FIELDS: &[Field] = &[
    field("name", "name", Text, true),
    field("classId", "class_id", Text, false),
    field("subject", "subject", Text, false),
    field("date", "date", Text, false),
    field("maxMarks", "max_marks", Real, false),
];

const NOTICE_FIELDS: &[Field] = &[
    field("title", "title", Text, true),
    field("body", "body", Text, false),
    field("audience", "audience", Text, false),
    field("postedOn", "posted_on", Text, false),
    field("postedBy", "posted_by", Text, false),
];

pub const ATTENDANCE_STATUSES: &[&str] = &["present", "absent", "late", "excused"];
pub const FEE_STATUSES: &[&str] = &["paid", "pending", "overdue"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Classes,
    Students,
    Teachers,
    Attendance,
    Fees,
    Exams,
    Notices,
}

impl Entity {
    pub const ALL: [Entity; 7] = [
        Entity::Classes,
        Entity::Students,
        Entity::Teachers,
        Entity::Attendance,
        Entity::Fees,
        Entity::Exams,
        Entity::Notices,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Wire name, which is also the SQL table name.
    pub fn name(self) -> &'static str {
        match self {
            Entity::Classes => "classes",
            Entity::Students => "students",
            Entity::Teachers => "teachers",
            Entity::Attendance => "attendance",
            Entity::Fees => "fees",
            Entity::Exams => "exams",
            Entity::Notices => "notices",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            Entity::Classes => CLASS_FIELDS,
            Entity::Students => STUDENT_FIELDS,
            Entity::Teachers => TEACHER_FIELDS,
            Entity::Attendance => ATTENDANCE_FIELDS,
            Entity::Fees => FEE_FIELDS,
            Entity::Exams => EXAM_FIELDS,
            Entity::Notices => NOTICE_FIELDS,
        }
    }

    /// Read-only display fields resolved from linked records.
    fn lookups(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Entity::Classes => &[(
                "teacherName",
                "(SELECT x.name FROM teachers x WHERE x.id = t.teacher_id)",
            )],
            Entity::Students | Entity::Exams => &[(
                "className",
                "(SELECT x.name FROM classes x WHERE x.id = t.class_id)",
            )],
            Entity::Attendance => &[
                (
                    "studentName",
                    "(SELECT x.name FROM students x WHERE x.id = t.student_id)",
                ),
                (
                    "className",
                    "(SELECT x.name FROM classes x WHERE x.id = t.class_id)",
                ),
            ],
            Entity::Fees => &[(
                "studentName",
                "(SELECT x.name FROM students x WHERE x.id = t.student_id)",
            )],
            Entity::Teachers | Entity::Notices => &[],
        }
    }

    /// Columns of this entity's list screen.
    pub fn default_columns(self) -> Vec<ColumnDef> {
        match self {
            Entity::Classes => vec![
                ColumnDef::new("name", "Class"),
                ColumnDef::new("grade", "Grade"),
                ColumnDef::new("section", "Section"),
                ColumnDef::new("room", "Room"),
                ColumnDef::new("teacherName", "Class Teacher"),
            ],
            Entity::Students => vec![
                ColumnDef::new("admissionNo", "Adm. No"),
                ColumnDef::new("name", "Name"),
                ColumnDef::new("className", "Class"),
                ColumnDef::new("gender", "Gender"),
                ColumnDef::new("guardianName", "Guardian"),
                ColumnDef::new("phone", "Phone").unsortable(),
                ColumnDef::new("status", "Status").with_format("uppercase"),
            ],
            Entity::Teachers => vec![
                ColumnDef::new("employeeNo", "Emp. No"),
                ColumnDef::new("name", "Name"),
                ColumnDef::new("subject", "Subject"),
                ColumnDef::new("email", "Email"),
                ColumnDef::new("phone", "Phone").unsortable(),
                ColumnDef::new("joinedOn", "Joined").with_format("date"),
                ColumnDef::new("status", "Status").with_format("uppercase"),
            ],
            Entity::Attendance => vec![
                ColumnDef::new("date", "Date").with_format("date"),
                ColumnDef::new("studentName", "Student"),
                ColumnDef::new("className", "Class"),
                ColumnDef::new("status", "Status").with_format("uppercase"),
                ColumnDef::new("remark", "Remark").unsortable(),
            ],
            Entity::Fees => vec![
                ColumnDef::new("studentName", "Student"),
                ColumnDef::new("feeType", "Fee"),
                ColumnDef::new("amount", "Amount").with_format("currency"),
                ColumnDef::new("dueDate", "Due").with_format("date"),
                ColumnDef::new("paidOn", "Paid On").with_format("date"),
                ColumnDef::new("status", "Status").with_format("uppercase"),
            ],
            Entity::Exams => vec![
                ColumnDef::new("name", "Exam"),
                ColumnDef::new("className", "Class"),
                ColumnDef::new("subject", "Subject"),
                ColumnDef::new("date", "Date").with_format("date"),
                ColumnDef::new("maxMarks", "Max Marks"),
            ],
            Entity::Notices => vec![
                ColumnDef::new("postedOn", "Posted").with_format("date"),
                ColumnDef::new("title", "Title"),
                ColumnDef::new("audience", "Audience"),
                ColumnDef::new("postedBy", "Posted By"),
            ],
        }
    }

    fn field(self, name: &str) -> Result<&'static Field, RecordError> {
        self.fields()
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| RecordError::Invalid(format!("{}: unknown field {}", self.name(), name)))
    }

    fn select_sql(self) -> String {
        let mut cols = vec!["t.id".to_string()];
        cols.extend(self.fields().iter().map(|f| format!("t.{}", f.column)));
        cols.extend(self.lookups().iter().map(|(_, sql)| sql.to_string()));
        format!("SELECT {} FROM {} t", cols.join(", "), self.name())
    }

    fn read_row(self, r: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        let mut out = Row::new();
        out.insert("id".to_string(), json!(r.get::<_, String>(0)?));
        let names = self
            .fields()
            .iter()
            .map(|f| f.name)
            .chain(self.lookups().iter().map(|(name, _)| *name));
        for (i, name) in names.enumerate() {
            out.insert(name.to_string(), from_sql(r.get_ref(i + 1)?));
        }
        Ok(out)
    }
}

fn from_sql(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => json!(String::from_utf8_lossy(t)),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn to_sql(entity: Entity, f: &Field, v: &Value) -> Result<SqlValue, RecordError> {
    let bad = |want: &str| {
        RecordError::Invalid(format!(
            "{}.{} must be {}",
            entity.name(),
            f.name,
            want
        ))
    };
    if v.is_null() {
        if f.required {
            return Err(bad("present"));
        }
        if !f.nullable {
            return Err(bad("a value, not null"));
        }
        return Ok(SqlValue::Null);
    }
    match f.kind {
        FieldKind::Text => v
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(|| bad("a string")),
        FieldKind::Integer => v.as_i64().map(SqlValue::Integer).ok_or_else(|| bad("an integer")),
        FieldKind::Real => v.as_f64().map(SqlValue::Real).ok_or_else(|| bad("a number")),
    }
}

fn check_status(entity: Entity, record: &Row) -> Result<(), RecordError> {
    let allowed = match entity {
        Entity::Attendance => ATTENDANCE_STATUSES,
        Entity::Fees => FEE_STATUSES,
        _ => return Ok(()),
    };
    match record.get("status").and_then(|v| v.as_str()) {
        Some(s) if !allowed.contains(&s) => Err(RecordError::Invalid(format!(
            "{}.status must be one of {}",
            entity.name(),
            allowed.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// Rows in insertion order. `filters` maps field names to exact values;
/// a null filter matches missing values.
pub fn list(conn: &Connection, entity: Entity, filters: &Row) -> Result<Vec<Row>, RecordError> {
    let mut sql = entity.select_sql();
    let mut params: Vec<SqlValue> = Vec::new();
    let mut clauses: Vec<String> = Vec::new();
    for (name, value) in filters {
        let column = if name == "id" {
            "id"
        } else {
            entity.field(name)?.column
        };
        if value.is_null() {
            clauses.push(format!("t.{column} IS NULL"));
            continue;
        }
        let v = match value {
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or_default()),
            },
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            _ => {
                return Err(RecordError::Invalid(format!(
                    "filter {name} must be a string, number or null"
                )))
            }
        };
        clauses.push(format!("t.{column} = ?"));
        params.push(v);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.rowid");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), |r| entity.read_row(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, entity: Entity, id: &str) -> Result<Option<Row>, RecordError> {
    let sql = format!("{} WHERE t.id = ?", entity.select_sql());
    let row = conn
        .query_row(&sql, [id], |r| entity.read_row(r))
        .optional()?;
    Ok(row)
}

pub fn create(conn: &Connection, entity: Entity, record: &Row) -> Result<String, RecordError> {
    for name in record.keys() {
        entity.field(name)?;
    }
    check_status(entity, record)?;

    let mut columns = vec!["id"];
    let id = Uuid::new_v4().to_string();
    let mut values = vec![SqlValue::Text(id.clone())];
    for f in entity.fields() {
        match record.get(f.name) {
            Some(v) => {
                columns.push(f.column);
                values.push(to_sql(entity, f, v)?);
            }
            None if f.required => {
                return Err(RecordError::Invalid(format!(
                    "{}.{} is required",
                    entity.name(),
                    f.name
                )))
            }
            None => {}
        }
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {}({}) VALUES({})",
        entity.name(),
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values))?;
    log::debug!("created {} {}", entity.name(), id);
    Ok(id)
}

/// Applies `patch` and returns the updated row, or `None` when `id` is unknown.
pub fn update(
    conn: &Connection,
    entity: Entity,
    id: &str,
    patch: &Row,
) -> Result<Option<Row>, RecordError> {
    check_status(entity, patch)?;
    let mut sets: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    for (name, v) in patch {
        let f = entity.field(name)?;
        sets.push(format!("{} = ?", f.column));
        values.push(to_sql(entity, f, v)?);
    }
    if sets.is_empty() {
        return get(conn, entity, id);
    }
    values.push(SqlValue::Text(id.to_string()));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        entity.name(),
        sets.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Ok(None);
    }
    get(conn, entity, id)
}

/// Deleting a student or class also removes the records hanging off it.
pub fn delete(conn: &Connection, entity: Entity, id: &str) -> Result<bool, RecordError> {
    let tx = conn.unchecked_transaction()?;
    match entity {
        Entity::Students => {
            tx.execute("DELETE FROM attendance WHERE student_id = ?", [id])?;
            tx.execute("DELETE FROM fees WHERE student_id = ?", [id])?;
        }
        Entity::Classes => {
            tx.execute("UPDATE students SET class_id = NULL WHERE class_id = ?", [id])?;
            tx.execute("UPDATE attendance SET class_id = NULL WHERE class_id = ?", [id])?;
            tx.execute("UPDATE exams SET class_id = NULL WHERE class_id = ?", [id])?;
        }
        Entity::Teachers => {
            tx.execute("UPDATE classes SET teacher_id = NULL WHERE teacher_id = ?", [id])?;
        }
        _ => {}
    }
    let n = tx.execute(&format!("DELETE FROM {} WHERE id = ?", entity.name()), [id])?;
    tx.commit()?;
    Ok(n > 0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTotals {
    pub collected: f64,
    pub outstanding: f64,
    pub overdue_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub date: String,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub marked: i64,
    /// Present or late as a percentage of marked, `None` before any marking.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub students: i64,
    pub teachers: i64,
    pub classes: i64,
    pub exams: i64,
    pub notices: i64,
    pub fees: FeeTotals,
    pub attendance: AttendanceSummary,
}

fn count(conn: &Connection, sql: &str) -> rusqlite::Result<i64> {
    conn.query_row(sql, [], |r| r.get(0))
}

pub fn dashboard_summary(conn: &Connection, date: &str) -> Result<DashboardSummary, RecordError> {
    let fees = conn.query_row(
        "SELECT
           COALESCE(SUM(CASE WHEN status = 'paid' THEN amount END), 0),
           COALESCE(SUM(CASE WHEN status <> 'paid' THEN amount END), 0),
           COUNT(CASE WHEN status = 'overdue' THEN 1 END)
         FROM fees",
        [],
        |r| {
            Ok(FeeTotals {
                collected: r.get(0)?,
                outstanding: r.get(1)?,
                overdue_count: r.get(2)?,
            })
        },
    )?;

    let mut att = AttendanceSummary {
        date: date.to_string(),
        present: 0,
        absent: 0,
        late: 0,
        excused: 0,
        marked: 0,
        rate: None,
    };
    let mut stmt =
        conn.prepare("SELECT status, COUNT(*) FROM attendance WHERE date = ? GROUP BY status")?;
    let counts = stmt
        .query_map([date], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (status, n) in counts {
        match status.as_str() {
            "present" => att.present += n,
            "absent" => att.absent += n,
            "late" => att.late += n,
            "excused" => att.excused += n,
            other => log::warn!("attendance on {date} has unknown status {other}"),
        }
        att.marked += n;
    }
    if att.marked > 0 {
        att.rate = Some(100.0 * (att.present + att.late) as f64 / att.marked as f64);
    }

    Ok(DashboardSummary {
        students: count(conn, "SELECT COUNT(*) FROM students WHERE status = 'active'")?,
        teachers: count(conn, "SELECT COUNT(*) FROM teachers WHERE status = 'active'")?,
        classes: count(conn, "SELECT COUNT(*) FROM classes")?,
        exams: count(conn, "SELECT COUNT(*) FROM exams")?,
        notices: count(conn, "SELECT COUNT(*) FROM notices")?,
        fees,
        attendance: att,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCounts {
    pub teachers: usize,
    pub classes: usize,
    pub students: usize,
    pub attendance: usize,
    pub fees: usize,
    pub exams: usize,
    pub notices: usize,
}

fn rec(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        _ => Row::new(),
    }
}

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Bianca", "Chen", "Divya", "Elias", "Fatima", "Gabriel", "Hana",
];
const LAST_NAMES: &[&str] = &["Okafor", "Silva", "Nakamura"];

/// Fills an empty store with a small demo school dated around `today`.
pub fn seed_demo(conn: &Connection, today: NaiveDate) -> Result<SeedCounts, RecordError> {
    let existing = count(conn, "SELECT COUNT(*) FROM students")?
        + count(conn, "SELECT COUNT(*) FROM teachers")?
        + count(conn, "SELECT COUNT(*) FROM classes")?;
    if existing > 0 {
        return Err(RecordError::Invalid(
            "store already has records; demo data only seeds an empty store".to_string(),
        ));
    }
    let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
    let mut counts = SeedCounts::default();
    let tx = conn.unchecked_transaction()?;

    let teachers = [
        ("Meera Iyer", "Mathematics"),
        ("Tom Alvarez", "Science"),
        ("Grace Mensah", "English"),
    ];
    let mut teacher_ids = Vec::new();
    for (i, (name, subject)) in teachers.iter().enumerate() {
        let id = create(
            &tx,
            Entity::Teachers,
            &rec(json!({
                "name": name,
                "employeeNo": format!("T-{:03}", i + 1),
                "subject": subject,
                "email": format!("{}@school.test", name.split(' ').next().unwrap_or("staff").to_lowercase()),
                "phone": format!("555-01{:02}", i),
                "joinedOn": day(-365 * (i as i64 + 1)),
                "status": "active"
            })),
        )?;
        teacher_ids.push(id);
        counts.teachers += 1;
    }

    let mut class_ids = Vec::new();
    for (i, teacher_id) in teacher_ids.iter().enumerate() {
        let grade = 6 + i as i64;
        let id = create(
            &tx,
            Entity::Classes,
            &rec(json!({
                "name": format!("Grade {grade}-A"),
                "grade": grade,
                "section": "A",
                "room": format!("R{}", 101 + i),
                "teacherId": teacher_id
            })),
        )?;
        class_ids.push(id);
        counts.classes += 1;
    }

    let mut n = 0usize;
    for last in LAST_NAMES {
        for first in FIRST_NAMES {
            let class_id = &class_ids[n % class_ids.len()];
            let gender = if n % 2 == 0 { "F" } else { "M" };
            let student_status = if n % 11 == 10 { "inactive" } else { "active" };
            let student_id = create(
                &tx,
                Entity::Students,
                &rec(json!({
                    "name": format!("{first} {last}"),
                    "admissionNo": format!("A{:04}", 1001 + n),
                    "classId": class_id,
                    "gender": gender,
                    "dateOfBirth": day(-365 * 12 - (n as i64 * 17)),
                    "guardianName": format!("Parent {last}"),
                    "phone": format!("555-2{:03}", n),
                    "status": student_status
                })),
            )?;
            counts.students += 1;

            let status = match n % 8 {
                3 => "absent",
                5 => "late",
                _ => "present",
            };
            create(
                &tx,
                Entity::Attendance,
                &rec(json!({
                    "studentId": student_id,
                    "classId": class_id,
                    "date": day(0),
                    "status": status
                })),
            )?;
            counts.attendance += 1;

            let (fee_status, paid_on, due_in) = match n % 3 {
                0 => ("paid", Value::String(day(-10)), 20),
                1 => ("pending", Value::Null, 20),
                _ => ("overdue", Value::Null, -5),
            };
            create(
                &tx,
                Entity::Fees,
                &rec(json!({
                    "studentId": student_id,
                    "feeType": "Tuition",
                    "amount": 1200.0 + (n % 4) as f64 * 150.0,
                    "dueDate": day(due_in),
                    "paidOn": paid_on,
                    "status": fee_status
                })),
            )?;
            counts.fees += 1;
            n += 1;
        }
    }

    for (i, class_id) in class_ids.iter().enumerate() {
        create(
            &tx,
            Entity::Exams,
            &rec(json!({
                "name": "Mid-term",
                "classId": class_id,
                "subject": teachers[i].1,
                "date": day(14 + i as i64),
                "maxMarks": 100.0
            })),
        )?;
        counts.exams += 1;
    }

    for (title, audience, offset) in [
        ("Parent-teacher meeting", "parents", -2),
        ("Sports day schedule", "all", -1),
        ("Staff briefing moved to Friday", "staff", 0),
    ] {
        create(
            &tx,
            Entity::Notices,
            &rec(json!({
                "title": title,
                "body": format!("{title}. See the office for details."),
                "audience": audience,
                "postedOn": day(offset),
                "postedBy": "Principal"
            })),
        )?;
        counts.notices += 1;
    }

    tx.commit()?;
    log::info!(
        "seeded demo school: {} students, {} classes, {} teachers",
        counts.students,
        counts.classes,
        counts.teachers
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 16).expect("date")
    }

    #[test]
    fn create_get_update_delete() {
        let conn = open_in_memory().expect("db");
        let id = create(
            &conn,
            Entity::Teachers,
            &rec(json!({ "name": "Ada", "subject": "Math", "status": "active" })),
        )
        .expect("create");
        let row = get(&conn, Entity::Teachers, &id).expect("get").expect("row");
        assert_eq!(row["name"], json!("Ada"));
        assert_eq!(row["email"], Value::Null);

        let row = update(&conn, Entity::Teachers, &id, &rec(json!({ "subject": "Physics" })))
            .expect("update")
            .expect("row");
        assert_eq!(row["subject"], json!("Physics"));
        assert_eq!(row["name"], json!("Ada"));

        assert!(delete(&conn, Entity::Teachers, &id).expect("delete"));
        assert!(!delete(&conn, Entity::Teachers, &id).expect("delete again"));
        assert!(get(&conn, Entity::Teachers, &id).expect("get").is_none());
        assert!(update(&conn, Entity::Teachers, &id, &rec(json!({ "name": "X" })))
            .expect("update")
            .is_none());
    }

    #[test]
    fn validation_rejects_bad_payloads() {
        let conn = open_in_memory().expect("db");
        let e = create(&conn, Entity::Teachers, &rec(json!({ "subject": "Art" }))).unwrap_err();
        assert!(e.to_string().contains("teachers.name is required"));

        let e = create(&conn, Entity::Teachers, &rec(json!({ "name": "A", "salary": 1 })))
            .unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)));

        let e = create(&conn, Entity::Classes, &rec(json!({ "name": "7B", "grade": "seven" })))
            .unwrap_err();
        assert!(e.to_string().contains("classes.grade must be an integer"));

        let e = create(
            &conn,
            Entity::Fees,
            &rec(json!({ "studentId": "s", "feeType": "Bus", "amount": 10, "status": "waived" })),
        )
        .unwrap_err();
        assert!(e.to_string().contains("fees.status must be one of"));
    }

    #[test]
    fn null_status_is_invalid_not_a_store_failure() {
        let conn = open_in_memory().expect("db");
        let e = create(&conn, Entity::Teachers, &rec(json!({ "name": "A", "status": null })))
            .unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)), "{e:?}");
        assert!(e.to_string().contains("teachers.status must be a value"));

        // Omitting it falls back to the column default.
        let id = create(&conn, Entity::Teachers, &rec(json!({ "name": "A" }))).expect("create");
        let row = get(&conn, Entity::Teachers, &id).expect("get").expect("row");
        assert_eq!(row["status"], json!("active"));

        let e = update(&conn, Entity::Teachers, &id, &rec(json!({ "status": null }))).unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)), "{e:?}");

        let student = create(&conn, Entity::Students, &rec(json!({ "name": "S" }))).expect("student");
        let e = update(&conn, Entity::Students, &student, &rec(json!({ "status": null })))
            .unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)), "{e:?}");
        let e = create(
            &conn,
            Entity::Fees,
            &rec(json!({ "studentId": student, "feeType": "Bus", "amount": 5, "status": null })),
        )
        .unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)), "{e:?}");

        // Plain optional fields still accept null.
        let row = update(&conn, Entity::Teachers, &id, &rec(json!({ "email": null })))
            .expect("update")
            .expect("row");
        assert!(row["email"].is_null());
    }

    #[test]
    fn list_filters_and_keeps_insertion_order() {
        let conn = open_in_memory().expect("db");
        seed_demo(&conn, today()).expect("seed");
        let classes = list(&conn, Entity::Classes, &Row::new()).expect("classes");
        assert_eq!(classes.len(), 3);
        assert_eq!(classes[0]["name"], json!("Grade 6-A"));
        assert_eq!(classes[0]["teacherName"], json!("Meera Iyer"));

        let class_id = classes[1]["id"].clone();
        let students = list(&conn, Entity::Students, &rec(json!({ "classId": class_id })))
            .expect("students");
        assert_eq!(students.len(), 8);
        assert!(students.iter().all(|s| s["className"] == json!("Grade 7-A")));
        assert_eq!(students[0]["name"], json!("Bianca Okafor"));

        let unpaid = list(&conn, Entity::Fees, &rec(json!({ "paidOn": null }))).expect("fees");
        assert_eq!(unpaid.len(), 16);

        let e = list(&conn, Entity::Fees, &rec(json!({ "colour": "red" }))).unwrap_err();
        assert!(matches!(e, RecordError::Invalid(_)));
    }

    #[test]
    fn summary_aggregates_fees_and_attendance() {
        let conn = open_in_memory().expect("db");
        let counts = seed_demo(&conn, today()).expect("seed");
        assert_eq!(counts.students, 24);

        let s = dashboard_summary(&conn, "2024-09-16").expect("summary");
        assert_eq!(s.students, 22);
        assert_eq!(s.teachers, 3);
        assert_eq!(s.classes, 3);
        assert_eq!(s.attendance.marked, 24);
        assert_eq!(s.attendance.absent, 3);
        assert_eq!(s.attendance.late, 3);
        assert_eq!(s.attendance.present, 18);
        assert_eq!(s.attendance.rate, Some(87.5));
        assert_eq!(s.fees.overdue_count, 8);
        assert!(s.fees.collected > 0.0);

        let quiet = dashboard_summary(&conn, "2024-09-17").expect("summary");
        assert_eq!(quiet.attendance.marked, 0);
        assert_eq!(quiet.attendance.rate, None);
    }

    #[test]
    fn seeding_twice_is_refused() {
        let conn = open_in_memory().expect("db");
        seed_demo(&conn, today()).expect("seed");
        assert!(matches!(seed_demo(&conn, today()), Err(RecordError::Invalid(_))));
    }

    #[test]
    fn deleting_a_student_removes_their_records() {
        let conn = open_in_memory().expect("db");
        seed_demo(&conn, today()).expect("seed");
        let students = list(&conn, Entity::Students, &Row::new()).expect("students");
        let id = students[0]["id"].as_str().expect("id").to_string();
        assert!(delete(&conn, Entity::Students, &id).expect("delete"));
        let fees = list(&conn, Entity::Fees, &rec(json!({ "studentId": id }))).expect("fees");
        assert!(fees.is_empty());
    }
}
