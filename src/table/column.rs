use super::error::TableError;
use super::value::{cell_value, display_text, is_truthy, Row};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Per-cell display transform. Always called as `render(value, row)`;
/// renderers that only need the value ignore the row.
pub type RenderFn = Arc<dyn Fn(&Value, &Row) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub render: Option<RenderFn>,
    pub sortable: bool,
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("render", &self.render.as_ref().map(|_| "<fn>"))
            .field("sortable", &self.sortable)
            .finish()
    }
}

impl ColumnDescriptor {
    #[allow(dead_code)]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            render: None,
            sortable: true,
        }
    }

    #[allow(dead_code)]
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &Row) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    #[allow(dead_code)]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Raw value this column reads from `row`; missing keys read as null.
    pub fn value<'a>(&self, row: &'a Row) -> &'a Value {
        cell_value(row, &self.key)
    }

    pub fn cell_text(&self, row: &Row) -> String {
        let value = self.value(row);
        match &self.render {
            Some(render) => render(value, row),
            None => display_text(value),
        }
    }
}

/// Column definition as it arrives from a caller.
///
/// Two naming conventions are in circulation: `{key, label}` is canonical,
/// `{accessor, header}` is the older one. [`resolve_columns`] is the only
/// place that knows about both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: Option<String>,
    pub accessor: Option<String>,
    pub label: Option<String>,
    pub header: Option<String>,
    pub sortable: Option<bool>,
    pub format: Option<String>,
}

impl ColumnDef {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = Some(false);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    Uppercase,
    Currency,
    Date,
    YesNo,
    Percent,
}

impl CellFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(CellFormat::Text),
            "uppercase" => Some(CellFormat::Uppercase),
            "currency" => Some(CellFormat::Currency),
            "date" => Some(CellFormat::Date),
            "yesNo" => Some(CellFormat::YesNo),
            "percent" => Some(CellFormat::Percent),
            _ => None,
        }
    }

    fn render_fn(self, currency_symbol: &str) -> Option<RenderFn> {
        match self {
            CellFormat::Text => None,
            CellFormat::Uppercase => Some(Arc::new(|v: &Value, _: &Row| {
                display_text(v).to_uppercase()
            })),
            CellFormat::Currency => {
                let symbol = currency_symbol.to_string();
                Some(Arc::new(move |v: &Value, _: &Row| {
                    format_currency(v, &symbol)
                }))
            }
            CellFormat::Date => Some(Arc::new(|v: &Value, _: &Row| format_date(v))),
            CellFormat::YesNo => Some(Arc::new(|v: &Value, _: &Row| {
                if is_truthy(v) { "Yes" } else { "No" }.to_string()
            })),
            CellFormat::Percent => Some(Arc::new(|v: &Value, _: &Row| match v {
                Value::Null => String::new(),
                other => format!("{}%", display_text(other)),
            })),
        }
    }
}

fn numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_currency(v: &Value, symbol: &str) -> String {
    let Some(amount) = numeric(v) else {
        return display_text(v);
    };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}.{cents}", group_thousands(whole))
}

fn format_date(v: &Value) -> String {
    let text = display_text(v);
    let head = text.get(..10).unwrap_or(&text);
    match NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        Ok(d) => d.format("%d %b %Y").to_string(),
        Err(_) => text,
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn resolve_column(
    index: usize,
    def: &ColumnDef,
    currency_symbol: &str,
) -> Result<ColumnDescriptor, TableError> {
    let Some(key) = non_blank(&def.key).or_else(|| non_blank(&def.accessor)) else {
        return Err(TableError::BadColumn {
            index,
            reason: "missing key (or accessor)".to_string(),
        });
    };
    let Some(label) = non_blank(&def.label).or_else(|| non_blank(&def.header)) else {
        return Err(TableError::BadColumn {
            index,
            reason: format!("{} is missing label (or header)", key),
        });
    };

    let render = match def.format.as_deref() {
        None => None,
        Some(name) => CellFormat::from_name(name)
            .ok_or_else(|| TableError::UnknownFormat {
                key: key.to_string(),
                format: name.to_string(),
            })?
            .render_fn(currency_symbol),
    };

    Ok(ColumnDescriptor {
        key: key.to_string(),
        label: label.to_string(),
        render,
        sortable: def.sortable.unwrap_or(true),
    })
}

pub fn resolve_columns(
    defs: &[ColumnDef],
    currency_symbol: &str,
) -> Result<Vec<ColumnDescriptor>, TableError> {
    let columns = defs
        .iter()
        .enumerate()
        .map(|(i, d)| resolve_column(i, d, currency_symbol))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_keys(&columns)?;
    Ok(columns)
}

pub fn check_unique_keys(columns: &[ColumnDescriptor]) -> Result<(), TableError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for c in columns {
        if !seen.insert(c.key.as_str()) {
            return Err(TableError::DuplicateColumn(c.key.clone()));
        }
    }
    Ok(())
}
