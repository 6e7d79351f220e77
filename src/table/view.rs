use super::column::{check_unique_keys, ColumnDescriptor};
use super::error::TableError;
use super::paginate::{clamp_page, page_slice, total_pages, PageInfo};
use super::search::filter_rows;
use super::sort::{sort_rows, SortDirection, SortState};
use super::value::Row;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_EMPTY_MESSAGE: &str = "No records found";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub searchable: bool,
    pub sortable: bool,
    pub paginated: bool,
    pub page_size: usize,
    pub empty_message: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            searchable: true,
            sortable: true,
            paginated: true,
            page_size: DEFAULT_PAGE_SIZE,
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
        }
    }
}

pub type RowClickFn = Box<dyn FnMut(&Row) + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    /// Position on the current page; what `click_row` takes.
    pub position: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TableBody {
    Rows { rows: Vec<RenderedRow> },
    /// One placeholder row spanning every column.
    Empty { message: String, colspan: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub query: String,
    pub sort: SortState,
    pub current_page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTable {
    pub headers: Vec<HeaderCell>,
    pub body: TableBody,
    pub searchable: bool,
    pub state: ViewState,
    pub matched_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

/// One table instance: columns, the caller's rows, and the
/// query/sort/page state driven by user events.
///
/// The filtered and sorted order is cached as row indices and only
/// recomputed after the rows, the query or the sort change.
pub struct TableView {
    columns: Vec<ColumnDescriptor>,
    options: TableOptions,
    rows: Vec<Row>,
    query: String,
    sort: SortState,
    page: usize,
    order: Option<Vec<usize>>,
    on_row_click: Option<RowClickFn>,
}

impl TableView {
    pub fn new(columns: Vec<ColumnDescriptor>, options: TableOptions) -> Result<Self, TableError> {
        check_unique_keys(&columns)?;
        if options.page_size == 0 {
            return Err(TableError::BadOptions(
                "pageSize must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            columns,
            options,
            rows: Vec::new(),
            query: String::new(),
            sort: SortState::default(),
            page: 1,
            order: None,
            on_row_click: None,
        })
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.set_rows(rows);
        self
    }

    #[allow(dead_code)]
    pub fn on_row_click<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Row) + Send + 'static,
    {
        self.on_row_click = Some(Box::new(f));
        self
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            query: self.query.clone(),
            sort: self.sort.clone(),
            current_page: self.page,
            page_size: self.options.page_size,
        }
    }

    /// Replace the rows wholesale. Query and sort survive; the page is
    /// clamped to whatever the new row count allows.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.order = None;
        self.clamp();
    }

    pub fn set_query(&mut self, query: &str) -> Result<(), TableError> {
        if !self.options.searchable {
            return Err(TableError::SearchDisabled);
        }
        if self.query != query {
            self.query = query.to_string();
            self.order = None;
        }
        self.page = 1;
        Ok(())
    }

    /// Header click. Returns the sort now in effect.
    pub fn click_header(&mut self, key: &str) -> Result<&SortState, TableError> {
        let next = self.sort.clicked(key);
        self.apply_sort(next)?;
        Ok(&self.sort)
    }

    pub fn set_sort(&mut self, key: &str, direction: SortDirection) -> Result<(), TableError> {
        self.apply_sort(SortState::by(key, direction))
    }

    pub fn clear_sort(&mut self) {
        if self.sort.key.is_some() {
            self.sort = SortState::default();
            self.order = None;
        }
        self.page = 1;
    }

    fn apply_sort(&mut self, next: SortState) -> Result<(), TableError> {
        let key = next.key.as_deref().unwrap_or_default();
        let Some(column) = self.columns.iter().find(|c| c.key == key) else {
            return Err(TableError::UnknownColumn(key.to_string()));
        };
        if !self.options.sortable || !column.sortable {
            return Err(TableError::SortDisabled(key.to_string()));
        }
        if self.sort != next {
            self.sort = next;
            self.order = None;
        }
        self.page = 1;
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<usize, TableError> {
        if !self.options.paginated {
            return Err(TableError::PaginationDisabled);
        }
        self.page = page;
        self.clamp();
        Ok(self.page)
    }

    pub fn next_page(&mut self) -> Result<usize, TableError> {
        self.go_to_page(self.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Result<usize, TableError> {
        self.go_to_page(self.page.saturating_sub(1))
    }

    pub fn total_pages(&mut self) -> usize {
        let matched = self.derived().len();
        total_pages(matched, self.options.page_size)
    }

    /// Row click at `position` on the current page. Fires the callback with
    /// the caller's original row and returns it.
    pub fn click_row(&mut self, position: usize) -> Result<&Row, TableError> {
        let visible = self.visible_indices();
        let Some(&idx) = visible.get(position) else {
            return Err(TableError::RowOutOfRange {
                position,
                shown: visible.len(),
            });
        };
        let row = &self.rows[idx];
        if let Some(cb) = self.on_row_click.as_mut() {
            cb(row);
        }
        Ok(row)
    }

    /// Rows on the current page, in display order.
    #[allow(dead_code)]
    pub fn visible_rows(&mut self) -> Vec<&Row> {
        let visible = self.visible_indices();
        visible.into_iter().map(|i| &self.rows[i]).collect()
    }

    pub fn render(&mut self) -> RenderedTable {
        let matched_rows = self.derived().len();
        let visible = self.visible_indices();

        let headers = self
            .columns
            .iter()
            .map(|c| HeaderCell {
                key: c.key.clone(),
                label: c.label.clone(),
                sortable: self.options.sortable && c.sortable,
                sorted: match self.sort.key.as_deref() {
                    Some(k) if k == c.key => Some(self.sort.direction),
                    _ => None,
                },
            })
            .collect();

        let body = if visible.is_empty() {
            TableBody::Empty {
                message: self.options.empty_message.clone(),
                colspan: self.columns.len().max(1),
            }
        } else {
            TableBody::Rows {
                rows: visible
                    .iter()
                    .enumerate()
                    .map(|(position, &i)| RenderedRow {
                        position,
                        cells: self
                            .columns
                            .iter()
                            .map(|c| c.cell_text(&self.rows[i]))
                            .collect(),
                    })
                    .collect(),
            }
        };

        let pagination = self
            .options
            .paginated
            .then(|| PageInfo::new(matched_rows, self.options.page_size, self.page));

        RenderedTable {
            headers,
            body,
            searchable: self.options.searchable,
            state: self.state(),
            matched_rows,
            pagination,
        }
    }

    fn clamp(&mut self) {
        let pages = self.total_pages();
        self.page = clamp_page(self.page, pages);
    }

    fn visible_indices(&mut self) -> Vec<usize> {
        let paginated = self.options.paginated;
        let page_size = self.options.page_size;
        let page = self.page;
        let order = self.derived();
        if paginated {
            page_slice(order, page_size, page).to_vec()
        } else {
            order.to_vec()
        }
    }

    fn derived(&mut self) -> &[usize] {
        if self.order.is_none() {
            let mut order = filter_rows(&self.rows, &self.columns, &self.query);
            sort_rows(&self.rows, &mut order, &self.sort);
            log::debug!(
                "table recomputed: {} of {} rows match {:?}",
                order.len(),
                self.rows.len(),
                self.query
            );
            self.order = Some(order);
        }
        self.order.as_deref().unwrap_or_default()
    }
}
