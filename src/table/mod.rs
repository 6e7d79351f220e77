//! Tabular view engine shared by every list screen: column resolution,
//! search, stable sort and pagination, composed by [`TableView`].

mod column;
mod error;
mod paginate;
mod search;
mod sort;
mod value;
mod view;

pub use column::{resolve_columns, ColumnDef};
pub use error::TableError;
pub use sort::SortDirection;
pub use value::Row;
pub use view::{TableOptions, TableView};
