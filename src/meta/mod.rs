pub mod builder;
pub mod types;

pub use builder::init_table_meta;
pub use types::{ColumnMeta, IndexKind, IndexMeta, TableMeta};
