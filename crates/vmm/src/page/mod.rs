#[allow(clippy::module_inception)]
mod page;
mod page_table;

pub use page::{Page, PageKey, PageState};
pub(crate) use page_table::PageTable;
