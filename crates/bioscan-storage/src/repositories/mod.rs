pub mod template;

pub use template::{SqliteTemplateStore, TemplateStore};
