pub mod article;
pub mod source;

pub use article::{ArticleRecord, StoredArticle};
pub use source::Source;
