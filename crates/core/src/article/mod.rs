mod slug;
mod types;

pub use slug::slugify;
pub use types::{
    Article, ArticleCriteria, Author, Comment, NewArticle, NewComment, Tag, DEFAULT_PAGE_LIMIT,
};
