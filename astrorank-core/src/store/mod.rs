///! Rank and comment persistence
///!
///! Both maps live in memory and are written together by [`save`]: the
///! rankings file (`identifier\trank`) and its comments companion
///! (`identifier\trank\tcomment`), one line per catalog identifier.

mod comments;
mod rank;
mod rankings;

pub use comments::CommentStore;
pub use rank::{default_rank_keys, Rank, RankScale};
pub use rankings::{comments_path, save, RankingStore};
pub(crate) use rankings::write_replace;
