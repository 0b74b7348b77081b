pub mod episode;
pub mod title;
