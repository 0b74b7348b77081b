pub mod prelude;

pub mod episode_progress;
pub mod episodes;
pub mod favorite_titles;
pub mod files;
pub mod genres;
pub mod messages;
pub mod parsers;
pub mod related_links;
pub mod related_titles;
pub mod title_genres;
pub mod titles;
pub mod users;
