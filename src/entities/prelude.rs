pub use super::episode_progress::Entity as EpisodeProgress;
pub use super::episodes::Entity as Episodes;
pub use super::favorite_titles::Entity as FavoriteTitles;
pub use super::files::Entity as Files;
pub use super::genres::Entity as Genres;
pub use super::messages::Entity as Messages;
pub use super::parsers::Entity as Parsers;
pub use super::related_links::Entity as RelatedLinks;
pub use super::related_titles::Entity as RelatedTitles;
pub use super::title_genres::Entity as TitleGenres;
pub use super::titles::Entity as Titles;
pub use super::users::Entity as Users;
