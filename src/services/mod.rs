pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Registration};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod title_service;
pub use title_service::{SyncSummary, TitleDetails, TitleError, TitleService};

pub mod title_service_impl;
pub use title_service_impl::SeaOrmTitleService;
