pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod alias_service;
pub mod alias_service_impl;
pub use alias_service::{AliasError, AliasService, convert_real_address};
pub use alias_service_impl::SeaOrmAliasService;

pub mod bootstrap;
pub use bootstrap::{BootstrapOutcome, ensure_default_admin};

pub mod validation;
