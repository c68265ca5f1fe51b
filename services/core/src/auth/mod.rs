pub mod jwt;
pub mod principal;

pub use jwt::Claims;
pub use principal::{Principal, PrincipalError, Role};
