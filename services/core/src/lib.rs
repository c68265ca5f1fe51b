pub mod auth;
pub mod endpoint_error;
pub mod operation_error;
pub mod telemetry;

pub use auth::{Claims, Principal, PrincipalError, Role};
pub use endpoint_error::EndpointError;
pub use operation_error::OperationError;
