use std::convert::Infallible;
use std::error::Error;

use tonic::Code;

/// Trait to be implemented by errors returned by the different operations of services.
pub trait OperationError: Error {
    /// gRPC code corresponding to this error.
    fn code(&self) -> Code;
}

/// Operations that cannot fail on their own (only through validation or internal errors) use
/// `Infallible` as their operation error.
impl OperationError for Infallible {
    fn code(&self) -> Code {
        match *self {}
    }
}
