use crate::operation_error::OperationError;
use std::error::Error;
use std::fmt::Display;
use strum::AsRefStr;
use tonic::Code;
use tonic::Status;

/// Error returned by every service operation.
///
/// Validation and internal failures are shared by all operations; anything specific to an
/// operation is carried by `Operation`.
#[derive(Debug, AsRefStr)]
pub enum EndpointError<E: OperationError> {
    Validation(String),
    Internal,
    Operation(E),
}

impl<E: OperationError> EndpointError<E> {
    pub fn validation(msg: impl Into<String>) -> Self {
        EndpointError::Validation(msg.into())
    }

    pub fn internal() -> Self {
        EndpointError::Internal
    }

    pub fn operation(err: E) -> Self {
        EndpointError::Operation(err)
    }

    /// Returns the operation error, if this is one.
    pub fn as_operation(&self) -> Option<&E> {
        match self {
            EndpointError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: OperationError> OperationError for EndpointError<E> {
    fn code(&self) -> tonic::Code {
        match self {
            EndpointError::Validation(_) => Code::InvalidArgument,
            EndpointError::Internal => Code::Internal,
            EndpointError::Operation(e) => e.code(),
        }
    }
}

impl<E: OperationError> Error for EndpointError<E> {}

impl<E: OperationError> Display for EndpointError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &str = self.as_ref();
        let msg = match self {
            EndpointError::Validation(msg) => msg.clone(),
            EndpointError::Internal => String::from("Internal server error."),
            EndpointError::Operation(err) => err.to_string(),
        };

        write!(f, "{}: {}", kind, msg)
    }
}

impl<E: OperationError> From<EndpointError<E>> for Status {
    fn from(err: EndpointError<E>) -> Status {
        Status::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum SampleError {
        #[error("Thing not found.")]
        NotFound,
    }

    impl OperationError for SampleError {
        fn code(&self) -> Code {
            Code::NotFound
        }
    }

    #[test]
    fn display_prefixes_kind() {
        let err = EndpointError::operation(SampleError::NotFound);
        assert_eq!(err.to_string(), "Operation: Thing not found.");

        let err = EndpointError::<SampleError>::validation("Title is too short.");
        assert_eq!(err.to_string(), "Validation: Title is too short.");
    }

    #[test]
    fn status_carries_operation_code() {
        let status: Status = EndpointError::operation(SampleError::NotFound).into();
        assert_eq!(status.code(), Code::NotFound);

        let status: Status = EndpointError::<SampleError>::internal().into();
        assert_eq!(status.code(), Code::Internal);
    }
}
