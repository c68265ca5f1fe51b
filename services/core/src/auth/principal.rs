use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use super::jwt::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
    Parent,
    Admin,
}

/// The verified caller of an operation.
///
/// A principal can only be obtained from verified [`Claims`], which is what keeps unauthenticated
/// requests away from the operations taking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    user_id: Uuid,
    role: Role,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PrincipalError {
    #[error("Subject {0:?} is not a valid user ID.")]
    InvalidSubject(String),

    #[error("Role {0:?} is not recognized.")]
    UnknownRole(String),
}

impl Principal {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

impl TryFrom<Claims> for Principal {
    type Error = PrincipalError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| PrincipalError::InvalidSubject(claims.sub.clone()))?;
        let role = Role::from_str(&claims.role).map_err(|_| PrincipalError::UnknownRole(claims.role.clone()))?;

        Ok(Principal { user_id, role })
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let role: &str = self.role.as_ref();
        write!(f, "{}:{}", role, self.user_id)
    }
}
