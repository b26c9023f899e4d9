//! Claims carried by identity-provider access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an authenticated principal.
pub const ROLE_USER: &str = "user";
/// Role with access to the admin surface.
pub const ROLE_ADMIN: &str = "admin";

/// JWT claims for access tokens issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// Role: `user` or `admin`.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns true if the principal has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_check() {
        let expires = Utc::now() + chrono::Duration::minutes(15);
        let admin = Claims::new(Uuid::new_v4(), "a@example.com", ROLE_ADMIN, expires);
        let user = Claims::new(Uuid::new_v4(), "u@example.com", ROLE_USER, expires);
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
