/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token issuance and validation
/// - [`middleware`]: Token extraction and the authenticated actor context
/// - [`access`]: Owner / participant checks for tasks and bugs
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::auth::password::{hash_password, verify_password};
/// use bugboard_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "alice");
/// let token = create_token(&claims, "secret")?;
/// let validated = validate_token(&token, "secret")?;
/// assert_eq!(validated.name, "alice");
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod jwt;
pub mod middleware;
pub mod password;
