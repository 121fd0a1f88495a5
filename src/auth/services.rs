use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::StoreError,
    },
    error::{AppError, AppResult},
};

const MISSING_FIELDS: AppError = AppError::Validation("Missing fields");
const INVALID_CREDENTIALS: AppError = AppError::Auth("Invalid credentials");

/// Present means supplied and non-empty; nothing beyond that is checked.
fn required(field: Option<String>) -> AppResult<String> {
    field.filter(|v| !v.is_empty()).ok_or(MISSING_FIELDS)
}

fn issue(keys: &JwtKeys, user: PublicUser, failure: &'static str) -> AppResult<AuthResponse> {
    let token = keys
        .sign(user.id, &user.email)
        .map_err(|e| AppError::internal(failure, e))?;
    Ok(AuthResponse { token, user })
}

pub async fn signup(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: SignupRequest,
) -> AppResult<AuthResponse> {
    let name = required(req.name)?;
    let email = required(req.email)?.to_lowercase();
    let password = required(req.password)?;

    let hash = hash_password(&password)
        .map_err(|e| AppError::internal("Failed to create account", e))?;

    // The store's unique constraint decides races between concurrent signups.
    let user = match users.create(&name, &email, &hash).await {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict);
        }
        Err(StoreError::Database(e)) => {
            return Err(AppError::internal("Failed to create account", e));
        }
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    issue(keys, PublicUser::from(user), "Failed to create account")
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let email = required(req.email)?.to_lowercase();
    let password = required(req.password)?;

    let user = match users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(INVALID_CREDENTIALS);
        }
        Err(e) => return Err(AppError::internal("Server error", e)),
    };

    let ok = verify_password(&password, &user.password_hash)
        .map_err(|e| AppError::internal("Server error", e))?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(INVALID_CREDENTIALS);
    }

    info!(user_id = user.id, "user logged in");
    issue(keys, PublicUser::from(user), "Server error")
}
