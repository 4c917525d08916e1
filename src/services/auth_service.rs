use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};

use crate::{
    audit::log_audit,
    dto::auth::{AdminInfo, Claims, LoginRequest, LoginResponse},
    entity::admins::{Column, Entity as Admins, Model as AdminModel},
    error::{AppError, AppResult},
    middleware::auth::jwt_secret,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;

    // Operators sometimes type their email into the username field.
    let admin = find_active(state, Column::Username, &username).await?;
    let admin = match admin {
        Some(a) => a,
        None => find_active(state, Column::Email, &username)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid username or password".into()))?,
    };

    let parsed_hash = PasswordHash::new(&admin.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid username or password".into()));
    }

    let secret = jwt_secret()?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: admin.id.to_string(),
        username: admin.username.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.id),
        "admin_login",
        Some("admins"),
        Some(serde_json::json!({ "admin_id": admin.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = LoginResponse {
        access_token: token,
        admin: AdminInfo {
            id: admin.id.to_string(),
            username: admin.username,
            email: admin.email,
        },
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

async fn find_active(
    state: &AppState,
    column: Column,
    value: &str,
) -> AppResult<Option<AdminModel>> {
    let admin = Admins::find()
        .filter(
            Condition::all()
                .add(column.eq(value))
                .add(Column::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?;
    Ok(admin)
}
