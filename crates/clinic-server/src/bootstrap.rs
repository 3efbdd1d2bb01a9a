//! Start-up provisioning of the administrator account.
//!
//! Admin and staff accounts cannot self-register. The admin account named in
//! `bootstrap.admin_user` is created here on first start; staff accounts are
//! provisioned out of band.

use clinic_auth::{Role, hash_password};
use clinic_storage::{ClinicStorage, NewUser, StorageError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to hash admin password: {0}")]
    Hash(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Creates the admin user unless a user of that name already exists.
///
/// Returns `true` if the user was created.
pub async fn bootstrap_admin_user(
    storage: &dyn ClinicStorage,
    admin: &crate::config::AdminUserConfig,
) -> Result<bool, BootstrapError> {
    if let Some(existing) = storage.find_user_by_username(&admin.username).await? {
        if existing.role != Role::Admin {
            tracing::warn!(
                username = %admin.username,
                role = %existing.role,
                "Bootstrap admin username belongs to a non-admin user"
            );
        }
        info!(username = %admin.username, "Admin user already exists, skipping bootstrap");
        return Ok(false);
    }

    let password_hash =
        hash_password(&admin.password).map_err(|e| BootstrapError::Hash(e.to_string()))?;

    let mut tx = storage.begin_registration().await?;
    let user = match tx
        .insert_user(&NewUser {
            username: admin.username.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Admin bootstrap rollback failed");
            }
            return Err(e.into());
        }
    };
    tx.commit().await?;

    info!(user_id = user.id, username = %user.username, "Admin user created");
    Ok(true)
}
