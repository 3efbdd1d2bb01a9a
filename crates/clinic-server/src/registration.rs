//! Account registration.
//!
//! A user row and its patient or provider profile are written in one
//! registration transaction. Any failure after the transaction has begun
//! rolls it back before the error is returned.

use clinic_api::{ApiError, ApiResult};
use clinic_auth::{PatientId, ProviderId, Role, UserId, hash_password};
use clinic_storage::{
    ClinicStorage, NewUser, PatientDetails, ProviderDetails, RegistrationTransaction,
};
use serde::{Deserialize, Serialize};

const MAX_USERNAME_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub patient_data: Option<PatientDetails>,
    #[serde(default)]
    pub provider_data: Option<ProviderDetails>,
}

/// Profile row created alongside the user.
#[derive(Debug, Clone)]
enum Profile<'a> {
    Patient(&'a PatientDetails),
    Provider(&'a ProviderDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registered {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<PatientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
}

impl RegisterRequest {
    /// Checks the request and picks the profile its role requires.
    fn validate(&self) -> ApiResult<Profile<'_>> {
        let username = self.username.as_str();
        if username.trim().is_empty() {
            return Err(ApiError::bad_request("username is required"));
        }
        // Login looks the name up verbatim, so it is stored verbatim.
        if username.trim() != username {
            return Err(ApiError::bad_request(
                "username must not start or end with whitespace",
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ApiError::bad_request(format!(
                "username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("password is required"));
        }

        match self.role {
            Role::Patient => {
                let details = self
                    .patient_data
                    .as_ref()
                    .ok_or_else(|| ApiError::bad_request("patientData is required for role patient"))?;
                details.validate()?;
                Ok(Profile::Patient(details))
            }
            Role::Doctor | Role::Nurse => {
                let details = self.provider_data.as_ref().ok_or_else(|| {
                    ApiError::bad_request(format!("providerData is required for role {}", self.role))
                })?;
                details.validate()?;
                Ok(Profile::Provider(details))
            }
            Role::Admin | Role::Staff => Err(ApiError::bad_request(format!(
                "role {} cannot self-register",
                self.role
            ))),
        }
    }
}

/// Registers a user and its profile atomically.
pub async fn register(
    storage: &dyn ClinicStorage,
    request: RegisterRequest,
) -> ApiResult<Registered> {
    let profile = request.validate()?;

    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing task failed");
            ApiError::internal("Internal server error")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ApiError::internal("Internal server error")
        })?;

    let new_user = NewUser {
        username: request.username.clone(),
        password_hash,
        role: request.role,
    };

    let mut tx = storage.begin_registration().await?;
    match insert_rows(tx.as_mut(), &new_user, profile).await {
        Ok(registered) => {
            tx.commit().await?;
            tracing::info!(
                user_id = registered.user_id,
                role = %registered.role,
                "User registered"
            );
            Ok(registered)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Registration rollback failed");
            }
            Err(err)
        }
    }
}

async fn insert_rows(
    tx: &mut dyn RegistrationTransaction,
    new_user: &NewUser,
    profile: Profile<'_>,
) -> ApiResult<Registered> {
    let user = tx.insert_user(new_user).await?;
    let mut registered = Registered {
        user_id: user.id,
        username: user.username,
        role: user.role,
        patient_id: None,
        provider_id: None,
    };

    match profile {
        Profile::Patient(details) => {
            registered.patient_id = Some(tx.insert_patient(user.id, details).await?.id);
        }
        Profile::Provider(details) => {
            registered.provider_id = Some(tx.insert_provider(user.id, details).await?.id);
        }
    }
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_db_memory::InMemoryStorage;

    fn patient_request(username: &str, email: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "username": username,
            "password": "pw1",
            "role": "patient",
            "patientData": {
                "first_name": "Alice",
                "last_name": "Liddell",
                "date_of_birth": "1990-05-14",
                "email": email
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn registers_patient_with_profile() {
        let storage = InMemoryStorage::new();
        let registered = register(&storage, patient_request("alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(registered.role, Role::Patient);
        let patient_id = registered.patient_id.unwrap();
        assert_eq!(
            storage.patient_owner(patient_id).await.unwrap(),
            Some(registered.user_id)
        );
        let user = storage.find_user_by_username("alice").await.unwrap().unwrap();
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn failed_profile_insert_leaves_no_user() {
        let storage = InMemoryStorage::new();
        register(&storage, patient_request("alice", "shared@example.com"))
            .await
            .unwrap();

        let err = register(&storage, patient_request("bob", "shared@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(storage.find_user_by_username("bob").await.unwrap().is_none());
        assert_eq!(storage.user_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let storage = InMemoryStorage::new();
        register(&storage, patient_request("alice", "a1@example.com"))
            .await
            .unwrap();
        let err = register(&storage, patient_request("alice", "a2@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn role_specific_data_is_required() {
        let storage = InMemoryStorage::new();
        let mut request = patient_request("carol", "carol@example.com");
        request.patient_data = None;
        let err = register(&storage, request).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let mut request = patient_request("dave", "dave@example.com");
        request.role = Role::Doctor;
        let err = register(&storage, request).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(storage.user_count().await, 0);
    }

    #[tokio::test]
    async fn admin_and_staff_cannot_self_register() {
        let storage = InMemoryStorage::new();
        for role in [Role::Admin, Role::Staff] {
            let mut request = patient_request("eve", "eve@example.com");
            request.role = role;
            let err = register(&storage, request).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
        assert_eq!(storage.user_count().await, 0);
    }

    #[tokio::test]
    async fn padded_username_is_rejected() {
        let storage = InMemoryStorage::new();
        for username in [" carol ", "carol ", "\tcarol", "   "] {
            let err = register(&storage, patient_request(username, "carol@example.com"))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{username:?}");
        }
        assert_eq!(storage.user_count().await, 0);
    }

    #[test]
    fn unknown_role_is_rejected_at_parse() {
        let result: Result<RegisterRequest, _> = serde_json::from_value(serde_json::json!({
            "username": "mallory",
            "password": "pw",
            "role": "superuser"
        }));
        assert!(result.is_err());
    }
}
