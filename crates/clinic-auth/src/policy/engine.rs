//! Policy evaluation with ownership self-checks.

use async_trait::async_trait;

use super::table::{Action, Grant, grant_for};
use crate::error::AuthError;
use crate::types::{PatientId, Principal, ProviderId, UserId};
use crate::AuthResult;

// =============================================================================
// Ownership lookups
// =============================================================================

/// Lookups the engine needs to resolve self-checks.
///
/// Implemented for every record store. Each method returns `Ok(None)` when
/// the row does not exist.
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// Returns the owning user id of a patient row.
    async fn patient_owner(&self, patient_id: PatientId) -> AuthResult<Option<UserId>>;

    /// Returns the owning user id of a provider row.
    async fn provider_owner(&self, provider_id: ProviderId) -> AuthResult<Option<UserId>>;

    /// Returns the provider row owned by a user.
    async fn provider_for_user(&self, user_id: UserId) -> AuthResult<Option<ProviderId>>;
}

// =============================================================================
// Decision types
// =============================================================================

/// Identifiers of the resource an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    /// The action is not scoped to a single patient or provider.
    None,
    /// The action targets rows owned by this patient.
    Patient(PatientId),
    /// The action targets rows owned by this provider.
    Provider(ProviderId),
}

/// Details carried by an allow decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Allowed {
    /// Provider row of the principal, set for `Grant::ActingProvider`.
    pub acting_provider: Option<ProviderId>,
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The policy table has no entry for this role and action.
    RoleNotPermitted,
    /// The target row belongs to another user.
    NotOwner,
    /// The principal has no provider row to act as.
    NoProviderRecord,
    /// The resource reference does not fit the self-check.
    ResourceMismatch,
}

impl DenyReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleNotPermitted => "role not permitted",
            Self::NotOwner => "not the owner",
            Self::NoProviderRecord => "no provider record",
            Self::ResourceMismatch => "resource mismatch",
        }
    }
}

/// Outcome of a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Allowed),
    Deny(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    fn allow() -> Self {
        Self::Allow(Allowed::default())
    }

    fn owner_check(owner: UserId, principal: &Principal) -> Self {
        if owner == principal.id {
            Self::allow()
        } else {
            Self::Deny(DenyReason::NotOwner)
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Decides whether a principal may perform an action on a resource.
///
/// Stateless; the only side effects are ownership reads through the
/// resolver, issued after the role check has passed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluates the policy table and any self-check it requires.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` when the patient or provider row a
    /// self-check needs does not exist, and `AuthError::Storage` when the
    /// lookup itself fails.
    pub async fn decide(
        &self,
        principal: &Principal,
        action: Action,
        resource: &ResourceRef,
        resolver: &dyn OwnershipResolver,
    ) -> AuthResult<AccessDecision> {
        let Some(grant) = grant_for(action, principal.role) else {
            return Ok(AccessDecision::Deny(DenyReason::RoleNotPermitted));
        };

        let decision = match (grant, resource) {
            (Grant::Allow, _) => AccessDecision::allow(),

            (Grant::OwnPatient, ResourceRef::Patient(patient_id)) => {
                let owner = resolver
                    .patient_owner(*patient_id)
                    .await?
                    .ok_or_else(|| AuthError::not_found(format!("Patient {patient_id} not found")))?;
                AccessDecision::owner_check(owner, principal)
            }

            (Grant::OwnProvider, ResourceRef::Provider(provider_id)) => {
                let owner = resolver
                    .provider_owner(*provider_id)
                    .await?
                    .ok_or_else(|| {
                        AuthError::not_found(format!("Provider {provider_id} not found"))
                    })?;
                AccessDecision::owner_check(owner, principal)
            }

            (Grant::ActingProvider, _) => match resolver.provider_for_user(principal.id).await? {
                Some(provider_id) => AccessDecision::Allow(Allowed {
                    acting_provider: Some(provider_id),
                }),
                None => AccessDecision::Deny(DenyReason::NoProviderRecord),
            },

            (Grant::OwnPatient | Grant::OwnProvider, _) => {
                AccessDecision::Deny(DenyReason::ResourceMismatch)
            }
        };

        if let AccessDecision::Deny(reason) = decision {
            tracing::debug!(
                user_id = principal.id,
                role = %principal.role,
                action = %action,
                resource = ?resource,
                reason = reason.as_str(),
                "Access denied"
            );
        }

        Ok(decision)
    }

    /// Like [`decide`](Self::decide) but turns a deny into
    /// `AuthError::Forbidden`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` on deny, otherwise the errors of
    /// [`decide`](Self::decide).
    pub async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        resource: &ResourceRef,
        resolver: &dyn OwnershipResolver,
    ) -> AuthResult<Allowed> {
        match self.decide(principal, action, resource, resolver).await? {
            AccessDecision::Allow(allowed) => Ok(allowed),
            AccessDecision::Deny(reason) => Err(AuthError::forbidden(reason.as_str())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::Role;
    use tokio_test::block_on;

    /// Resolver over fixed maps that counts lookups.
    #[derive(Default)]
    struct MockResolver {
        patients: HashMap<PatientId, UserId>,
        providers: HashMap<ProviderId, UserId>,
        lookups: AtomicUsize,
        fail: bool,
    }

    impl MockResolver {
        fn clinic() -> Self {
            // alice (user 1) owns patient 10, carol (user 2) owns patient 20,
            // drbob (user 3) owns provider 30.
            Self {
                patients: HashMap::from([(10, 1), (20, 2)]),
                providers: HashMap::from([(30, 3)]),
                ..Self::default()
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        fn check(&self) -> AuthResult<()> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AuthError::storage("connection reset"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl OwnershipResolver for MockResolver {
        async fn patient_owner(&self, patient_id: PatientId) -> AuthResult<Option<UserId>> {
            self.check()?;
            Ok(self.patients.get(&patient_id).copied())
        }

        async fn provider_owner(&self, provider_id: ProviderId) -> AuthResult<Option<UserId>> {
            self.check()?;
            Ok(self.providers.get(&provider_id).copied())
        }

        async fn provider_for_user(&self, user_id: UserId) -> AuthResult<Option<ProviderId>> {
            self.check()?;
            Ok(self
                .providers
                .iter()
                .find(|(_, owner)| **owner == user_id)
                .map(|(id, _)| *id))
        }
    }

    const PATIENT_SCOPED: [Action; 6] = [
        Action::ReadPatient,
        Action::UpdatePatient,
        Action::CreateAppointment,
        Action::ReadPatientAppointments,
        Action::ReadPatientMedicalRecords,
        Action::ReadPatientPrescriptions,
    ];

    fn alice() -> Principal {
        Principal::new(1, "alice", Role::Patient)
    }

    fn drbob() -> Principal {
        Principal::new(3, "drbob", Role::Doctor)
    }

    #[tokio::test]
    async fn patient_allowed_on_own_rows() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        for action in PATIENT_SCOPED.into_iter().chain([Action::ReadPatientBilling]) {
            let decision = engine
                .decide(&alice(), action, &ResourceRef::Patient(10), &resolver)
                .await
                .unwrap();
            assert!(decision.is_allowed(), "{action} on own patient row");
        }
    }

    #[tokio::test]
    async fn patient_denied_on_other_patients_rows() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        for action in PATIENT_SCOPED.into_iter().chain([Action::ReadPatientBilling]) {
            let decision = engine
                .decide(&alice(), action, &ResourceRef::Patient(20), &resolver)
                .await
                .unwrap();
            assert_eq!(
                decision,
                AccessDecision::Deny(DenyReason::NotOwner),
                "{action} on another patient's row"
            );
        }
    }

    #[tokio::test]
    async fn patient_denied_for_every_action_without_self_grant() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        for action in Action::ALL {
            if matches!(action, Action::ListProviders | Action::ReadProvider) {
                continue;
            }
            let decision = engine
                .decide(&alice(), action, &ResourceRef::Patient(20), &resolver)
                .await
                .unwrap();
            assert!(!decision.is_allowed(), "{action} must be denied");
        }
    }

    #[tokio::test]
    async fn role_denial_issues_no_lookup() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        let decision = engine
            .decide(&alice(), Action::ViewRevenueReport, &ResourceRef::None, &resolver)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Deny(DenyReason::RoleNotPermitted));

        let staff = Principal::new(5, "sam", Role::Staff);
        let decision = engine
            .decide(&staff, Action::CreateMedicalRecord, &ResourceRef::None, &resolver)
            .await
            .unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(resolver.lookups(), 0);
    }

    #[test]
    fn unconditional_grant_issues_no_lookup() {
        let resolver = MockResolver::clinic();
        let admin = Principal::new(9, "root", Role::Admin);

        let decision = block_on(PolicyEngine::new().decide(
            &admin,
            Action::ReadPatient,
            &ResourceRef::Patient(999),
            &resolver,
        ))
        .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(resolver.lookups(), 0);
    }

    #[test]
    fn missing_patient_row_is_not_found() {
        let resolver = MockResolver::clinic();
        let err = block_on(PolicyEngine::new().decide(
            &alice(),
            Action::ReadPatient,
            &ResourceRef::Patient(404),
            &resolver,
        ))
        .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn provider_self_check() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        let own = engine
            .decide(&drbob(), Action::ReadProviderAppointments, &ResourceRef::Provider(30), &resolver)
            .await
            .unwrap();
        assert!(own.is_allowed());

        let nurse = Principal::new(4, "nina", Role::Nurse);
        let other = engine
            .decide(&nurse, Action::ReadProviderAppointments, &ResourceRef::Provider(30), &resolver)
            .await
            .unwrap();
        assert_eq!(other, AccessDecision::Deny(DenyReason::NotOwner));

        let err = engine
            .decide(&drbob(), Action::ReadProviderAppointments, &ResourceRef::Provider(31), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn acting_provider_resolved_from_principal() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        let allowed = engine
            .authorize(&drbob(), Action::CreatePrescription, &ResourceRef::None, &resolver)
            .await
            .unwrap();
        assert_eq!(allowed.acting_provider, Some(30));

        // A doctor account without a provider row fails closed.
        let orphan = Principal::new(8, "drnobody", Role::Doctor);
        let decision = engine
            .decide(&orphan, Action::CreatePrescription, &ResourceRef::None, &resolver)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Deny(DenyReason::NoProviderRecord));

        let err = engine
            .authorize(&orphan, Action::CreatePrescription, &ResourceRef::None, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn wrong_resource_kind_fails_closed() {
        let resolver = MockResolver::clinic();
        let engine = PolicyEngine::new();

        for resource in [ResourceRef::None, ResourceRef::Provider(10)] {
            let decision = engine
                .decide(&alice(), Action::ReadPatient, &resource, &resolver)
                .await
                .unwrap();
            assert_eq!(decision, AccessDecision::Deny(DenyReason::ResourceMismatch));
        }
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let resolver = MockResolver {
            fail: true,
            ..MockResolver::clinic()
        };
        let err = PolicyEngine::new()
            .decide(&alice(), Action::ReadPatient, &ResourceRef::Patient(10), &resolver)
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }
}
