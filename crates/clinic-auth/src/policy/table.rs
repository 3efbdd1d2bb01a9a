//! Static role/action policy table.

use std::fmt;

use serde::Serialize;

use crate::types::Role;

/// Every operation that goes through the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ListPatients,
    ReadPatient,
    UpdatePatient,
    ListProviders,
    ReadProvider,
    CreateAppointment,
    ReadPatientAppointments,
    ReadProviderAppointments,
    UpdateAppointmentStatus,
    CreateMedicalRecord,
    ReadPatientMedicalRecords,
    CreatePrescription,
    ReadPatientPrescriptions,
    CreateBilling,
    UpdateBilling,
    ReadPatientBilling,
    ViewAppointmentReport,
    ViewRevenueReport,
}

impl Action {
    pub const ALL: [Action; 18] = [
        Action::ListPatients,
        Action::ReadPatient,
        Action::UpdatePatient,
        Action::ListProviders,
        Action::ReadProvider,
        Action::CreateAppointment,
        Action::ReadPatientAppointments,
        Action::ReadProviderAppointments,
        Action::UpdateAppointmentStatus,
        Action::CreateMedicalRecord,
        Action::ReadPatientMedicalRecords,
        Action::CreatePrescription,
        Action::ReadPatientPrescriptions,
        Action::CreateBilling,
        Action::UpdateBilling,
        Action::ReadPatientBilling,
        Action::ViewAppointmentReport,
        Action::ViewRevenueReport,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListPatients => "list_patients",
            Self::ReadPatient => "read_patient",
            Self::UpdatePatient => "update_patient",
            Self::ListProviders => "list_providers",
            Self::ReadProvider => "read_provider",
            Self::CreateAppointment => "create_appointment",
            Self::ReadPatientAppointments => "read_patient_appointments",
            Self::ReadProviderAppointments => "read_provider_appointments",
            Self::UpdateAppointmentStatus => "update_appointment_status",
            Self::CreateMedicalRecord => "create_medical_record",
            Self::ReadPatientMedicalRecords => "read_patient_medical_records",
            Self::CreatePrescription => "create_prescription",
            Self::ReadPatientPrescriptions => "read_patient_prescriptions",
            Self::CreateBilling => "create_billing",
            Self::UpdateBilling => "update_billing",
            Self::ReadPatientBilling => "read_patient_billing",
            Self::ViewAppointmentReport => "view_appointment_report",
            Self::ViewRevenueReport => "view_revenue_report",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a role is granted for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    /// Allowed unconditionally.
    Allow,
    /// Allowed when the target patient row belongs to the principal.
    OwnPatient,
    /// Allowed when the target provider row belongs to the principal.
    OwnProvider,
    /// Allowed when the principal has a provider row; that row becomes the
    /// acting provider of the operation.
    ActingProvider,
}

type RoleGrants = &'static [(Role, Grant)];

const ANY_AUTHENTICATED: RoleGrants = &[
    (Role::Admin, Grant::Allow),
    (Role::Doctor, Grant::Allow),
    (Role::Nurse, Grant::Allow),
    (Role::Staff, Grant::Allow),
    (Role::Patient, Grant::Allow),
];

const ADMIN_ONLY: RoleGrants = &[(Role::Admin, Grant::Allow)];

const ADMIN_OR_OWN_PATIENT: RoleGrants = &[
    (Role::Admin, Grant::Allow),
    (Role::Patient, Grant::OwnPatient),
];

const OFFICE_OR_OWN_PATIENT: RoleGrants = &[
    (Role::Admin, Grant::Allow),
    (Role::Staff, Grant::Allow),
    (Role::Patient, Grant::OwnPatient),
];

const CLINICAL_OR_OWN_PATIENT: RoleGrants = &[
    (Role::Admin, Grant::Allow),
    (Role::Doctor, Grant::Allow),
    (Role::Nurse, Grant::Allow),
    (Role::Patient, Grant::OwnPatient),
];

const ADMIN_OR_OWN_PROVIDER: RoleGrants = &[
    (Role::Admin, Grant::Allow),
    (Role::Doctor, Grant::OwnProvider),
    (Role::Nurse, Grant::OwnProvider),
];

const PROVIDERS: RoleGrants = &[(Role::Doctor, Grant::Allow), (Role::Nurse, Grant::Allow)];

const ACTING_PROVIDERS: RoleGrants = &[
    (Role::Doctor, Grant::ActingProvider),
    (Role::Nurse, Grant::ActingProvider),
];

const OFFICE: RoleGrants = &[(Role::Admin, Grant::Allow), (Role::Staff, Grant::Allow)];

/// The policy table. Every action appears exactly once.
const POLICY_TABLE: &[(Action, RoleGrants)] = &[
    (Action::ListPatients, ADMIN_ONLY),
    (Action::ReadPatient, ADMIN_OR_OWN_PATIENT),
    (Action::UpdatePatient, ADMIN_OR_OWN_PATIENT),
    (Action::ListProviders, ANY_AUTHENTICATED),
    (Action::ReadProvider, ANY_AUTHENTICATED),
    (Action::CreateAppointment, OFFICE_OR_OWN_PATIENT),
    (Action::ReadPatientAppointments, OFFICE_OR_OWN_PATIENT),
    (Action::ReadProviderAppointments, ADMIN_OR_OWN_PROVIDER),
    (Action::UpdateAppointmentStatus, PROVIDERS),
    (Action::CreateMedicalRecord, PROVIDERS),
    (Action::ReadPatientMedicalRecords, CLINICAL_OR_OWN_PATIENT),
    (Action::CreatePrescription, ACTING_PROVIDERS),
    (Action::ReadPatientPrescriptions, CLINICAL_OR_OWN_PATIENT),
    (Action::CreateBilling, OFFICE),
    (Action::UpdateBilling, OFFICE),
    (Action::ReadPatientBilling, OFFICE_OR_OWN_PATIENT),
    (Action::ViewAppointmentReport, ADMIN_ONLY),
    (Action::ViewRevenueReport, ADMIN_ONLY),
];

/// Looks up what `role` is granted for `action`. `None` means DENY.
#[must_use]
pub fn grant_for(action: Action, role: Role) -> Option<Grant> {
    POLICY_TABLE
        .iter()
        .find(|(a, _)| *a == action)
        .and_then(|(_, grants)| grants.iter().find(|(r, _)| *r == role))
        .map(|(_, grant)| *grant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_exactly_one_row() {
        for action in Action::ALL {
            let rows = POLICY_TABLE.iter().filter(|(a, _)| *a == action).count();
            assert_eq!(rows, 1, "{action} must appear once in the policy table");
        }
        assert_eq!(POLICY_TABLE.len(), Action::ALL.len());
    }

    #[test]
    fn reports_are_admin_only() {
        for action in [Action::ViewAppointmentReport, Action::ViewRevenueReport, Action::ListPatients] {
            for role in Role::ALL {
                let expected = (role == Role::Admin).then_some(Grant::Allow);
                assert_eq!(grant_for(action, role), expected, "{action} for {role}");
            }
        }
    }

    #[test]
    fn providers_visible_to_everyone() {
        for role in Role::ALL {
            assert_eq!(grant_for(Action::ListProviders, role), Some(Grant::Allow));
            assert_eq!(grant_for(Action::ReadProvider, role), Some(Grant::Allow));
        }
    }

    #[test]
    fn clinical_writes_need_provider_role() {
        for action in [Action::UpdateAppointmentStatus, Action::CreateMedicalRecord] {
            assert_eq!(grant_for(action, Role::Doctor), Some(Grant::Allow));
            assert_eq!(grant_for(action, Role::Nurse), Some(Grant::Allow));
            assert_eq!(grant_for(action, Role::Admin), None);
            assert_eq!(grant_for(action, Role::Staff), None);
            assert_eq!(grant_for(action, Role::Patient), None);
        }
        assert_eq!(
            grant_for(Action::CreatePrescription, Role::Doctor),
            Some(Grant::ActingProvider)
        );
        assert_eq!(grant_for(Action::CreatePrescription, Role::Admin), None);
    }

    #[test]
    fn billing_writes_are_office_only() {
        for action in [Action::CreateBilling, Action::UpdateBilling] {
            assert_eq!(grant_for(action, Role::Admin), Some(Grant::Allow));
            assert_eq!(grant_for(action, Role::Staff), Some(Grant::Allow));
            assert_eq!(grant_for(action, Role::Doctor), None);
            assert_eq!(grant_for(action, Role::Patient), None);
        }
    }

    #[test]
    fn patient_grants_are_always_self_checked() {
        for action in Action::ALL {
            match grant_for(action, Role::Patient) {
                None | Some(Grant::OwnPatient) => {}
                Some(Grant::Allow) => assert!(
                    matches!(action, Action::ListProviders | Action::ReadProvider),
                    "{action} must not be unconditionally granted to patients"
                ),
                Some(other) => panic!("unexpected patient grant {other:?} for {action}"),
            }
        }
    }

    #[test]
    fn provider_appointments_self_checked_for_providers() {
        assert_eq!(
            grant_for(Action::ReadProviderAppointments, Role::Nurse),
            Some(Grant::OwnProvider)
        );
        assert_eq!(grant_for(Action::ReadProviderAppointments, Role::Staff), None);
        assert_eq!(grant_for(Action::ReadProviderAppointments, Role::Patient), None);
    }
}
