//! Shared data models: finding kinds, occurrences, audit results, and the
//! typed resource representation.

pub mod resource;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a single finding.
pub enum Severity {
    Error,
    Warning,
}

/// Closed enumeration of detectable misconfigurations, one value per
/// distinct check outcome. Names are also the identifiers accepted by the
/// `[checks] disabled` configuration list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    AllowPrivilegeEscalationNil,
    AllowPrivilegeEscalationTrue,
    PrivilegedNil,
    PrivilegedTrue,
    ReadOnlyRootFilesystemNil,
    ReadOnlyRootFilesystemFalse,
    RunAsNonRootNil,
    RunAsNonRootFalse,
    CapabilityNotDropped,
    CapabilityAdded,
    AutomountServiceAccountTokenTrueAndNoName,
    AutomountServiceAccountTokenNilAndNoName,
    ServiceAccountTokenDeprecated,
    AppArmorAnnotationMissing,
    AppArmorDisabled,
    SeccompAnnotationMissing,
    SeccompDisabled,
    SeccompDeprecated,
    HostNetworkTrue,
    HostIpcTrue,
    HostPidTrue,
    MissingDefaultDenyIngressNetworkPolicy,
    MissingDefaultDenyEgressNetworkPolicy,
    MissingDefaultDenyIngressAndEgressNetworkPolicy,
}

impl ErrorKind {
    pub const ALL: &'static [ErrorKind] = &[
        ErrorKind::AllowPrivilegeEscalationNil,
        ErrorKind::AllowPrivilegeEscalationTrue,
        ErrorKind::PrivilegedNil,
        ErrorKind::PrivilegedTrue,
        ErrorKind::ReadOnlyRootFilesystemNil,
        ErrorKind::ReadOnlyRootFilesystemFalse,
        ErrorKind::RunAsNonRootNil,
        ErrorKind::RunAsNonRootFalse,
        ErrorKind::CapabilityNotDropped,
        ErrorKind::CapabilityAdded,
        ErrorKind::AutomountServiceAccountTokenTrueAndNoName,
        ErrorKind::AutomountServiceAccountTokenNilAndNoName,
        ErrorKind::ServiceAccountTokenDeprecated,
        ErrorKind::AppArmorAnnotationMissing,
        ErrorKind::AppArmorDisabled,
        ErrorKind::SeccompAnnotationMissing,
        ErrorKind::SeccompDisabled,
        ErrorKind::SeccompDeprecated,
        ErrorKind::HostNetworkTrue,
        ErrorKind::HostIpcTrue,
        ErrorKind::HostPidTrue,
        ErrorKind::MissingDefaultDenyIngressNetworkPolicy,
        ErrorKind::MissingDefaultDenyEgressNetworkPolicy,
        ErrorKind::MissingDefaultDenyIngressAndEgressNetworkPolicy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::AllowPrivilegeEscalationNil => "AllowPrivilegeEscalationNil",
            ErrorKind::AllowPrivilegeEscalationTrue => "AllowPrivilegeEscalationTrue",
            ErrorKind::PrivilegedNil => "PrivilegedNil",
            ErrorKind::PrivilegedTrue => "PrivilegedTrue",
            ErrorKind::ReadOnlyRootFilesystemNil => "ReadOnlyRootFilesystemNil",
            ErrorKind::ReadOnlyRootFilesystemFalse => "ReadOnlyRootFilesystemFalse",
            ErrorKind::RunAsNonRootNil => "RunAsNonRootNil",
            ErrorKind::RunAsNonRootFalse => "RunAsNonRootFalse",
            ErrorKind::CapabilityNotDropped => "CapabilityNotDropped",
            ErrorKind::CapabilityAdded => "CapabilityAdded",
            ErrorKind::AutomountServiceAccountTokenTrueAndNoName => {
                "AutomountServiceAccountTokenTrueAndNoName"
            }
            ErrorKind::AutomountServiceAccountTokenNilAndNoName => {
                "AutomountServiceAccountTokenNilAndNoName"
            }
            ErrorKind::ServiceAccountTokenDeprecated => "ServiceAccountTokenDeprecated",
            ErrorKind::AppArmorAnnotationMissing => "AppArmorAnnotationMissing",
            ErrorKind::AppArmorDisabled => "AppArmorDisabled",
            ErrorKind::SeccompAnnotationMissing => "SeccompAnnotationMissing",
            ErrorKind::SeccompDisabled => "SeccompDisabled",
            ErrorKind::SeccompDeprecated => "SeccompDeprecated",
            ErrorKind::HostNetworkTrue => "HostNetworkTrue",
            ErrorKind::HostIpcTrue => "HostIpcTrue",
            ErrorKind::HostPidTrue => "HostPidTrue",
            ErrorKind::MissingDefaultDenyIngressNetworkPolicy => {
                "MissingDefaultDenyIngressNetworkPolicy"
            }
            ErrorKind::MissingDefaultDenyEgressNetworkPolicy => {
                "MissingDefaultDenyEgressNetworkPolicy"
            }
            ErrorKind::MissingDefaultDenyIngressAndEgressNetworkPolicy => {
                "MissingDefaultDenyIngressAndEgressNetworkPolicy"
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
/// A single detected misconfiguration on a resource.
pub struct Occurrence {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
}

impl Occurrence {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Occurrence {
            kind,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Occurrence {
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
/// Findings for one resource in one manifest file.
pub struct AuditResult {
    pub file: String,
    pub resource_kind: String,
    pub resource_name: String,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Serialize)]
/// Aggregated audit summary used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub resources: usize,
    pub files: usize,
}
