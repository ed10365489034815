//! Remediation dispatch.
//!
//! Every `ErrorKind` maps to a `Remediation`: the structural preconditions
//! it needs plus an apply function that enforces the hardened state on the
//! resource. Apply functions enforce rather than toggle, so running a fix
//! twice, or running fixes in any order, lands on the same resource. A fix
//! may also emit an auxiliary resource (a default-deny NetworkPolicy for a
//! flagged Namespace).

use crate::checks::{APPARMOR_ANNOTATION_PREFIX, SECCOMP_POD_ANNOTATION};
use crate::models::resource::{Capabilities, NetworkPolicy, Resource, SecurityContext};
use crate::models::{ErrorKind, Occurrence};
use std::collections::HashSet;

/// Structure a fix needs materialized before it can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precondition {
    /// Every container has a `securityContext` mapping.
    SecurityContext,
    /// Every container security context has a `capabilities` mapping.
    Capabilities,
}

/// One remediation: what it needs, and what it does.
pub struct Remediation {
    pub preconditions: &'static [Precondition],
    pub apply: fn(&mut Resource, &Occurrence) -> Option<Resource>,
}

const SC: &[Precondition] = &[Precondition::SecurityContext];
const CAPS: &[Precondition] = &[Precondition::SecurityContext, Precondition::Capabilities];
const NONE: &[Precondition] = &[];

/// The remediation for a given finding kind.
pub fn remediation_for(kind: ErrorKind) -> Remediation {
    match kind {
        ErrorKind::AllowPrivilegeEscalationNil | ErrorKind::AllowPrivilegeEscalationTrue => {
            Remediation {
                preconditions: SC,
                apply: fix_allow_privilege_escalation,
            }
        }
        ErrorKind::PrivilegedNil | ErrorKind::PrivilegedTrue => Remediation {
            preconditions: SC,
            apply: fix_privileged,
        },
        ErrorKind::ReadOnlyRootFilesystemNil | ErrorKind::ReadOnlyRootFilesystemFalse => {
            Remediation {
                preconditions: SC,
                apply: fix_read_only_root_filesystem,
            }
        }
        ErrorKind::RunAsNonRootNil | ErrorKind::RunAsNonRootFalse => Remediation {
            preconditions: SC,
            apply: fix_run_as_non_root,
        },
        ErrorKind::CapabilityNotDropped => Remediation {
            preconditions: CAPS,
            apply: fix_capability_not_dropped,
        },
        ErrorKind::CapabilityAdded => Remediation {
            preconditions: NONE,
            apply: fix_capability_added,
        },
        ErrorKind::AutomountServiceAccountTokenTrueAndNoName
        | ErrorKind::AutomountServiceAccountTokenNilAndNoName => Remediation {
            preconditions: NONE,
            apply: fix_automount_service_account_token,
        },
        ErrorKind::ServiceAccountTokenDeprecated => Remediation {
            preconditions: NONE,
            apply: fix_deprecated_service_account,
        },
        ErrorKind::AppArmorAnnotationMissing | ErrorKind::AppArmorDisabled => Remediation {
            preconditions: NONE,
            apply: fix_apparmor,
        },
        ErrorKind::SeccompAnnotationMissing
        | ErrorKind::SeccompDisabled
        | ErrorKind::SeccompDeprecated => Remediation {
            preconditions: NONE,
            apply: fix_seccomp,
        },
        ErrorKind::HostNetworkTrue => Remediation {
            preconditions: NONE,
            apply: fix_host_network,
        },
        ErrorKind::HostIpcTrue => Remediation {
            preconditions: NONE,
            apply: fix_host_ipc,
        },
        ErrorKind::HostPidTrue => Remediation {
            preconditions: NONE,
            apply: fix_host_pid,
        },
        ErrorKind::MissingDefaultDenyIngressNetworkPolicy => Remediation {
            preconditions: NONE,
            apply: fix_missing_default_deny_ingress,
        },
        ErrorKind::MissingDefaultDenyEgressNetworkPolicy => Remediation {
            preconditions: NONE,
            apply: fix_missing_default_deny_egress,
        },
        ErrorKind::MissingDefaultDenyIngressAndEgressNetworkPolicy => Remediation {
            preconditions: NONE,
            apply: fix_missing_default_deny_both,
        },
    }
}

/// Materialize every structure the pending fixes need, before any of them
/// runs. Doing this up front keeps the apply functions simple.
pub fn prepare_resource_for_fix(resource: &mut Resource, occurrences: &[Occurrence]) {
    let needed: HashSet<Precondition> = occurrences
        .iter()
        .flat_map(|o| remediation_for(o.kind).preconditions.iter().copied())
        .collect();
    if needed.is_empty() {
        return;
    }
    if let Some(spec) = resource.pod_spec_mut() {
        for container in spec.all_containers_mut() {
            if needed.contains(&Precondition::SecurityContext) {
                let sc = container
                    .security_context
                    .get_or_insert_with(SecurityContext::default);
                if needed.contains(&Precondition::Capabilities) {
                    sc.capabilities.get_or_insert_with(Capabilities::default);
                }
            }
        }
    }
}

/// Apply every pending fix to the resource. Returns the auxiliary
/// resources the fixes created.
pub fn fix_resource(resource: &mut Resource, occurrences: &[Occurrence]) -> Vec<Resource> {
    prepare_resource_for_fix(resource, occurrences);
    let mut aux = Vec::new();
    for occurrence in occurrences {
        if let Some(created) = (remediation_for(occurrence.kind).apply)(resource, occurrence) {
            aux.push(created);
        }
    }
    aux
}

fn for_each_security_context(resource: &mut Resource, f: impl Fn(&mut SecurityContext)) {
    if let Some(spec) = resource.pod_spec_mut() {
        for container in spec.all_containers_mut() {
            if let Some(sc) = container.security_context.as_mut() {
                f(sc);
            }
        }
    }
}

fn fix_allow_privilege_escalation(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    for_each_security_context(resource, |sc| sc.allow_privilege_escalation = Some(false));
    None
}

fn fix_privileged(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    for_each_security_context(resource, |sc| sc.privileged = Some(false));
    None
}

fn fix_read_only_root_filesystem(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    for_each_security_context(resource, |sc| sc.read_only_root_filesystem = Some(true));
    None
}

fn fix_run_as_non_root(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    let pod_level = resource
        .pod_spec()
        .and_then(|s| s.security_context.as_ref())
        .and_then(|sc| sc.run_as_non_root);
    if pod_level == Some(true) {
        // Containers inherit the pod-level setting unless they override it
        // with false, so clearing a false override is enough.
        for_each_security_context(resource, |sc| {
            if sc.run_as_non_root == Some(false) {
                sc.run_as_non_root = Some(true);
            }
        });
    } else {
        for_each_security_context(resource, |sc| sc.run_as_non_root = Some(true));
    }
    None
}

fn fix_capability_not_dropped(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    for_each_security_context(resource, |sc| {
        if let Some(caps) = sc.capabilities.as_mut() {
            let drop = caps.drop.get_or_insert_with(Vec::new);
            if !drop.iter().any(|c| c == "ALL") {
                drop.push("ALL".to_string());
            }
        }
    });
    None
}

fn fix_capability_added(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    for_each_security_context(resource, |sc| {
        if let Some(caps) = sc.capabilities.as_mut() {
            caps.add = None;
        }
    });
    None
}

fn fix_automount_service_account_token(
    resource: &mut Resource,
    _: &Occurrence,
) -> Option<Resource> {
    if let Some(spec) = resource.pod_spec_mut() {
        spec.automount_service_account_token = Some(false);
    }
    None
}

fn fix_deprecated_service_account(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    if let Some(spec) = resource.pod_spec_mut() {
        if let Some(name) = spec.service_account.take() {
            if spec.service_account_name.is_none() {
                spec.service_account_name = Some(name);
            }
        }
    }
    None
}

fn fix_apparmor(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    let names: Vec<String> = match resource.pod_spec() {
        Some(spec) => spec.all_containers().map(|c| c.name.clone()).collect(),
        None => return None,
    };
    if let Some(annotations) = resource.pod_annotations_mut() {
        for name in names {
            let key = format!("{}{}", APPARMOR_ANNOTATION_PREFIX, name);
            let valid = annotations
                .get(&key)
                .map_or(false, |p| crate::checks::apparmor_profile_re().is_match(p));
            if !valid {
                annotations.insert(key, "runtime/default".to_string());
            }
        }
    }
    None
}

fn fix_seccomp(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    if let Some(annotations) = resource.pod_annotations_mut() {
        annotations.insert(
            SECCOMP_POD_ANNOTATION.to_string(),
            "runtime/default".to_string(),
        );
    }
    None
}

fn fix_host_network(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    if let Some(spec) = resource.pod_spec_mut() {
        spec.host_network = Some(false);
    }
    None
}

fn fix_host_ipc(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    if let Some(spec) = resource.pod_spec_mut() {
        spec.host_ipc = Some(false);
    }
    None
}

fn fix_host_pid(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    if let Some(spec) = resource.pod_spec_mut() {
        spec.host_pid = Some(false);
    }
    None
}

fn default_deny_for(resource: &Resource, policy_types: &[&str]) -> Option<Resource> {
    let namespace = resource.name();
    if namespace.is_empty() {
        return None;
    }
    Some(Resource::NetworkPolicy(Box::new(NetworkPolicy::default_deny(
        namespace,
        policy_types,
    ))))
}

fn fix_missing_default_deny_ingress(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    default_deny_for(resource, &["Ingress"])
}

fn fix_missing_default_deny_egress(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    default_deny_for(resource, &["Egress"])
}

fn fix_missing_default_deny_both(resource: &mut Resource, _: &Occurrence) -> Option<Resource> {
    default_deny_for(resource, &["Ingress", "Egress"])
}
