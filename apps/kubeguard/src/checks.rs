//! Security-hardening checks over decoded resources.
//!
//! Each check inspects one aspect of a resource and produces occurrences
//! with a closed `ErrorKind`. Checks never mutate; remediation lives in
//! `fix`. The network-policy check needs manifest-wide context (sibling
//! NetworkPolicy resources) and receives it via `ManifestContext`.

use crate::models::resource::{Container, PodSpec, Resource};
use crate::models::{ErrorKind, Occurrence};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

pub const APPARMOR_ANNOTATION_PREFIX: &str = "container.apparmor.security.beta.kubernetes.io/";
pub const SECCOMP_POD_ANNOTATION: &str = "seccomp.security.alpha.kubernetes.io/pod";
pub const SECCOMP_DEPRECATED_PROFILE: &str = "docker/default";

pub(crate) fn apparmor_profile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(runtime/default|localhost/.+)$").unwrap())
}

fn seccomp_profile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(runtime/default|docker/default|localhost/.+)$").unwrap())
}

/// Manifest-wide context for checks that look across resources.
pub struct ManifestContext {
    policies: Vec<PolicyInfo>,
}

struct PolicyInfo {
    namespace: Option<String>,
    denies_ingress: bool,
    denies_egress: bool,
}

impl ManifestContext {
    pub fn new(resources: &[Resource]) -> Self {
        let mut policies = Vec::new();
        for resource in resources {
            if let Resource::NetworkPolicy(np) = resource {
                let selector_empty = match &np.spec.pod_selector {
                    Value::Null => true,
                    Value::Mapping(m) => m.is_empty(),
                    _ => false,
                };
                let types = np.spec.policy_types.clone().unwrap_or_default();
                let no_ingress_rules = np.spec.ingress.as_ref().map_or(true, Vec::is_empty);
                let no_egress_rules = np.spec.egress.as_ref().map_or(true, Vec::is_empty);
                policies.push(PolicyInfo {
                    namespace: np.metadata.namespace.clone(),
                    denies_ingress: selector_empty
                        && no_ingress_rules
                        && types.iter().any(|t| t == "Ingress"),
                    denies_egress: selector_empty
                        && no_egress_rules
                        && types.iter().any(|t| t == "Egress"),
                });
            }
        }
        ManifestContext { policies }
    }

    fn default_deny(&self, namespace: &str) -> (bool, bool) {
        let mut ingress = false;
        let mut egress = false;
        for p in &self.policies {
            if p.namespace.as_deref() == Some(namespace) {
                ingress = ingress || p.denies_ingress;
                egress = egress || p.denies_egress;
            }
        }
        (ingress, egress)
    }
}

/// Run the full check catalog against one resource.
pub fn audit_resource(resource: &Resource, ctx: &ManifestContext) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    if let Some(spec) = resource.pod_spec() {
        for container in spec.all_containers() {
            check_allow_privilege_escalation(container, &mut occurrences);
            check_privileged(container, &mut occurrences);
            check_read_only_root_filesystem(container, &mut occurrences);
            check_run_as_non_root(spec, container, &mut occurrences);
            check_capabilities(container, &mut occurrences);
            check_apparmor(resource, container, &mut occurrences);
        }
        check_seccomp(resource, &mut occurrences);
        check_service_account(spec, &mut occurrences);
        check_host_namespaces(spec, &mut occurrences);
    }
    if resource.is_namespace() {
        check_network_policies(resource, ctx, &mut occurrences);
    }
    occurrences
}

fn security_context(container: &Container) -> Option<&crate::models::resource::SecurityContext> {
    container.security_context.as_ref()
}

fn check_allow_privilege_escalation(container: &Container, out: &mut Vec<Occurrence>) {
    match security_context(container).and_then(|sc| sc.allow_privilege_escalation) {
        None => out.push(Occurrence::error(
            ErrorKind::AllowPrivilegeEscalationNil,
            format!(
                "allowPrivilegeEscalation not set for container '{}', set it to false",
                container.name
            ),
        )),
        Some(true) => out.push(Occurrence::error(
            ErrorKind::AllowPrivilegeEscalationTrue,
            format!(
                "allowPrivilegeEscalation set to true for container '{}', set it to false",
                container.name
            ),
        )),
        Some(false) => {}
    }
}

fn check_privileged(container: &Container, out: &mut Vec<Occurrence>) {
    match security_context(container).and_then(|sc| sc.privileged) {
        None => out.push(Occurrence::warning(
            ErrorKind::PrivilegedNil,
            format!(
                "privileged not set for container '{}', defaults allowed, set it to false",
                container.name
            ),
        )),
        Some(true) => out.push(Occurrence::error(
            ErrorKind::PrivilegedTrue,
            format!(
                "privileged set to true for container '{}', set it to false",
                container.name
            ),
        )),
        Some(false) => {}
    }
}

fn check_read_only_root_filesystem(container: &Container, out: &mut Vec<Occurrence>) {
    match security_context(container).and_then(|sc| sc.read_only_root_filesystem) {
        None => out.push(Occurrence::error(
            ErrorKind::ReadOnlyRootFilesystemNil,
            format!(
                "readOnlyRootFilesystem not set for container '{}' which results in a writable rootFS, set it to true",
                container.name
            ),
        )),
        Some(false) => out.push(Occurrence::error(
            ErrorKind::ReadOnlyRootFilesystemFalse,
            format!(
                "readOnlyRootFilesystem set to false for container '{}', set it to true",
                container.name
            ),
        )),
        Some(true) => {}
    }
}

fn check_run_as_non_root(spec: &PodSpec, container: &Container, out: &mut Vec<Occurrence>) {
    let pod_level = spec.security_context.as_ref().and_then(|sc| sc.run_as_non_root);
    let container_level = security_context(container).and_then(|sc| sc.run_as_non_root);
    match container_level.or(pod_level) {
        None => out.push(Occurrence::error(
            ErrorKind::RunAsNonRootNil,
            format!(
                "runAsNonRoot not set for container '{}', the container may run as root",
                container.name
            ),
        )),
        Some(false) => out.push(Occurrence::error(
            ErrorKind::RunAsNonRootFalse,
            format!(
                "runAsNonRoot set to false for container '{}', set it to true",
                container.name
            ),
        )),
        Some(true) => {}
    }
}

fn check_capabilities(container: &Container, out: &mut Vec<Occurrence>) {
    let caps = security_context(container).and_then(|sc| sc.capabilities.as_ref());
    let dropped_all = caps
        .and_then(|c| c.drop.as_ref())
        .map_or(false, |d| d.iter().any(|c| c == "ALL"));
    if !dropped_all {
        out.push(Occurrence::error(
            ErrorKind::CapabilityNotDropped,
            format!(
                "capability ALL not dropped for container '{}', add ALL to the drop list",
                container.name
            ),
        ));
    }
    if let Some(added) = caps.and_then(|c| c.add.as_ref()) {
        if !added.is_empty() {
            out.push(Occurrence::error(
                ErrorKind::CapabilityAdded,
                format!(
                    "capabilities added for container '{}': {}",
                    container.name,
                    added.join(", ")
                ),
            ));
        }
    }
}

fn check_apparmor(resource: &Resource, container: &Container, out: &mut Vec<Occurrence>) {
    let key = format!("{}{}", APPARMOR_ANNOTATION_PREFIX, container.name);
    match resource.pod_annotations().and_then(|a| a.get(&key)) {
        None => out.push(Occurrence::error(
            ErrorKind::AppArmorAnnotationMissing,
            format!(
                "AppArmor annotation missing for container '{}', add '{}: runtime/default'",
                container.name, key
            ),
        )),
        Some(profile) if !apparmor_profile_re().is_match(profile) => {
            out.push(Occurrence::error(
                ErrorKind::AppArmorDisabled,
                format!(
                    "AppArmor disabled for container '{}' (profile '{}')",
                    container.name, profile
                ),
            ))
        }
        Some(_) => {}
    }
}

fn check_seccomp(resource: &Resource, out: &mut Vec<Occurrence>) {
    match resource
        .pod_annotations()
        .and_then(|a| a.get(SECCOMP_POD_ANNOTATION))
    {
        None => out.push(Occurrence::error(
            ErrorKind::SeccompAnnotationMissing,
            format!(
                "seccomp annotation missing, add '{}: runtime/default'",
                SECCOMP_POD_ANNOTATION
            ),
        )),
        Some(profile) if profile == SECCOMP_DEPRECATED_PROFILE => {
            out.push(Occurrence::warning(
                ErrorKind::SeccompDeprecated,
                "seccomp profile docker/default is deprecated, use runtime/default",
            ))
        }
        Some(profile) if !seccomp_profile_re().is_match(profile) => {
            out.push(Occurrence::error(
                ErrorKind::SeccompDisabled,
                format!("seccomp disabled (profile '{}')", profile),
            ))
        }
        Some(_) => {}
    }
}

fn check_service_account(spec: &PodSpec, out: &mut Vec<Occurrence>) {
    if spec.service_account.is_some() {
        out.push(Occurrence::warning(
            ErrorKind::ServiceAccountTokenDeprecated,
            "serviceAccount is deprecated, use serviceAccountName instead",
        ));
    }
    let has_name = spec.service_account_name.is_some();
    match spec.automount_service_account_token {
        Some(true) if !has_name => out.push(Occurrence::error(
            ErrorKind::AutomountServiceAccountTokenTrueAndNoName,
            "automountServiceAccountToken is true with no serviceAccountName, the default service account token is mounted",
        )),
        None if !has_name => out.push(Occurrence::warning(
            ErrorKind::AutomountServiceAccountTokenNilAndNoName,
            "automountServiceAccountToken not set with no serviceAccountName, set it to false",
        )),
        _ => {}
    }
}

fn check_host_namespaces(spec: &PodSpec, out: &mut Vec<Occurrence>) {
    if spec.host_network == Some(true) {
        out.push(Occurrence::error(
            ErrorKind::HostNetworkTrue,
            "hostNetwork set to true, the pod shares the host network namespace",
        ));
    }
    if spec.host_ipc == Some(true) {
        out.push(Occurrence::error(
            ErrorKind::HostIpcTrue,
            "hostIPC set to true, the pod shares the host IPC namespace",
        ));
    }
    if spec.host_pid == Some(true) {
        out.push(Occurrence::error(
            ErrorKind::HostPidTrue,
            "hostPID set to true, the pod shares the host PID namespace",
        ));
    }
}

fn check_network_policies(resource: &Resource, ctx: &ManifestContext, out: &mut Vec<Occurrence>) {
    let namespace = resource.name();
    if namespace.is_empty() {
        return;
    }
    let (ingress, egress) = ctx.default_deny(namespace);
    match (ingress, egress) {
        (false, false) => out.push(Occurrence::error(
            ErrorKind::MissingDefaultDenyIngressAndEgressNetworkPolicy,
            format!(
                "namespace '{}' has no default-deny NetworkPolicy for ingress and egress",
                namespace
            ),
        )),
        (false, true) => out.push(Occurrence::error(
            ErrorKind::MissingDefaultDenyIngressNetworkPolicy,
            format!("namespace '{}' has no default-deny ingress NetworkPolicy", namespace),
        )),
        (true, false) => out.push(Occurrence::error(
            ErrorKind::MissingDefaultDenyEgressNetworkPolicy,
            format!("namespace '{}' has no default-deny egress NetworkPolicy", namespace),
        )),
        (true, true) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn decode(doc: &str) -> Resource {
        crate::manifest::decode_resource("test.yaml", doc).unwrap()
    }

    fn empty_ctx() -> ManifestContext {
        ManifestContext::new(&[])
    }

    const HARDENED_POD: &str = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
  annotations:
    container.apparmor.security.beta.kubernetes.io/app: runtime/default
    seccomp.security.alpha.kubernetes.io/pod: runtime/default
spec:
  serviceAccountName: web
  automountServiceAccountToken: false
  containers:
  - name: app
    securityContext:
      allowPrivilegeEscalation: false
      privileged: false
      readOnlyRootFilesystem: true
      runAsNonRoot: true
      capabilities:
        drop:
        - ALL
";

    #[test]
    fn test_hardened_pod_has_no_findings() {
        let occ = audit_resource(&decode(HARDENED_POD), &empty_ctx());
        assert!(occ.is_empty(), "unexpected findings: {:?}", occ);
    }

    #[test]
    fn test_bare_pod_reports_all_container_findings() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
";
        let occ = audit_resource(&decode(pod), &empty_ctx());
        let kinds: Vec<_> = occ.iter().map(|o| o.kind).collect();
        assert!(kinds.contains(&ErrorKind::AllowPrivilegeEscalationNil));
        assert!(kinds.contains(&ErrorKind::PrivilegedNil));
        assert!(kinds.contains(&ErrorKind::ReadOnlyRootFilesystemNil));
        assert!(kinds.contains(&ErrorKind::RunAsNonRootNil));
        assert!(kinds.contains(&ErrorKind::CapabilityNotDropped));
        assert!(kinds.contains(&ErrorKind::AppArmorAnnotationMissing));
        assert!(kinds.contains(&ErrorKind::SeccompAnnotationMissing));
        assert!(kinds.contains(&ErrorKind::AutomountServiceAccountTokenNilAndNoName));
    }

    #[test]
    fn test_pod_level_run_as_non_root_covers_containers() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  securityContext:
    runAsNonRoot: true
  containers:
  - name: app
";
        let occ = audit_resource(&decode(pod), &empty_ctx());
        assert!(!occ.iter().any(|o| o.kind == ErrorKind::RunAsNonRootNil));
    }

    #[test]
    fn test_host_namespace_flags() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  hostNetwork: true
  hostPID: true
  containers:
  - name: app
";
        let occ = audit_resource(&decode(pod), &empty_ctx());
        let kinds: Vec<_> = occ.iter().map(|o| o.kind).collect();
        assert!(kinds.contains(&ErrorKind::HostNetworkTrue));
        assert!(kinds.contains(&ErrorKind::HostPidTrue));
        assert!(!kinds.contains(&ErrorKind::HostIpcTrue));
    }

    #[test]
    fn test_capability_added_lists_capabilities() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
    securityContext:
      capabilities:
        add:
        - NET_ADMIN
        drop:
        - ALL
";
        let occ = audit_resource(&decode(pod), &empty_ctx());
        let added = occ
            .iter()
            .find(|o| o.kind == ErrorKind::CapabilityAdded)
            .unwrap();
        assert!(added.message.contains("NET_ADMIN"));
        assert!(!occ.iter().any(|o| o.kind == ErrorKind::CapabilityNotDropped));
    }

    #[test]
    fn test_deprecated_service_account_is_a_warning() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  serviceAccount: legacy
  containers:
  - name: app
";
        let occ = audit_resource(&decode(pod), &empty_ctx());
        let dep = occ
            .iter()
            .find(|o| o.kind == ErrorKind::ServiceAccountTokenDeprecated)
            .unwrap();
        assert_eq!(dep.severity, Severity::Warning);
    }

    #[test]
    fn test_seccomp_profiles() {
        let with_profile = |profile: &str| {
            format!(
                "\
apiVersion: v1
kind: Pod
metadata:
  name: web
  annotations:
    seccomp.security.alpha.kubernetes.io/pod: {}
spec:
  containers:
  - name: app
",
                profile
            )
        };
        let occ = audit_resource(&decode(&with_profile("unconfined")), &empty_ctx());
        assert!(occ.iter().any(|o| o.kind == ErrorKind::SeccompDisabled));
        let occ = audit_resource(&decode(&with_profile("docker/default")), &empty_ctx());
        assert!(occ.iter().any(|o| o.kind == ErrorKind::SeccompDeprecated));
        let occ = audit_resource(&decode(&with_profile("localhost/custom")), &empty_ctx());
        assert!(!occ.iter().any(|o| {
            o.kind == ErrorKind::SeccompDisabled || o.kind == ErrorKind::SeccompDeprecated
        }));
    }

    #[test]
    fn test_namespace_missing_default_deny() {
        let ns = "\
apiVersion: v1
kind: Namespace
metadata:
  name: prod
";
        let occ = audit_resource(&decode(ns), &empty_ctx());
        assert!(occ
            .iter()
            .any(|o| o.kind == ErrorKind::MissingDefaultDenyIngressAndEgressNetworkPolicy));
    }

    #[test]
    fn test_namespace_with_default_deny_policy_passes() {
        let ns = decode(
            "\
apiVersion: v1
kind: Namespace
metadata:
  name: prod
",
        );
        let np = decode(
            "\
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: default-deny
  namespace: prod
spec:
  podSelector: {}
  policyTypes:
  - Ingress
  - Egress
",
        );
        let ctx = ManifestContext::new(&[ns.clone(), np]);
        let occ = audit_resource(&ns, &ctx);
        assert!(occ.is_empty(), "unexpected findings: {:?}", occ);
    }

    #[test]
    fn test_namespace_with_ingress_only_deny_reports_egress() {
        let ns = decode(
            "\
apiVersion: v1
kind: Namespace
metadata:
  name: prod
",
        );
        let np = decode(
            "\
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: deny-ingress
  namespace: prod
spec:
  podSelector: {}
  policyTypes:
  - Ingress
",
        );
        let ctx = ManifestContext::new(&[ns.clone(), np]);
        let occ = audit_resource(&ns, &ctx);
        assert!(occ
            .iter()
            .any(|o| o.kind == ErrorKind::MissingDefaultDenyEgressNetworkPolicy));
    }
}
