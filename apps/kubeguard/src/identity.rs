//! Identity rules for matching sequence items across two versions of the
//! same resource.
//!
//! Kubernetes array fields are semantically keyed by a sub-field (most
//! commonly `name`), but the key differs per field and occasionally per
//! parent shape. The resolver is a closed, auditable table for the common
//! case plus a small set of named special-case handlers for fields whose
//! identifying key is ambiguous or nested, falling back to full structural
//! equality for items with no natural identity (ID ranges, tolerations,
//! host port ranges).
//!
//! Identity is used only during merge; structural equality (`deep_equal`)
//! is positional and never consults these rules.

use crate::yaml::{deep_equal, equal_value_for_key, find_entry_str, Entry, Item, Tree};

/// Sequence field name -> identifying sub-key, for fields whose identity
/// is a single flat key on the item.
const IDENTIFYING_KEY: &[(&str, &str)] = &[
    ("allowedFlexVolumes", "driver"),       // PodSecurityPolicySpec.allowedFlexVolumes
    ("allowedHostPaths", "pathPrefix"),     // PodSecurityPolicySpec.allowedHostPaths
    ("allowedTopologies", "matchLabelExpressions"), // StorageClass.allowedTopologies
    ("clusterRoleSelectors", "matchExpressions"), // AggregationRule.clusterRoleSelectors
    ("containers", "name"),                 // PodSpec.containers
    ("egress", "ports"),                    // NetworkPolicySpec.egress
    ("env", "name"),                        // Container.env
    ("hostAliases", "ip"),                  // PodSpec.hostAliases
    // Assumes a header name cannot be repeated with different values;
    // the API does not document whether that restriction holds.
    ("httpHeaders", "name"),                // HTTPGetAction.httpHeaders
    ("imagePullSecrets", "name"),           // PodSpec / ServiceAccount
    ("initContainers", "name"),             // PodSpec.initContainers
    ("matchExpressions", "key"),            // LabelSelector / NodeSelectorTerm
    ("matchFields", "key"),                 // NodeSelectorTerm.matchFields
    ("matchLabelExpressions", "key"),       // TopologySelectorTerm
    ("options", "name"),                    // PodDNSConfig.options
    ("pending", "name"),                    // Initializers.pending
    ("readinessGates", "conditionType"),    // PodSpec.readinessGates
    // PodAffinity / PodAntiAffinity required terms
    ("requiredDuringSchedulingIgnoredDuringExecution", "labelSelector"),
    ("secrets", "name"),                    // ServiceAccount.secrets
    ("subjects", "name"),                   // RoleBinding / ClusterRoleBinding
    ("subsets", "addresses"),               // Endpoints.subsets
    ("sysctls", "name"),                    // PodSecurityContext.sysctls
    ("taints", "key"),                      // NodeSpec.taints
    ("volumeDevices", "devicePath"),        // Container.volumeDevices
    ("volumeMounts", "mountPath"),          // Container.volumeMounts
    ("volumes", "name"),                    // PodSpec.volumes
];

/// Returns true if two sequence items denote the same logical entity.
/// `sequence_key` is the mapping key whose value is the sequence both
/// items belong to.
pub fn identity_match(sequence_key: &str, item_a: &Item, item_b: &Item) -> bool {
    let (va, vb) = match (item_a.value.as_ref(), item_b.value.as_ref()) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    if let (Tree::Scalar(a), Tree::Scalar(b)) = (va, vb) {
        return a == b;
    }
    let (m1, m2) = match (va.as_mapping(), vb.as_mapping()) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    match sequence_key {
        // EndpointSubset addresses: hostname or ip
        "addresses" | "notReadyAddresses" => {
            equal_value_for_key("hostname", m1, m2) || equal_value_for_key("ip", m1, m2)
        }

        // EnvFromSource: configMapRef.name or secretRef.name
        "envFrom" => {
            for source in ["configMapRef", "secretRef"] {
                if let Some(matched) = nested_match(m1, m2, source, "name") {
                    if matched {
                        return true;
                    }
                }
            }
            false
        }

        // NetworkPolicyIngressRule: ports or from
        "ingress" => {
            equal_value_for_key("ports", m1, m2) || equal_value_for_key("from", m1, m2)
        }

        // KeyToPath.key (configMap/secret volumes) or
        // DownwardAPIVolumeFile.path
        "items" => equal_value_for_key("key", m1, m2) || equal_value_for_key("path", m1, m2),

        // NodeSelectorTerm: only an exact match on the complex value of
        // matchExpressions or matchFields counts.
        "nodeSelectorTerms" => {
            equal_value_for_key("matchExpressions", m1, m2)
                || equal_value_for_key("matchFields", m1, m2)
        }

        // OwnerReference: uid or name
        "ownerReferences" => {
            equal_value_for_key("uid", m1, m2) || equal_value_for_key("name", m1, m2)
        }

        // The same field name covers PreferredSchedulingTerm (preference)
        // and WeightedPodAffinityTerm (podAffinityTerm); the weight field
        // may be updated freely.
        "preferredDuringSchedulingIgnoredDuringExecution" => {
            equal_value_for_key("preference", m1, m2)
                || equal_value_for_key("podAffinityTerm", m1, m2)
        }

        // ContainerPort.containerPort, or EndpointPort/ServicePort.port
        "ports" => {
            equal_value_for_key("containerPort", m1, m2) || equal_value_for_key("port", m1, m2)
        }

        // PolicyRule.resources (Role/ClusterRole) or IngressRule.host;
        // other rule shapes fall through to structural equality.
        "rules" => {
            if equal_value_for_key("resources", m1, m2) {
                return true;
            }
            if equal_value_for_key("host", m1, m2) {
                return true;
            }
            deep_equal(va, vb)
        }

        // VolumeProjection: keyed by whichever source kind the item uses
        "sources" => {
            for (source, inner) in [
                ("configMap", "name"),
                ("downwardAPI", "items"),
                ("secret", "name"),
                ("serviceAccountToken", "path"),
            ] {
                if let Some(matched) = nested_match(m1, m2, source, inner) {
                    return matched;
                }
            }
            false
        }

        // IngressTLS: secretName or hosts
        "tls" => {
            equal_value_for_key("secretName", m1, m2) || equal_value_for_key("hosts", m1, m2)
        }

        // PersistentVolumeClaim templates: metadata.name
        "volumeClaimTemplates" => nested_match(m1, m2, "metadata", "name").unwrap_or(false),

        _ => {
            if let Some((_, id_key)) = IDENTIFYING_KEY.iter().find(|(k, _)| *k == sequence_key) {
                return equal_value_for_key(id_key, m1, m2);
            }
            // No natural identity (ID ranges, tolerations, host port
            // ranges): full structural equality.
            deep_equal(va, vb)
        }
    }
}

/// Look up `outer` in both mappings; when the first side carries it,
/// returns whether both sides carry it as a mapping with an equal value
/// for `inner`. Returns None when the first side lacks `outer`.
fn nested_match(m1: &[Entry], m2: &[Entry], outer: &str, inner: &str) -> Option<bool> {
    let v1 = find_entry_str(m1, outer)?;
    let n1 = v1.value.as_ref()?.as_mapping()?;
    let matched = find_entry_str(m2, outer)
        .and_then(|v2| v2.value.as_ref())
        .and_then(|t| t.as_mapping())
        .map_or(false, |n2| equal_value_for_key(inner, n1, n2));
    Some(matched)
}
