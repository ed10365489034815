//! Typed resource representation for the supported Kubernetes kinds.
//!
//! Only the fields the checks and remediations touch are modeled; every
//! other field is captured through a flattened map so that re-encoding a
//! fixed resource never drops user data. The merge step restores the
//! original key order afterwards, so the flattened map's sorted order is
//! not visible in final output.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Workload kinds that embed a pod template under `spec.template`.
pub const WORKLOAD_KINDS: &[&str] = &[
    "Deployment",
    "ReplicationController",
    "StatefulSet",
    "DaemonSet",
    "Job",
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_root_filesystem: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automount_service_account_token: Option<bool>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default, rename = "hostIPC", skip_serializing_if = "Option::is_none")]
    pub host_ipc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_network: Option<bool>,
    #[serde(default, rename = "hostPID", skip_serializing_if = "Option::is_none")]
    pub host_pid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_containers: Option<Vec<Container>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PodSpec {
    /// All containers, init containers included.
    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.containers
            .iter()
            .chain(self.init_containers.iter().flatten())
    }

    pub fn all_containers_mut(&mut self) -> impl Iterator<Item = &mut Container> {
        self.containers
            .iter_mut()
            .chain(self.init_containers.iter_mut().flatten())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    pub template: PodTemplateSpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Any workload kind with a pod template (Deployment, StatefulSet, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn empty_selector() -> Value {
    Value::Mapping(Default::default())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPolicySpec {
    #[serde(default = "empty_selector")]
    pub pod_selector: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPolicy {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: NetworkPolicySpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NetworkPolicy {
    /// A default-deny policy for the given namespace and policy types.
    pub fn default_deny(namespace: &str, policy_types: &[&str]) -> Self {
        NetworkPolicy {
            api_version: "networking.k8s.io/v1".to_string(),
            kind: "NetworkPolicy".to_string(),
            metadata: ObjectMeta {
                name: Some(format!("default-deny-{}", namespace)),
                namespace: Some(namespace.to_string()),
                annotations: None,
                extra: BTreeMap::new(),
            },
            spec: NetworkPolicySpec {
                pod_selector: empty_selector(),
                policy_types: Some(policy_types.iter().map(|s| s.to_string()).collect()),
                ingress: None,
                egress: None,
                extra: BTreeMap::new(),
            },
            extra: BTreeMap::new(),
        }
    }
}

/// One decoded resource from a manifest document.
#[derive(Clone, Debug)]
pub enum Resource {
    Pod(Box<Pod>),
    Workload(Box<Workload>),
    Namespace(Box<Namespace>),
    NetworkPolicy(Box<NetworkPolicy>),
    Unsupported(Box<Value>),
}

impl Resource {
    pub fn kind(&self) -> &str {
        match self {
            Resource::Pod(p) => &p.kind,
            Resource::Workload(w) => &w.kind,
            Resource::Namespace(n) => &n.kind,
            Resource::NetworkPolicy(np) => &np.kind,
            Resource::Unsupported(v) => v
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("Unknown"),
        }
    }

    pub fn name(&self) -> &str {
        let name = match self {
            Resource::Pod(p) => p.metadata.name.as_deref(),
            Resource::Workload(w) => w.metadata.name.as_deref(),
            Resource::Namespace(n) => n.metadata.name.as_deref(),
            Resource::NetworkPolicy(np) => np.metadata.name.as_deref(),
            Resource::Unsupported(v) => v
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(Value::as_str),
        };
        name.unwrap_or("")
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Resource::Pod(p) => p.metadata.namespace.as_deref(),
            Resource::Workload(w) => w.metadata.namespace.as_deref(),
            Resource::Namespace(n) => n.metadata.name.as_deref(),
            Resource::NetworkPolicy(np) => np.metadata.namespace.as_deref(),
            Resource::Unsupported(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Resource::Unsupported(_))
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, Resource::Namespace(_))
    }

    /// The pod spec subject to container-level checks, if this kind has one.
    pub fn pod_spec(&self) -> Option<&PodSpec> {
        match self {
            Resource::Pod(p) => Some(&p.spec),
            Resource::Workload(w) => Some(&w.spec.template.spec),
            _ => None,
        }
    }

    pub fn pod_spec_mut(&mut self) -> Option<&mut PodSpec> {
        match self {
            Resource::Pod(p) => Some(&mut p.spec),
            Resource::Workload(w) => Some(&mut w.spec.template.spec),
            _ => None,
        }
    }

    /// Annotations on the pod (pod metadata for a Pod, template metadata
    /// for a workload).
    pub fn pod_annotations(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Resource::Pod(p) => p.metadata.annotations.as_ref(),
            Resource::Workload(w) => w
                .spec
                .template
                .metadata
                .as_ref()
                .and_then(|m| m.annotations.as_ref()),
            _ => None,
        }
    }

    /// Mutable pod annotations, creating the map (and template metadata)
    /// when absent. None for kinds without a pod.
    pub fn pod_annotations_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match self {
            Resource::Pod(p) => Some(p.metadata.annotations.get_or_insert_with(BTreeMap::new)),
            Resource::Workload(w) => {
                let meta = w
                    .spec
                    .template
                    .metadata
                    .get_or_insert_with(ObjectMeta::default);
                Some(meta.annotations.get_or_insert_with(BTreeMap::new))
            }
            _ => None,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        match self {
            Resource::Pod(p) => serde_yaml::to_string(p),
            Resource::Workload(w) => serde_yaml::to_string(w),
            Resource::Namespace(n) => serde_yaml::to_string(n),
            Resource::NetworkPolicy(np) => serde_yaml::to_string(np),
            Resource::Unsupported(v) => serde_yaml::to_string(v),
        }
    }
}
