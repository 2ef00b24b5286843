use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OperationResourceType, OperationState};

/// A tenant of the control plane. Root of the ownership graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterUser {
    pub id: String,
    pub user_name: String,
}

/// Connection details for a Kubernetes cluster, shared by managed
/// environments and GitOps engine clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCredentials {
    pub id: String,
    pub host: String,
    #[serde(skip_serializing, default)]
    pub kube_config: String,
    pub kube_config_context: String,
    #[serde(skip_serializing, default)]
    pub serviceaccount_bearer_token: String,
    pub serviceaccount_ns: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitopsEngineCluster {
    pub id: String,
    pub clustercredentials_id: String,
}

/// A GitOps engine (e.g. an Argo CD install) running in one namespace of an
/// engine cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitopsEngineInstance {
    pub id: String,
    pub namespace_name: String,
    pub namespace_uid: String,
    pub engine_cluster_id: String,
}

/// A cluster that applications are deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedEnvironment {
    pub id: String,
    pub name: String,
    pub clustercredentials_id: String,
}

/// A grant: the user may act on the (managed environment, engine instance) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAccess {
    pub user_id: String,
    pub managed_environment_id: String,
    pub gitops_engine_instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub spec_field: String,
    pub engine_instance_id: String,
    pub managed_environment_id: String,
}

/// Sync and health status reported for an application; 1:1 with `Application`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub application_id: String,
    pub health: String,
    pub sync_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An asynchronous unit of work targeting a resource on an engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub instance_id: String,
    pub resource_id: String,
    pub resource_type: OperationResourceType,
    pub state: OperationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_readable_state: Option<String>,
    pub created_on: DateTime<Utc>,
    pub last_state_update: DateTime<Utc>,
    pub owner_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentToApplicationMapping {
    pub deployment_id: String,
    pub deployment_name: String,
    pub deployment_namespace: String,
    pub namespace_uid: String,
    pub application_id: String,
}
