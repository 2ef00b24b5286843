mod checked;
pub mod maintenance;
pub mod ownership;
mod schema;
mod sqlite;

pub use ownership::Resource;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the unchecked database interface.
///
/// Nothing here consults `ClusterAccess`. These operations are meant for
/// privileged callers, maintenance tooling and test fixtures; tenant-facing
/// code goes through [`CheckedStore`].
///
/// Deletes return the number of rows affected: 0 when nothing matched, which
/// is not an error.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Cluster user operations
    fn create_cluster_user(&self, user: &ClusterUser) -> Result<()>;
    fn get_cluster_user_by_id(&self, id: &str) -> Result<ClusterUser>;
    fn delete_cluster_user_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_cluster_users(&self) -> Result<Vec<ClusterUser>>;

    // Cluster credentials operations
    fn create_cluster_credentials(&self, creds: &ClusterCredentials) -> Result<()>;
    fn get_cluster_credentials_by_id(&self, id: &str) -> Result<ClusterCredentials>;
    fn delete_cluster_credentials_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_cluster_credentials(&self) -> Result<Vec<ClusterCredentials>>;

    // GitOps engine cluster operations
    fn create_gitops_engine_cluster(&self, cluster: &GitopsEngineCluster) -> Result<()>;
    fn get_gitops_engine_cluster_by_id(&self, id: &str) -> Result<GitopsEngineCluster>;
    fn delete_gitops_engine_cluster_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_gitops_engine_clusters(&self) -> Result<Vec<GitopsEngineCluster>>;

    // GitOps engine instance operations
    fn create_gitops_engine_instance(&self, instance: &GitopsEngineInstance) -> Result<()>;
    fn get_gitops_engine_instance_by_id(&self, id: &str) -> Result<GitopsEngineInstance>;
    fn delete_gitops_engine_instance_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_gitops_engine_instances(&self) -> Result<Vec<GitopsEngineInstance>>;

    // Managed environment operations
    fn create_managed_environment(&self, env: &ManagedEnvironment) -> Result<()>;
    fn get_managed_environment_by_id(&self, id: &str) -> Result<ManagedEnvironment>;
    fn delete_managed_environment_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_managed_environments(&self) -> Result<Vec<ManagedEnvironment>>;

    // Cluster access (grant) operations, keyed by (user, environment, instance)
    fn create_cluster_access(&self, access: &ClusterAccess) -> Result<()>;
    fn get_cluster_access(
        &self,
        user_id: &str,
        managed_environment_id: &str,
        gitops_engine_instance_id: &str,
    ) -> Result<ClusterAccess>;
    fn delete_cluster_access(
        &self,
        user_id: &str,
        managed_environment_id: &str,
        gitops_engine_instance_id: &str,
    ) -> Result<usize>;
    fn list_all_cluster_access(&self) -> Result<Vec<ClusterAccess>>;

    // Application operations
    fn create_application(&self, app: &Application) -> Result<()>;
    fn get_application_by_id(&self, id: &str) -> Result<Application>;
    fn delete_application_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_applications(&self) -> Result<Vec<Application>>;

    // Application state operations (keyed by application id)
    fn create_application_state(&self, state: &ApplicationState) -> Result<()>;
    fn get_application_state_by_id(&self, application_id: &str) -> Result<ApplicationState>;
    fn delete_application_state_by_id(&self, application_id: &str) -> Result<usize>;
    fn list_all_application_states(&self) -> Result<Vec<ApplicationState>>;

    // Operation operations
    fn create_operation(&self, op: &Operation) -> Result<()>;
    fn get_operation_by_id(&self, id: &str) -> Result<Operation>;
    fn delete_operation_by_id(&self, id: &str) -> Result<usize>;
    fn list_all_operations(&self) -> Result<Vec<Operation>>;

    // Deployment to application mapping operations (keyed by deployment id)
    fn create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<()>;
    fn get_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
    ) -> Result<DeploymentToApplicationMapping>;
    fn delete_deployment_to_application_mapping_by_id(&self, deployment_id: &str)
    -> Result<usize>;
    fn list_all_deployment_to_application_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>>;
}

/// Tenant-facing access, mediated by `ClusterAccess` grants.
///
/// - `checked_get_*` returns [`Error::NotFound`](crate::error::Error::NotFound)
///   both when the row is absent and when `user_id` is not authorized for it.
/// - `checked_delete_*` returns `Ok(0)` in both of those cases and issues no
///   delete when authorization fails.
/// - `checked_create_*` rejects an unauthorized creator with `NotFound`
///   before any insert is attempted.
pub trait CheckedStore: Store {
    /// Resolves whether `user_id` may act on `resource`. A missing referenced
    /// row resolves to `false`, never to an error.
    fn is_authorized(&self, user_id: &str, resource: Resource<'_>) -> Result<bool>;

    fn checked_get_cluster_credentials_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<ClusterCredentials>;
    fn checked_delete_cluster_credentials_by_id(&self, id: &str, user_id: &str) -> Result<usize>;

    fn checked_get_gitops_engine_cluster_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<GitopsEngineCluster>;
    fn checked_delete_gitops_engine_cluster_by_id(&self, id: &str, user_id: &str)
    -> Result<usize>;

    fn checked_get_gitops_engine_instance_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<GitopsEngineInstance>;
    fn checked_delete_gitops_engine_instance_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<usize>;

    fn checked_get_managed_environment_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<ManagedEnvironment>;
    fn checked_delete_managed_environment_by_id(&self, id: &str, user_id: &str) -> Result<usize>;

    fn checked_create_application(&self, app: &Application, user_id: &str) -> Result<()>;
    fn checked_get_application_by_id(&self, id: &str, user_id: &str) -> Result<Application>;
    fn checked_delete_application_by_id(&self, id: &str, user_id: &str) -> Result<usize>;

    fn checked_create_application_state(
        &self,
        state: &ApplicationState,
        user_id: &str,
    ) -> Result<()>;
    fn checked_get_application_state_by_id(
        &self,
        application_id: &str,
        user_id: &str,
    ) -> Result<ApplicationState>;
    fn checked_delete_application_state_by_id(
        &self,
        application_id: &str,
        user_id: &str,
    ) -> Result<usize>;

    /// Creates an operation owned by `user_id`. The operation's owner must be
    /// `user_id`, and `user_id` must hold a grant on its engine instance.
    fn checked_create_operation(&self, op: &Operation, user_id: &str) -> Result<()>;
    fn checked_get_operation_by_id(&self, id: &str, user_id: &str) -> Result<Operation>;
    fn checked_delete_operation_by_id(&self, id: &str, user_id: &str) -> Result<usize>;

    fn checked_create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
        user_id: &str,
    ) -> Result<()>;
    fn checked_get_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
        user_id: &str,
    ) -> Result<DeploymentToApplicationMapping>;
    fn checked_delete_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
        user_id: &str,
    ) -> Result<usize>;
}
