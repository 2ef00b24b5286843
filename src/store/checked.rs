use rusqlite::{Connection, TransactionBehavior};

use super::ownership::{self, Guarded, Resource};
use super::sqlite::*;
use super::{CheckedStore, SqliteStore};
use crate::error::{Error, Result};
use crate::types::*;

// Every checked operation resolves ownership before it touches the target
// row, so a row the caller cannot see is never decoded for them. Checked reads
// run in a deferred transaction so the grant lookup and the read see one
// snapshot. Checked mutations use BEGIN IMMEDIATE: the write lock is held from
// the grant lookup through the insert or delete, so a grant cannot be revoked
// between check and act.
impl SqliteStore {
    fn checked_get<T>(
        &self,
        user_id: &str,
        resource: Resource<'_>,
        fetch: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !ownership::is_authorized(&tx, user_id, resource)? {
            tracing::debug!(kind = resource.kind(), user_id, "checked get denied");
            return Err(Error::NotFound);
        }

        let record = fetch(&tx)?;
        tx.commit()?;
        Ok(record)
    }

    fn checked_delete(
        &self,
        user_id: &str,
        resource: Resource<'_>,
        delete: impl FnOnce(&Connection) -> Result<usize>,
    ) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !ownership::is_authorized(&tx, user_id, resource)? {
            tracing::debug!(kind = resource.kind(), user_id, "checked delete denied");
            return Ok(0);
        }

        let rows = delete(&tx)?;
        tx.commit()?;
        Ok(rows)
    }

    /// Inserts only if every resource in `required` authorizes `user_id`.
    fn checked_create(
        &self,
        user_id: &str,
        required: &[Resource<'_>],
        insert: impl FnOnce(&Connection) -> Result<()>,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for resource in required {
            if !ownership::is_authorized(&tx, user_id, *resource)? {
                tracing::debug!(kind = resource.kind(), user_id, "checked create denied");
                return Err(Error::NotFound);
            }
        }

        insert(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

impl CheckedStore for SqliteStore {
    fn is_authorized(&self, user_id: &str, resource: Resource<'_>) -> Result<bool> {
        ownership::is_authorized(&self.conn(), user_id, resource)
    }

    // Cluster credentials

    fn checked_get_cluster_credentials_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<ClusterCredentials> {
        self.checked_get(
            user_id,
            Resource::ClusterCredentials { id },
            |c| select_cluster_credentials(c, id),
        )
    }

    fn checked_delete_cluster_credentials_by_id(&self, id: &str, user_id: &str) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::ClusterCredentials { id },
            |c| delete_cluster_credentials(c, id),
        )
    }

    // GitOps engine clusters

    fn checked_get_gitops_engine_cluster_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<GitopsEngineCluster> {
        self.checked_get(
            user_id,
            Resource::GitopsEngineCluster { id },
            |c| select_engine_cluster(c, id),
        )
    }

    fn checked_delete_gitops_engine_cluster_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::GitopsEngineCluster { id },
            |c| delete_engine_cluster(c, id),
        )
    }

    // GitOps engine instances

    fn checked_get_gitops_engine_instance_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<GitopsEngineInstance> {
        self.checked_get(
            user_id,
            Resource::GitopsEngineInstance { id },
            |c| select_engine_instance(c, id),
        )
    }

    fn checked_delete_gitops_engine_instance_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::GitopsEngineInstance { id },
            |c| delete_engine_instance(c, id),
        )
    }

    // Managed environments

    fn checked_get_managed_environment_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<ManagedEnvironment> {
        self.checked_get(
            user_id,
            Resource::ManagedEnvironment { id },
            |c| select_managed_environment(c, id),
        )
    }

    fn checked_delete_managed_environment_by_id(&self, id: &str, user_id: &str) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::ManagedEnvironment { id },
            |c| delete_managed_environment(c, id),
        )
    }

    // Applications

    fn checked_create_application(&self, app: &Application, user_id: &str) -> Result<()> {
        self.checked_create(user_id, &[app.resource()], |c| insert_application(c, app))
    }

    fn checked_get_application_by_id(&self, id: &str, user_id: &str) -> Result<Application> {
        self.checked_get(user_id, Resource::ApplicationId { id }, |c| {
            select_application(c, id)
        })
    }

    fn checked_delete_application_by_id(&self, id: &str, user_id: &str) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::ApplicationId { id },
            |c| delete_application(c, id),
        )
    }

    // Application states

    fn checked_create_application_state(
        &self,
        state: &ApplicationState,
        user_id: &str,
    ) -> Result<()> {
        self.checked_create(user_id, &[state.resource()], |c| {
            insert_application_state(c, state)
        })
    }

    fn checked_get_application_state_by_id(
        &self,
        application_id: &str,
        user_id: &str,
    ) -> Result<ApplicationState> {
        self.checked_get(
            user_id,
            Resource::ApplicationId { id: application_id },
            |c| select_application_state(c, application_id),
        )
    }

    fn checked_delete_application_state_by_id(
        &self,
        application_id: &str,
        user_id: &str,
    ) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::ApplicationId { id: application_id },
            |c| delete_application_state(c, application_id),
        )
    }

    // Operations

    fn checked_create_operation(&self, op: &Operation, user_id: &str) -> Result<()> {
        let required = [
            op.resource(),
            Resource::GitopsEngineInstance {
                id: &op.instance_id,
            },
        ];
        self.checked_create(user_id, &required, |c| insert_operation(c, op))
    }

    fn checked_get_operation_by_id(&self, id: &str, user_id: &str) -> Result<Operation> {
        self.checked_get(user_id, Resource::OperationId { id }, |c| {
            select_operation(c, id)
        })
    }

    fn checked_delete_operation_by_id(&self, id: &str, user_id: &str) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::OperationId { id },
            |c| delete_operation(c, id),
        )
    }

    // Deployment to application mappings

    fn checked_create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
        user_id: &str,
    ) -> Result<()> {
        self.checked_create(user_id, &[mapping.resource()], |c| insert_dtam(c, mapping))
    }

    fn checked_get_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
        user_id: &str,
    ) -> Result<DeploymentToApplicationMapping> {
        self.checked_get(
            user_id,
            Resource::DeploymentMapping { deployment_id },
            |c| select_dtam(c, deployment_id),
        )
    }

    fn checked_delete_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
        user_id: &str,
    ) -> Result<usize> {
        self.checked_delete(
            user_id,
            Resource::DeploymentMapping { deployment_id },
            |c| delete_dtam(c, deployment_id),
        )
    }
}
