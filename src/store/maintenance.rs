//! Privileged maintenance routines built on the unchecked [`Store`] interface.

use serde::Serialize;

use super::{CheckedStore, Store};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeEntry {
    pub entity: &'static str,
    pub deleted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub entries: Vec<PurgeEntry>,
}

impl PurgeReport {
    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.entries.iter().map(|e| e.deleted).sum()
    }

    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.entries.iter().map(|e| e.skipped).sum()
    }

    #[must_use]
    pub fn deleted(&self, entity: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.entity == entity)
            .map_or(0, |e| e.deleted)
    }
}

fn purge<T>(
    report: &mut PurgeReport,
    entity: &'static str,
    prefix: &str,
    rows: Vec<T>,
    key: impl Fn(&T) -> &str,
    delete: impl Fn(&T) -> Result<usize>,
) -> Result<()> {
    let mut entry = PurgeEntry {
        entity,
        deleted: 0,
        skipped: 0,
    };

    for row in rows.iter().filter(|r| key(*r).starts_with(prefix)) {
        match delete(row) {
            Ok(n) => entry.deleted += n,
            Err(Error::ConstraintViolation(msg)) => {
                tracing::warn!(entity, key = key(row), "skipping row still referenced: {msg}");
                entry.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.entries.push(entry);
    Ok(())
}

/// Deletes every row whose key starts with `prefix`, children before parents.
///
/// Grants are matched on their managed environment id. Operations are removed
/// through the checked path on behalf of their own owner. A row that is still
/// referenced by something outside the prefix is logged and counted as
/// skipped instead of aborting the purge.
pub fn purge_rows_with_prefix<S: CheckedStore + ?Sized>(
    store: &S,
    prefix: &str,
) -> Result<PurgeReport> {
    let mut report = PurgeReport::default();

    purge(
        &mut report,
        "ApplicationState",
        prefix,
        store.list_all_application_states()?,
        |s| s.application_id.as_str(),
        |s| store.delete_application_state_by_id(&s.application_id),
    )?;

    purge(
        &mut report,
        "DeploymentToApplicationMapping",
        prefix,
        store.list_all_deployment_to_application_mappings()?,
        |m| m.deployment_id.as_str(),
        |m| store.delete_deployment_to_application_mapping_by_id(&m.deployment_id),
    )?;

    purge(
        &mut report,
        "Operation",
        prefix,
        store.list_all_operations()?,
        |o| o.id.as_str(),
        |o| store.checked_delete_operation_by_id(&o.id, &o.owner_user_id),
    )?;

    purge(
        &mut report,
        "Application",
        prefix,
        store.list_all_applications()?,
        |a| a.id.as_str(),
        |a| store.delete_application_by_id(&a.id),
    )?;

    purge(
        &mut report,
        "ClusterAccess",
        prefix,
        store.list_all_cluster_access()?,
        |g| g.managed_environment_id.as_str(),
        |g| {
            store.delete_cluster_access(
                &g.user_id,
                &g.managed_environment_id,
                &g.gitops_engine_instance_id,
            )
        },
    )?;

    purge(
        &mut report,
        "GitopsEngineInstance",
        prefix,
        store.list_all_gitops_engine_instances()?,
        |i| i.id.as_str(),
        |i| store.delete_gitops_engine_instance_by_id(&i.id),
    )?;

    purge(
        &mut report,
        "GitopsEngineCluster",
        prefix,
        store.list_all_gitops_engine_clusters()?,
        |c| c.id.as_str(),
        |c| store.delete_gitops_engine_cluster_by_id(&c.id),
    )?;

    purge(
        &mut report,
        "ManagedEnvironment",
        prefix,
        store.list_all_managed_environments()?,
        |m| m.id.as_str(),
        |m| store.delete_managed_environment_by_id(&m.id),
    )?;

    purge(
        &mut report,
        "ClusterCredentials",
        prefix,
        store.list_all_cluster_credentials()?,
        |c| c.id.as_str(),
        |c| store.delete_cluster_credentials_by_id(&c.id),
    )?;

    purge(
        &mut report,
        "ClusterUser",
        prefix,
        store.list_all_cluster_users()?,
        |u| u.id.as_str(),
        |u| store.delete_cluster_user_by_id(&u.id),
    )?;

    tracing::info!(
        prefix,
        deleted = report.total_deleted(),
        skipped = report.total_skipped(),
        "purge complete"
    );

    Ok(report)
}

/// Returns true if `store` holds no rows of any kind.
pub fn is_empty<S: Store + ?Sized>(store: &S) -> Result<bool> {
    Ok(store.list_all_cluster_users()?.is_empty()
        && store.list_all_cluster_credentials()?.is_empty()
        && store.list_all_gitops_engine_clusters()?.is_empty()
        && store.list_all_gitops_engine_instances()?.is_empty()
        && store.list_all_managed_environments()?.is_empty()
        && store.list_all_cluster_access()?.is_empty()
        && store.list_all_applications()?.is_empty()
        && store.list_all_application_states()?.is_empty()
        && store.list_all_operations()?.is_empty()
        && store.list_all_deployment_to_application_mappings()?.is_empty())
}
