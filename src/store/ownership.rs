//! Ownership graph resolution.
//!
//! The graph is a fixed chain:
//!
//! ```text
//! ClusterUser -> ClusterAccess -> ManagedEnvironment ----------------> ClusterCredentials
//!                              -> GitopsEngineInstance -> GitopsEngineCluster -^
//! Application / ApplicationState / DeploymentToApplicationMapping
//!     -> (ManagedEnvironment, GitopsEngineInstance) pair named by a ClusterAccess row
//! Operation -> owner user id
//! ```
//!
//! Each resource kind has one query. A grant that does not exist and a
//! referenced row that does not exist both resolve to `false`.

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::types::*;

/// A reference to something a user may or may not be entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    ClusterCredentials {
        id: &'a str,
    },
    GitopsEngineCluster {
        id: &'a str,
    },
    GitopsEngineInstance {
        id: &'a str,
    },
    ManagedEnvironment {
        id: &'a str,
    },
    /// An application's placement. Authorized only by a grant naming exactly
    /// this pair.
    Application {
        managed_environment_id: &'a str,
        engine_instance_id: &'a str,
    },
    /// An application identified by id; resolved through its stored placement.
    ApplicationId {
        id: &'a str,
    },
    Operation {
        owner_user_id: &'a str,
    },
    /// A stored operation identified by id; resolved through its stored owner.
    OperationId {
        id: &'a str,
    },
    /// A stored mapping identified by deployment id; resolved through its
    /// application.
    DeploymentMapping {
        deployment_id: &'a str,
    },
}

impl Resource<'_> {
    pub const fn kind(&self) -> &'static str {
        match self {
            Resource::ClusterCredentials { .. } => "ClusterCredentials",
            Resource::GitopsEngineCluster { .. } => "GitopsEngineCluster",
            Resource::GitopsEngineInstance { .. } => "GitopsEngineInstance",
            Resource::ManagedEnvironment { .. } => "ManagedEnvironment",
            Resource::Application { .. } | Resource::ApplicationId { .. } => "Application",
            Resource::Operation { .. } | Resource::OperationId { .. } => "Operation",
            Resource::DeploymentMapping { .. } => "DeploymentToApplicationMapping",
        }
    }
}

/// Records whose creation is gated by the ownership graph.
pub trait Guarded {
    fn resource(&self) -> Resource<'_>;
}

impl Guarded for Application {
    fn resource(&self) -> Resource<'_> {
        Resource::Application {
            managed_environment_id: &self.managed_environment_id,
            engine_instance_id: &self.engine_instance_id,
        }
    }
}

impl Guarded for ApplicationState {
    fn resource(&self) -> Resource<'_> {
        Resource::ApplicationId {
            id: &self.application_id,
        }
    }
}

impl Guarded for DeploymentToApplicationMapping {
    fn resource(&self) -> Resource<'_> {
        Resource::ApplicationId {
            id: &self.application_id,
        }
    }
}

impl Guarded for Operation {
    fn resource(&self) -> Resource<'_> {
        Resource::Operation {
            owner_user_id: &self.owner_user_id,
        }
    }
}

/// Returns true if `user_id` holds a grant reaching `resource`.
pub fn is_authorized(conn: &Connection, user_id: &str, resource: Resource<'_>) -> Result<bool> {
    match resource {
        Resource::ClusterCredentials { id } => cluster_credentials_authorized(conn, user_id, id),
        Resource::GitopsEngineCluster { id } => engine_cluster_authorized(conn, user_id, id),
        Resource::GitopsEngineInstance { id } => engine_instance_authorized(conn, user_id, id),
        Resource::ManagedEnvironment { id } => managed_environment_authorized(conn, user_id, id),
        Resource::Application {
            managed_environment_id,
            engine_instance_id,
        } => placement_authorized(conn, user_id, managed_environment_id, engine_instance_id),
        Resource::ApplicationId { id } => application_authorized(conn, user_id, id),
        Resource::Operation { owner_user_id } => Ok(owner_user_id == user_id),
        Resource::OperationId { id } => operation_authorized(conn, user_id, id),
        Resource::DeploymentMapping { deployment_id } => {
            deployment_mapping_authorized(conn, user_id, deployment_id)
        }
    }
}

fn exists(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<bool> {
    Ok(conn.query_row(sql, params, |row| row.get::<_, bool>(0))?)
}

fn managed_environment_authorized(
    conn: &Connection,
    user_id: &str,
    env_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM cluster_access
             WHERE clusteraccess_managed_environment_id = ?1
               AND clusteraccess_user_id = ?2
         )",
        params![env_id, user_id],
    )
}

fn engine_instance_authorized(
    conn: &Connection,
    user_id: &str,
    instance_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM cluster_access
             WHERE clusteraccess_gitops_engine_instance_id = ?1
               AND clusteraccess_user_id = ?2
         )",
        params![instance_id, user_id],
    )
}

fn engine_cluster_authorized(
    conn: &Connection,
    user_id: &str,
    cluster_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM cluster_access ca
             JOIN gitops_engine_instances gi
               ON gi.gitopsengineinstance_id = ca.clusteraccess_gitops_engine_instance_id
             WHERE gi.enginecluster_id = ?1
               AND ca.clusteraccess_user_id = ?2
         )",
        params![cluster_id, user_id],
    )
}

fn cluster_credentials_authorized(
    conn: &Connection,
    user_id: &str,
    creds_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM cluster_access ca
             JOIN managed_environments me
               ON me.managedenvironment_id = ca.clusteraccess_managed_environment_id
             WHERE me.clustercredentials_id = ?1
               AND ca.clusteraccess_user_id = ?2
         ) OR EXISTS(
             SELECT 1 FROM cluster_access ca
             JOIN gitops_engine_instances gi
               ON gi.gitopsengineinstance_id = ca.clusteraccess_gitops_engine_instance_id
             JOIN gitops_engine_clusters gc
               ON gc.gitopsenginecluster_id = gi.enginecluster_id
             WHERE gc.clustercredentials_id = ?1
               AND ca.clusteraccess_user_id = ?2
         )",
        params![creds_id, user_id],
    )
}

fn placement_authorized(
    conn: &Connection,
    user_id: &str,
    env_id: &str,
    instance_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM cluster_access
             WHERE clusteraccess_user_id = ?1
               AND clusteraccess_managed_environment_id = ?2
               AND clusteraccess_gitops_engine_instance_id = ?3
         )",
        params![user_id, env_id, instance_id],
    )
}

fn application_authorized(
    conn: &Connection,
    user_id: &str,
    application_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM applications a
             JOIN cluster_access ca
               ON ca.clusteraccess_managed_environment_id = a.managed_environment_id
              AND ca.clusteraccess_gitops_engine_instance_id = a.engine_instance_inst_id
             WHERE a.application_id = ?1
               AND ca.clusteraccess_user_id = ?2
         )",
        params![application_id, user_id],
    )
}

fn operation_authorized(conn: &Connection, user_id: &str, operation_id: &str) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM operations
             WHERE operation_id = ?1
               AND operation_owner_user_id = ?2
         )",
        params![operation_id, user_id],
    )
}

fn deployment_mapping_authorized(
    conn: &Connection,
    user_id: &str,
    deployment_id: &str,
) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(
             SELECT 1 FROM deployment_to_application_mappings d
             JOIN applications a ON a.application_id = d.application_id
             JOIN cluster_access ca
               ON ca.clusteraccess_managed_environment_id = a.managed_environment_id
              AND ca.clusteraccess_gitops_engine_instance_id = a.engine_instance_inst_id
             WHERE d.deploymenttoapplicationmapping_uid_id = ?1
               AND ca.clusteraccess_user_id = ?2
         )",
        params![deployment_id, user_id],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteStore, Store};

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO cluster_users VALUES ('u1', 'user one');
                 INSERT INTO cluster_users VALUES ('u2', 'user two');
                 INSERT INTO cluster_credentials VALUES ('c-env', 'h', 'k', 'ctx', 't', 'ns');
                 INSERT INTO cluster_credentials VALUES ('c-engine', 'h', 'k', 'ctx', 't', 'ns');
                 INSERT INTO cluster_credentials VALUES ('c-orphan', 'h', 'k', 'ctx', 't', 'ns');
                 INSERT INTO managed_environments VALUES ('m1', 'env', 'c-env');
                 INSERT INTO managed_environments VALUES ('m2', 'env two', 'c-env');
                 INSERT INTO gitops_engine_clusters VALUES ('gc1', 'c-engine');
                 INSERT INTO gitops_engine_instances VALUES ('gi1', 'argocd', 'uid-1', 'gc1');
                 INSERT INTO gitops_engine_instances VALUES ('gi2', 'argocd-2', 'uid-2', 'gc1');
                 INSERT INTO cluster_access VALUES ('u1', 'm1', 'gi1');
                 INSERT INTO applications VALUES ('app1', 'app', '{}', 'gi1', 'm1');
                 INSERT INTO applications VALUES ('app2', 'app', '{}', 'gi2', 'm1');
                 INSERT INTO deployment_to_application_mappings
                     VALUES ('d1', 'deploy', 'ns', 'ns-uid', 'app1');
                 INSERT INTO deployment_to_application_mappings
                     VALUES ('d2', 'deploy', 'ns', 'ns-uid', 'app2');
                 INSERT INTO operations VALUES ('op1', 'gi1', 'gi1', 'GitopsEngineInstance',
                     'Waiting', NULL, '2024-01-01T00:00:00+00:00',
                     '2024-01-01T00:00:00+00:00', 'u1');",
            )
            .unwrap();
        store
    }

    fn check(store: &SqliteStore, user_id: &str, resource: Resource<'_>) -> bool {
        is_authorized(&store.connection(), user_id, resource).unwrap()
    }

    #[test]
    fn test_managed_environment_requires_grant() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::ManagedEnvironment { id: "m1" }));
        assert!(!check(&store, "u2", Resource::ManagedEnvironment { id: "m1" }));
        assert!(!check(&store, "u1", Resource::ManagedEnvironment { id: "m2" }));
    }

    #[test]
    fn test_engine_cluster_via_any_instance() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::GitopsEngineCluster { id: "gc1" }));
        assert!(check(&store, "u1", Resource::GitopsEngineInstance { id: "gi1" }));
        assert!(!check(&store, "u1", Resource::GitopsEngineInstance { id: "gi2" }));
        assert!(!check(&store, "u2", Resource::GitopsEngineCluster { id: "gc1" }));
    }

    #[test]
    fn test_credentials_via_environment_or_engine_cluster() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::ClusterCredentials { id: "c-env" }));
        assert!(check(&store, "u1", Resource::ClusterCredentials { id: "c-engine" }));
        assert!(!check(&store, "u1", Resource::ClusterCredentials { id: "c-orphan" }));
        assert!(!check(&store, "u2", Resource::ClusterCredentials { id: "c-env" }));
    }

    #[test]
    fn test_application_requires_exact_pair() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::ApplicationId { id: "app1" }));
        // u1 has a grant on m1 and on gi1, but not on the (m1, gi2) pair.
        assert!(!check(&store, "u1", Resource::ApplicationId { id: "app2" }));
        assert!(!check(
            &store,
            "u1",
            Resource::Application {
                managed_environment_id: "m1",
                engine_instance_id: "gi2",
            }
        ));
    }

    #[test]
    fn test_missing_rows_resolve_to_unauthorized() {
        let store = seeded_store();
        assert!(!check(&store, "u1", Resource::ManagedEnvironment { id: "nope" }));
        assert!(!check(&store, "u1", Resource::GitopsEngineCluster { id: "nope" }));
        assert!(!check(&store, "u1", Resource::ClusterCredentials { id: "nope" }));
        assert!(!check(&store, "u1", Resource::ApplicationId { id: "nope" }));
        assert!(!check(&store, "ghost", Resource::ManagedEnvironment { id: "m1" }));
    }

    #[test]
    fn test_operation_is_direct_ownership() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::Operation { owner_user_id: "u1" }));
        assert!(!check(&store, "U1", Resource::Operation { owner_user_id: "u1" }));
    }

    #[test]
    fn test_stored_operation_resolves_through_owner() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::OperationId { id: "op1" }));
        assert!(!check(&store, "u2", Resource::OperationId { id: "op1" }));
        assert!(!check(&store, "u1", Resource::OperationId { id: "nope" }));
    }

    #[test]
    fn test_deployment_mapping_resolves_through_application() {
        let store = seeded_store();
        assert!(check(&store, "u1", Resource::DeploymentMapping { deployment_id: "d1" }));
        assert!(!check(&store, "u1", Resource::DeploymentMapping { deployment_id: "d2" }));
        assert!(!check(&store, "u2", Resource::DeploymentMapping { deployment_id: "d1" }));
        assert!(!check(&store, "u1", Resource::DeploymentMapping { deployment_id: "nope" }));
    }
}
