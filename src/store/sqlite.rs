use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::types::*;

/// SQLite-backed store. One connection, handed out per call behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens the database described by `config`, creating the data directory
    /// if needed.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let conn = Connection::open(config.db_path())?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", config.journal_mode.as_str())?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        tracing::debug!(path = %config.db_path().display(), "opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(super) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows maintenance tooling to execute custom SQL.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Cluster users

const CLUSTER_USER_COLUMNS: &str = "clusteruser_id, user_name";

fn cluster_user_from_row(row: &Row<'_>) -> rusqlite::Result<ClusterUser> {
    Ok(ClusterUser {
        id: row.get(0)?,
        user_name: row.get(1)?,
    })
}

pub(super) fn insert_cluster_user(conn: &Connection, user: &ClusterUser) -> Result<()> {
    conn.execute(
        "INSERT INTO cluster_users (clusteruser_id, user_name) VALUES (?1, ?2)",
        params![user.id, user.user_name],
    )?;
    Ok(())
}

pub(super) fn select_cluster_user(conn: &Connection, id: &str) -> Result<ClusterUser> {
    Ok(conn.query_row(
        &format!("SELECT {CLUSTER_USER_COLUMNS} FROM cluster_users WHERE clusteruser_id = ?1"),
        params![id],
        cluster_user_from_row,
    )?)
}

pub(super) fn delete_cluster_user(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM cluster_users WHERE clusteruser_id = ?1",
        params![id],
    )?)
}

// Cluster credentials

const CLUSTER_CREDENTIALS_COLUMNS: &str = "clustercredentials_cred_id, host, kube_config, \
     kube_config_context, serviceaccount_bearer_token, serviceaccount_ns";

fn cluster_credentials_from_row(row: &Row<'_>) -> rusqlite::Result<ClusterCredentials> {
    Ok(ClusterCredentials {
        id: row.get(0)?,
        host: row.get(1)?,
        kube_config: row.get(2)?,
        kube_config_context: row.get(3)?,
        serviceaccount_bearer_token: row.get(4)?,
        serviceaccount_ns: row.get(5)?,
    })
}

pub(super) fn insert_cluster_credentials(
    conn: &Connection,
    creds: &ClusterCredentials,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO cluster_credentials ({CLUSTER_CREDENTIALS_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            creds.id,
            creds.host,
            creds.kube_config,
            creds.kube_config_context,
            creds.serviceaccount_bearer_token,
            creds.serviceaccount_ns,
        ],
    )?;
    Ok(())
}

pub(super) fn select_cluster_credentials(
    conn: &Connection,
    id: &str,
) -> Result<ClusterCredentials> {
    Ok(conn.query_row(
        &format!(
            "SELECT {CLUSTER_CREDENTIALS_COLUMNS} FROM cluster_credentials
             WHERE clustercredentials_cred_id = ?1"
        ),
        params![id],
        cluster_credentials_from_row,
    )?)
}

pub(super) fn delete_cluster_credentials(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM cluster_credentials WHERE clustercredentials_cred_id = ?1",
        params![id],
    )?)
}

// GitOps engine clusters

const ENGINE_CLUSTER_COLUMNS: &str = "gitopsenginecluster_id, clustercredentials_id";

fn engine_cluster_from_row(row: &Row<'_>) -> rusqlite::Result<GitopsEngineCluster> {
    Ok(GitopsEngineCluster {
        id: row.get(0)?,
        clustercredentials_id: row.get(1)?,
    })
}

pub(super) fn insert_engine_cluster(
    conn: &Connection,
    cluster: &GitopsEngineCluster,
) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO gitops_engine_clusters ({ENGINE_CLUSTER_COLUMNS}) VALUES (?1, ?2)"),
        params![cluster.id, cluster.clustercredentials_id],
    )?;
    Ok(())
}

pub(super) fn select_engine_cluster(conn: &Connection, id: &str) -> Result<GitopsEngineCluster> {
    Ok(conn.query_row(
        &format!(
            "SELECT {ENGINE_CLUSTER_COLUMNS} FROM gitops_engine_clusters
             WHERE gitopsenginecluster_id = ?1"
        ),
        params![id],
        engine_cluster_from_row,
    )?)
}

pub(super) fn delete_engine_cluster(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM gitops_engine_clusters WHERE gitopsenginecluster_id = ?1",
        params![id],
    )?)
}

// GitOps engine instances

const ENGINE_INSTANCE_COLUMNS: &str =
    "gitopsengineinstance_id, namespace_name, namespace_uid, enginecluster_id";

fn engine_instance_from_row(row: &Row<'_>) -> rusqlite::Result<GitopsEngineInstance> {
    Ok(GitopsEngineInstance {
        id: row.get(0)?,
        namespace_name: row.get(1)?,
        namespace_uid: row.get(2)?,
        engine_cluster_id: row.get(3)?,
    })
}

pub(super) fn insert_engine_instance(
    conn: &Connection,
    instance: &GitopsEngineInstance,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO gitops_engine_instances ({ENGINE_INSTANCE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            instance.id,
            instance.namespace_name,
            instance.namespace_uid,
            instance.engine_cluster_id,
        ],
    )?;
    Ok(())
}

pub(super) fn select_engine_instance(conn: &Connection, id: &str) -> Result<GitopsEngineInstance> {
    Ok(conn.query_row(
        &format!(
            "SELECT {ENGINE_INSTANCE_COLUMNS} FROM gitops_engine_instances
             WHERE gitopsengineinstance_id = ?1"
        ),
        params![id],
        engine_instance_from_row,
    )?)
}

pub(super) fn delete_engine_instance(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM gitops_engine_instances WHERE gitopsengineinstance_id = ?1",
        params![id],
    )?)
}

// Managed environments

const MANAGED_ENVIRONMENT_COLUMNS: &str = "managedenvironment_id, name, clustercredentials_id";

fn managed_environment_from_row(row: &Row<'_>) -> rusqlite::Result<ManagedEnvironment> {
    Ok(ManagedEnvironment {
        id: row.get(0)?,
        name: row.get(1)?,
        clustercredentials_id: row.get(2)?,
    })
}

pub(super) fn insert_managed_environment(
    conn: &Connection,
    env: &ManagedEnvironment,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO managed_environments ({MANAGED_ENVIRONMENT_COLUMNS}) VALUES (?1, ?2, ?3)"
        ),
        params![env.id, env.name, env.clustercredentials_id],
    )?;
    Ok(())
}

pub(super) fn select_managed_environment(
    conn: &Connection,
    id: &str,
) -> Result<ManagedEnvironment> {
    Ok(conn.query_row(
        &format!(
            "SELECT {MANAGED_ENVIRONMENT_COLUMNS} FROM managed_environments
             WHERE managedenvironment_id = ?1"
        ),
        params![id],
        managed_environment_from_row,
    )?)
}

pub(super) fn delete_managed_environment(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM managed_environments WHERE managedenvironment_id = ?1",
        params![id],
    )?)
}

// Cluster access grants

const CLUSTER_ACCESS_COLUMNS: &str = "clusteraccess_user_id, clusteraccess_managed_environment_id, \
     clusteraccess_gitops_engine_instance_id";

fn cluster_access_from_row(row: &Row<'_>) -> rusqlite::Result<ClusterAccess> {
    Ok(ClusterAccess {
        user_id: row.get(0)?,
        managed_environment_id: row.get(1)?,
        gitops_engine_instance_id: row.get(2)?,
    })
}

// Applications

const APPLICATION_COLUMNS: &str =
    "application_id, name, spec_field, engine_instance_inst_id, managed_environment_id";

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: row.get(0)?,
        name: row.get(1)?,
        spec_field: row.get(2)?,
        engine_instance_id: row.get(3)?,
        managed_environment_id: row.get(4)?,
    })
}

pub(super) fn insert_application(conn: &Connection, app: &Application) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO applications ({APPLICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            app.id,
            app.name,
            app.spec_field,
            app.engine_instance_id,
            app.managed_environment_id,
        ],
    )?;
    Ok(())
}

pub(super) fn select_application(conn: &Connection, id: &str) -> Result<Application> {
    Ok(conn.query_row(
        &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE application_id = ?1"),
        params![id],
        application_from_row,
    )?)
}

pub(super) fn delete_application(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM applications WHERE application_id = ?1",
        params![id],
    )?)
}

// Application states

const APPLICATION_STATE_COLUMNS: &str =
    "applicationstate_application_id, health, sync_status, revision, message";

fn application_state_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationState> {
    Ok(ApplicationState {
        application_id: row.get(0)?,
        health: row.get(1)?,
        sync_status: row.get(2)?,
        revision: row.get(3)?,
        message: row.get(4)?,
    })
}

pub(super) fn insert_application_state(conn: &Connection, state: &ApplicationState) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO application_states ({APPLICATION_STATE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        params![
            state.application_id,
            state.health,
            state.sync_status,
            state.revision,
            state.message,
        ],
    )?;
    Ok(())
}

pub(super) fn select_application_state(
    conn: &Connection,
    application_id: &str,
) -> Result<ApplicationState> {
    Ok(conn.query_row(
        &format!(
            "SELECT {APPLICATION_STATE_COLUMNS} FROM application_states
             WHERE applicationstate_application_id = ?1"
        ),
        params![application_id],
        application_state_from_row,
    )?)
}

pub(super) fn delete_application_state(conn: &Connection, application_id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM application_states WHERE applicationstate_application_id = ?1",
        params![application_id],
    )?)
}

// Operations

const OPERATION_COLUMNS: &str = "operation_id, instance_id, resource_id, resource_type, state, \
     human_readable_state, created_on, last_state_update, operation_owner_user_id";

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<Operation> {
    Ok(Operation {
        id: row.get(0)?,
        instance_id: row.get(1)?,
        resource_id: row.get(2)?,
        resource_type: row.get(3)?,
        state: row.get(4)?,
        human_readable_state: row.get(5)?,
        created_on: parse_datetime(6, &row.get::<_, String>(6)?)?,
        last_state_update: parse_datetime(7, &row.get::<_, String>(7)?)?,
        owner_user_id: row.get(8)?,
    })
}

pub(super) fn insert_operation(conn: &Connection, op: &Operation) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO operations ({OPERATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            op.id,
            op.instance_id,
            op.resource_id,
            op.resource_type,
            op.state,
            op.human_readable_state,
            format_datetime(&op.created_on),
            format_datetime(&op.last_state_update),
            op.owner_user_id,
        ],
    )?;
    Ok(())
}

pub(super) fn select_operation(conn: &Connection, id: &str) -> Result<Operation> {
    Ok(conn.query_row(
        &format!("SELECT {OPERATION_COLUMNS} FROM operations WHERE operation_id = ?1"),
        params![id],
        operation_from_row,
    )?)
}

pub(super) fn delete_operation(conn: &Connection, id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM operations WHERE operation_id = ?1",
        params![id],
    )?)
}

// Deployment to application mappings

const DTAM_COLUMNS: &str = "deploymenttoapplicationmapping_uid_id, name, namespace, \
     namespace_uid, application_id";

fn dtam_from_row(row: &Row<'_>) -> rusqlite::Result<DeploymentToApplicationMapping> {
    Ok(DeploymentToApplicationMapping {
        deployment_id: row.get(0)?,
        deployment_name: row.get(1)?,
        deployment_namespace: row.get(2)?,
        namespace_uid: row.get(3)?,
        application_id: row.get(4)?,
    })
}

pub(super) fn insert_dtam(
    conn: &Connection,
    mapping: &DeploymentToApplicationMapping,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO deployment_to_application_mappings ({DTAM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        params![
            mapping.deployment_id,
            mapping.deployment_name,
            mapping.deployment_namespace,
            mapping.namespace_uid,
            mapping.application_id,
        ],
    )?;
    Ok(())
}

pub(super) fn select_dtam(
    conn: &Connection,
    deployment_id: &str,
) -> Result<DeploymentToApplicationMapping> {
    Ok(conn.query_row(
        &format!(
            "SELECT {DTAM_COLUMNS} FROM deployment_to_application_mappings
             WHERE deploymenttoapplicationmapping_uid_id = ?1"
        ),
        params![deployment_id],
        dtam_from_row,
    )?)
}

pub(super) fn delete_dtam(conn: &Connection, deployment_id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM deployment_to_application_mappings
         WHERE deploymenttoapplicationmapping_uid_id = ?1",
        params![deployment_id],
    )?)
}

fn list_all<T>(
    conn: &Connection,
    sql: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?;
    collect(rows)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Cluster user operations

    fn create_cluster_user(&self, user: &ClusterUser) -> Result<()> {
        insert_cluster_user(&self.conn(), user)
    }

    fn get_cluster_user_by_id(&self, id: &str) -> Result<ClusterUser> {
        select_cluster_user(&self.conn(), id)
    }

    fn delete_cluster_user_by_id(&self, id: &str) -> Result<usize> {
        delete_cluster_user(&self.conn(), id)
    }

    fn list_all_cluster_users(&self) -> Result<Vec<ClusterUser>> {
        list_all(
            &self.conn(),
            &format!("SELECT {CLUSTER_USER_COLUMNS} FROM cluster_users ORDER BY clusteruser_id"),
            cluster_user_from_row,
        )
    }

    // Cluster credentials operations

    fn create_cluster_credentials(&self, creds: &ClusterCredentials) -> Result<()> {
        insert_cluster_credentials(&self.conn(), creds)
    }

    fn get_cluster_credentials_by_id(&self, id: &str) -> Result<ClusterCredentials> {
        select_cluster_credentials(&self.conn(), id)
    }

    fn delete_cluster_credentials_by_id(&self, id: &str) -> Result<usize> {
        delete_cluster_credentials(&self.conn(), id)
    }

    fn list_all_cluster_credentials(&self) -> Result<Vec<ClusterCredentials>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {CLUSTER_CREDENTIALS_COLUMNS} FROM cluster_credentials
                 ORDER BY clustercredentials_cred_id"
            ),
            cluster_credentials_from_row,
        )
    }

    // GitOps engine cluster operations

    fn create_gitops_engine_cluster(&self, cluster: &GitopsEngineCluster) -> Result<()> {
        insert_engine_cluster(&self.conn(), cluster)
    }

    fn get_gitops_engine_cluster_by_id(&self, id: &str) -> Result<GitopsEngineCluster> {
        select_engine_cluster(&self.conn(), id)
    }

    fn delete_gitops_engine_cluster_by_id(&self, id: &str) -> Result<usize> {
        delete_engine_cluster(&self.conn(), id)
    }

    fn list_all_gitops_engine_clusters(&self) -> Result<Vec<GitopsEngineCluster>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {ENGINE_CLUSTER_COLUMNS} FROM gitops_engine_clusters
                 ORDER BY gitopsenginecluster_id"
            ),
            engine_cluster_from_row,
        )
    }

    // GitOps engine instance operations

    fn create_gitops_engine_instance(&self, instance: &GitopsEngineInstance) -> Result<()> {
        insert_engine_instance(&self.conn(), instance)
    }

    fn get_gitops_engine_instance_by_id(&self, id: &str) -> Result<GitopsEngineInstance> {
        select_engine_instance(&self.conn(), id)
    }

    fn delete_gitops_engine_instance_by_id(&self, id: &str) -> Result<usize> {
        delete_engine_instance(&self.conn(), id)
    }

    fn list_all_gitops_engine_instances(&self) -> Result<Vec<GitopsEngineInstance>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {ENGINE_INSTANCE_COLUMNS} FROM gitops_engine_instances
                 ORDER BY gitopsengineinstance_id"
            ),
            engine_instance_from_row,
        )
    }

    // Managed environment operations

    fn create_managed_environment(&self, env: &ManagedEnvironment) -> Result<()> {
        insert_managed_environment(&self.conn(), env)
    }

    fn get_managed_environment_by_id(&self, id: &str) -> Result<ManagedEnvironment> {
        select_managed_environment(&self.conn(), id)
    }

    fn delete_managed_environment_by_id(&self, id: &str) -> Result<usize> {
        delete_managed_environment(&self.conn(), id)
    }

    fn list_all_managed_environments(&self) -> Result<Vec<ManagedEnvironment>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {MANAGED_ENVIRONMENT_COLUMNS} FROM managed_environments
                 ORDER BY managedenvironment_id"
            ),
            managed_environment_from_row,
        )
    }

    // Cluster access operations

    fn create_cluster_access(&self, access: &ClusterAccess) -> Result<()> {
        self.conn().execute(
            &format!("INSERT INTO cluster_access ({CLUSTER_ACCESS_COLUMNS}) VALUES (?1, ?2, ?3)"),
            params![
                access.user_id,
                access.managed_environment_id,
                access.gitops_engine_instance_id,
            ],
        )?;
        Ok(())
    }

    fn get_cluster_access(
        &self,
        user_id: &str,
        managed_environment_id: &str,
        gitops_engine_instance_id: &str,
    ) -> Result<ClusterAccess> {
        Ok(self.conn().query_row(
            &format!(
                "SELECT {CLUSTER_ACCESS_COLUMNS} FROM cluster_access
                 WHERE clusteraccess_user_id = ?1
                   AND clusteraccess_managed_environment_id = ?2
                   AND clusteraccess_gitops_engine_instance_id = ?3"
            ),
            params![user_id, managed_environment_id, gitops_engine_instance_id],
            cluster_access_from_row,
        )?)
    }

    fn delete_cluster_access(
        &self,
        user_id: &str,
        managed_environment_id: &str,
        gitops_engine_instance_id: &str,
    ) -> Result<usize> {
        Ok(self.conn().execute(
            "DELETE FROM cluster_access
             WHERE clusteraccess_user_id = ?1
               AND clusteraccess_managed_environment_id = ?2
               AND clusteraccess_gitops_engine_instance_id = ?3",
            params![user_id, managed_environment_id, gitops_engine_instance_id],
        )?)
    }

    fn list_all_cluster_access(&self) -> Result<Vec<ClusterAccess>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {CLUSTER_ACCESS_COLUMNS} FROM cluster_access
                 ORDER BY clusteraccess_user_id, clusteraccess_managed_environment_id,
                          clusteraccess_gitops_engine_instance_id"
            ),
            cluster_access_from_row,
        )
    }

    // Application operations

    fn create_application(&self, app: &Application) -> Result<()> {
        insert_application(&self.conn(), app)
    }

    fn get_application_by_id(&self, id: &str) -> Result<Application> {
        select_application(&self.conn(), id)
    }

    fn delete_application_by_id(&self, id: &str) -> Result<usize> {
        delete_application(&self.conn(), id)
    }

    fn list_all_applications(&self) -> Result<Vec<Application>> {
        list_all(
            &self.conn(),
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY application_id"),
            application_from_row,
        )
    }

    // Application state operations

    fn create_application_state(&self, state: &ApplicationState) -> Result<()> {
        insert_application_state(&self.conn(), state)
    }

    fn get_application_state_by_id(&self, application_id: &str) -> Result<ApplicationState> {
        select_application_state(&self.conn(), application_id)
    }

    fn delete_application_state_by_id(&self, application_id: &str) -> Result<usize> {
        delete_application_state(&self.conn(), application_id)
    }

    fn list_all_application_states(&self) -> Result<Vec<ApplicationState>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {APPLICATION_STATE_COLUMNS} FROM application_states
                 ORDER BY applicationstate_application_id"
            ),
            application_state_from_row,
        )
    }

    // Operation operations

    fn create_operation(&self, op: &Operation) -> Result<()> {
        insert_operation(&self.conn(), op)
    }

    fn get_operation_by_id(&self, id: &str) -> Result<Operation> {
        select_operation(&self.conn(), id)
    }

    fn delete_operation_by_id(&self, id: &str) -> Result<usize> {
        delete_operation(&self.conn(), id)
    }

    fn list_all_operations(&self) -> Result<Vec<Operation>> {
        list_all(
            &self.conn(),
            &format!("SELECT {OPERATION_COLUMNS} FROM operations ORDER BY operation_id"),
            operation_from_row,
        )
    }

    // Deployment to application mapping operations

    fn create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<()> {
        insert_dtam(&self.conn(), mapping)
    }

    fn get_deployment_to_application_mapping_by_id(
        &self,
        deployment_id: &str,
    ) -> Result<DeploymentToApplicationMapping> {
        select_dtam(&self.conn(), deployment_id)
    }

    fn delete_deployment_to_application_mapping_by_id(&self, deployment_id: &str) -> Result<usize> {
        delete_dtam(&self.conn(), deployment_id)
    }

    fn list_all_deployment_to_application_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>> {
        list_all(
            &self.conn(),
            &format!(
                "SELECT {DTAM_COLUMNS} FROM deployment_to_application_mappings
                 ORDER BY deploymenttoapplicationmapping_uid_id"
            ),
            dtam_from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn credentials(id: &str) -> ClusterCredentials {
        ClusterCredentials {
            id: id.to_string(),
            host: "host".to_string(),
            kube_config: "kube-config".to_string(),
            kube_config_context: "kube-config-context".to_string(),
            serviceaccount_bearer_token: "serviceaccount_bearer_token".to_string(),
            serviceaccount_ns: "serviceaccount_ns".to_string(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "cluster_users",
            "cluster_credentials",
            "gitops_engine_clusters",
            "gitops_engine_instances",
            "managed_environments",
            "cluster_access",
            "applications",
            "application_states",
            "operations",
            "deployment_to_application_mappings",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_temp, store) = test_store();
        store.initialize().unwrap();
    }

    #[test]
    fn test_cluster_user_crud() {
        let (_temp, store) = test_store();

        let user = ClusterUser {
            id: "test-my-cluster-user-2".to_string(),
            user_name: "cluster-mccluster".to_string(),
        };
        store.create_cluster_user(&user).unwrap();

        let fetched = store.get_cluster_user_by_id(&user.id).unwrap();
        assert_eq!(fetched, user);

        assert_eq!(store.delete_cluster_user_by_id(&user.id).unwrap(), 1);
        assert!(store.get_cluster_user_by_id(&user.id).unwrap_err().is_not_found());
        assert!(store.get_cluster_user_by_id("does-not-exist").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_key_is_constraint_violation() {
        let (_temp, store) = test_store();

        store.create_cluster_credentials(&credentials("creds-1")).unwrap();
        let result = store.create_cluster_credentials(&credentials("creds-1"));
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        let (_temp, store) = test_store();

        store.create_cluster_credentials(&credentials("Creds-A")).unwrap();
        assert!(store.get_cluster_credentials_by_id("creds-a").unwrap_err().is_not_found());
        store.create_cluster_credentials(&credentials("creds-a")).unwrap();
        assert_eq!(store.list_all_cluster_credentials().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_absent_reports_zero() {
        let (_temp, store) = test_store();

        assert_eq!(store.delete_operation_by_id("missing").unwrap(), 0);
        assert_eq!(store.delete_cluster_access("u", "m", "i").unwrap(), 0);
    }

    #[test]
    fn test_operation_round_trip() {
        let (_temp, store) = test_store();

        store.create_cluster_credentials(&credentials("creds-1")).unwrap();
        store
            .create_gitops_engine_cluster(&GitopsEngineCluster {
                id: "cluster-1".to_string(),
                clustercredentials_id: "creds-1".to_string(),
            })
            .unwrap();
        store
            .create_gitops_engine_instance(&GitopsEngineInstance {
                id: "instance-1".to_string(),
                namespace_name: "argocd".to_string(),
                namespace_uid: "uid-1".to_string(),
                engine_cluster_id: "cluster-1".to_string(),
            })
            .unwrap();
        store
            .create_cluster_user(&ClusterUser {
                id: "user-1".to_string(),
                user_name: "user-1".to_string(),
            })
            .unwrap();

        let now = Utc::now();
        let op = Operation {
            id: "op-1".to_string(),
            instance_id: "instance-1".to_string(),
            resource_id: "instance-1".to_string(),
            resource_type: OperationResourceType::GitopsEngineInstance,
            state: OperationState::InProgress,
            human_readable_state: Some("syncing".to_string()),
            created_on: now,
            last_state_update: now,
            owner_user_id: "user-1".to_string(),
        };
        store.create_operation(&op).unwrap();

        assert_eq!(store.get_operation_by_id("op-1").unwrap(), op);
        assert_eq!(store.list_all_operations().unwrap(), vec![op]);
    }

    #[test]
    fn test_unknown_operation_state_is_storage_error() {
        let (_temp, store) = test_store();

        store.create_cluster_credentials(&credentials("creds-1")).unwrap();
        {
            let conn = store.conn();
            conn.execute_batch(
                "INSERT INTO gitops_engine_clusters VALUES ('cluster-1', 'creds-1');
                 INSERT INTO gitops_engine_instances
                     VALUES ('instance-1', 'ns', 'uid', 'cluster-1');
                 INSERT INTO cluster_users VALUES ('user-1', 'user-1');
                 INSERT INTO operations VALUES ('op-1', 'instance-1', 'r', 'Application',
                     'Paused', NULL, '2024-01-01T00:00:00+00:00',
                     '2024-01-01T00:00:00+00:00', 'user-1');",
            )
            .unwrap();
        }

        let result = store.get_operation_by_id("op-1");
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
