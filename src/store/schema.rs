// Foreign keys carry no ON DELETE action: deleting a parent row that still has
// dependents fails with a constraint violation.
pub const SCHEMA: &str = r#"
-- Tenants
CREATE TABLE IF NOT EXISTS cluster_users (
    clusteruser_id TEXT PRIMARY KEY,
    user_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cluster_credentials (
    clustercredentials_cred_id TEXT PRIMARY KEY,
    host TEXT NOT NULL,
    kube_config TEXT NOT NULL,
    kube_config_context TEXT NOT NULL,
    serviceaccount_bearer_token TEXT NOT NULL,
    serviceaccount_ns TEXT NOT NULL
);

-- Clusters hosting GitOps engines
CREATE TABLE IF NOT EXISTS gitops_engine_clusters (
    gitopsenginecluster_id TEXT PRIMARY KEY,
    clustercredentials_id TEXT NOT NULL
        REFERENCES cluster_credentials(clustercredentials_cred_id)
);

CREATE TABLE IF NOT EXISTS gitops_engine_instances (
    gitopsengineinstance_id TEXT PRIMARY KEY,
    namespace_name TEXT NOT NULL,
    namespace_uid TEXT NOT NULL,
    enginecluster_id TEXT NOT NULL
        REFERENCES gitops_engine_clusters(gitopsenginecluster_id)
);

-- Clusters that applications are deployed to
CREATE TABLE IF NOT EXISTS managed_environments (
    managedenvironment_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    clustercredentials_id TEXT NOT NULL
        REFERENCES cluster_credentials(clustercredentials_cred_id)
);

-- Grants: the only authorization primitive
CREATE TABLE IF NOT EXISTS cluster_access (
    clusteraccess_user_id TEXT NOT NULL
        REFERENCES cluster_users(clusteruser_id),
    clusteraccess_managed_environment_id TEXT NOT NULL
        REFERENCES managed_environments(managedenvironment_id),
    clusteraccess_gitops_engine_instance_id TEXT NOT NULL
        REFERENCES gitops_engine_instances(gitopsengineinstance_id),
    PRIMARY KEY (
        clusteraccess_user_id,
        clusteraccess_managed_environment_id,
        clusteraccess_gitops_engine_instance_id
    )
);

CREATE TABLE IF NOT EXISTS applications (
    application_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    spec_field TEXT NOT NULL,
    engine_instance_inst_id TEXT NOT NULL
        REFERENCES gitops_engine_instances(gitopsengineinstance_id),
    managed_environment_id TEXT NOT NULL
        REFERENCES managed_environments(managedenvironment_id)
);

CREATE TABLE IF NOT EXISTS application_states (
    applicationstate_application_id TEXT PRIMARY KEY
        REFERENCES applications(application_id),
    health TEXT NOT NULL,
    sync_status TEXT NOT NULL,
    revision TEXT,
    message TEXT
);

CREATE TABLE IF NOT EXISTS operations (
    operation_id TEXT PRIMARY KEY,
    instance_id TEXT NOT NULL
        REFERENCES gitops_engine_instances(gitopsengineinstance_id),
    resource_id TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    state TEXT NOT NULL,
    human_readable_state TEXT,
    created_on TEXT NOT NULL,
    last_state_update TEXT NOT NULL,
    operation_owner_user_id TEXT NOT NULL
        REFERENCES cluster_users(clusteruser_id)
);

CREATE TABLE IF NOT EXISTS deployment_to_application_mappings (
    deploymenttoapplicationmapping_uid_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    namespace TEXT NOT NULL,
    namespace_uid TEXT NOT NULL,
    application_id TEXT NOT NULL
        REFERENCES applications(application_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_cluster_access_user
    ON cluster_access(clusteraccess_user_id);
CREATE INDEX IF NOT EXISTS idx_cluster_access_env
    ON cluster_access(clusteraccess_managed_environment_id);
CREATE INDEX IF NOT EXISTS idx_cluster_access_instance
    ON cluster_access(clusteraccess_gitops_engine_instance_id);
CREATE INDEX IF NOT EXISTS idx_engine_instances_cluster
    ON gitops_engine_instances(enginecluster_id);
CREATE INDEX IF NOT EXISTS idx_engine_clusters_creds
    ON gitops_engine_clusters(clustercredentials_id);
CREATE INDEX IF NOT EXISTS idx_managed_envs_creds
    ON managed_environments(clustercredentials_id);
CREATE INDEX IF NOT EXISTS idx_applications_env_instance
    ON applications(managed_environment_id, engine_instance_inst_id);
CREATE INDEX IF NOT EXISTS idx_operations_owner
    ON operations(operation_owner_user_id);
CREATE INDEX IF NOT EXISTS idx_dtam_application
    ON deployment_to_application_mappings(application_id);
"#;
