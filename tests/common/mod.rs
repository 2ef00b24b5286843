#![allow(dead_code)]

use chrono::Utc;
use gitops_db::store::{SqliteStore, Store};
use gitops_db::types::*;
use tempfile::TempDir;

pub const TEST_USER: &str = "test-user";
pub const OTHER_USER: &str = "test-another-user";

pub struct TestContext {
    // Held so the database file outlives the store.
    _temp_dir: TempDir,
    pub store: SqliteStore,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("gitops.db")).expect("open store");
        store.initialize().expect("initialize schema");
        create_test_users(&store);

        Self {
            _temp_dir: temp_dir,
            store,
        }
    }
}

/// Creates the `TEST_USER` and `OTHER_USER` cluster users.
pub fn create_test_users(store: &dyn Store) {
    for id in [TEST_USER, OTHER_USER] {
        store
            .create_cluster_user(&ClusterUser {
                id: id.to_string(),
                user_name: id.to_string(),
            })
            .expect("create cluster user");
    }
}

pub struct SampleData {
    pub cluster_credentials: ClusterCredentials,
    pub managed_environment: ManagedEnvironment,
    pub engine_cluster: GitopsEngineCluster,
    pub engine_instance: GitopsEngineInstance,
    pub cluster_access: ClusterAccess,
}

pub fn cluster_credentials(id: &str) -> ClusterCredentials {
    ClusterCredentials {
        id: id.to_string(),
        host: "host".to_string(),
        kube_config: "kube-config".to_string(),
        kube_config_context: "kube-config-context".to_string(),
        serviceaccount_bearer_token: "serviceaccount_bearer_token".to_string(),
        serviceaccount_ns: "serviceaccount_ns".to_string(),
    }
}

pub fn generate_sample_data() -> SampleData {
    let cluster_credentials = cluster_credentials("test-cluster-creds-test");

    let managed_environment = ManagedEnvironment {
        id: "test-managed-env-914".to_string(),
        name: "my env".to_string(),
        clustercredentials_id: cluster_credentials.id.clone(),
    };

    let engine_cluster = GitopsEngineCluster {
        id: "test-fake-cluster-914".to_string(),
        clustercredentials_id: cluster_credentials.id.clone(),
    };

    let engine_instance = GitopsEngineInstance {
        id: "test-fake-engine-instance-id".to_string(),
        namespace_name: "test-fake-namespace".to_string(),
        namespace_uid: "test-fake-namespace-914".to_string(),
        engine_cluster_id: engine_cluster.id.clone(),
    };

    let cluster_access = ClusterAccess {
        user_id: TEST_USER.to_string(),
        managed_environment_id: managed_environment.id.clone(),
        gitops_engine_instance_id: engine_instance.id.clone(),
    };

    SampleData {
        cluster_credentials,
        managed_environment,
        engine_cluster,
        engine_instance,
        cluster_access,
    }
}

/// Creates credentials, an environment, an engine cluster and instance, and a
/// grant for `TEST_USER` on the (environment, instance) pair.
pub fn create_sample_data(store: &dyn Store) -> SampleData {
    let data = generate_sample_data();

    store
        .create_cluster_credentials(&data.cluster_credentials)
        .expect("create cluster credentials");
    store
        .create_managed_environment(&data.managed_environment)
        .expect("create managed environment");
    store
        .create_gitops_engine_cluster(&data.engine_cluster)
        .expect("create engine cluster");
    store
        .create_gitops_engine_instance(&data.engine_instance)
        .expect("create engine instance");
    store
        .create_cluster_access(&data.cluster_access)
        .expect("create cluster access");

    data
}

pub fn application(id: &str, data: &SampleData) -> Application {
    Application {
        id: id.to_string(),
        name: "my-application".to_string(),
        spec_field: "{}".to_string(),
        engine_instance_id: data.engine_instance.id.clone(),
        managed_environment_id: data.managed_environment.id.clone(),
    }
}

pub fn operation(id: &str, owner: &str, instance_id: &str) -> Operation {
    let now = Utc::now();
    Operation {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        resource_id: "fake resource id".to_string(),
        resource_type: OperationResourceType::GitopsEngineInstance,
        state: OperationState::Waiting,
        human_readable_state: None,
        created_on: now,
        last_state_update: now,
        owner_user_id: owner.to_string(),
    }
}
