//! Common test utilities and the shared entity fixture

use data_gateway::config::Config;
use data_gateway::contract::{Projection, RequestContext};
use data_gateway::domain::Gateway;
use data_gateway::infra::storage::{MemoryStorage, RelationDef, TableSchema};
use data_gateway::ModelRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Entity set mirroring the platform's task/project domain:
/// User, Task, Comment, Project.
pub struct TestHarness {
    pub gateway: Gateway,
    pub storage: Arc<MemoryStorage>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[allow(dead_code)]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_config(Config { cache_ttl: ttl })
    }

    fn with_config(config: Config) -> Self {
        init_tracing();
        let storage = MemoryStorage::new();
        let users = storage.define(
            "User",
            TableSchema {
                unique_fields: vec!["email".to_string()],
                required_fields: Vec::new(),
                relations: Vec::new(),
            },
        );
        let tasks = storage.define(
            "Task",
            TableSchema {
                unique_fields: Vec::new(),
                required_fields: vec!["title".to_string(), "user_id".to_string()],
                relations: vec![RelationDef {
                    name: "user".to_string(),
                    entity: "User".to_string(),
                    fk_field: "user_id".to_string(),
                }],
            },
        );
        let comments = storage.define(
            "Comment",
            TableSchema {
                unique_fields: Vec::new(),
                required_fields: vec!["body".to_string(), "user_id".to_string()],
                relations: vec![RelationDef {
                    name: "user".to_string(),
                    entity: "User".to_string(),
                    fk_field: "user_id".to_string(),
                }],
            },
        );
        let projects = storage.define(
            "Project",
            TableSchema {
                unique_fields: vec!["name".to_string()],
                required_fields: vec!["name".to_string(), "owner_id".to_string()],
                relations: vec![RelationDef {
                    name: "owner".to_string(),
                    entity: "User".to_string(),
                    fk_field: "owner_id".to_string(),
                }],
            },
        );

        let registry = ModelRegistry::builder()
            .register("User", users)
            .register("Task", tasks)
            .register("Comment", comments)
            .register("Project", projects)
            .build();

        Self {
            gateway: Gateway::with_config(Arc::new(registry), config),
            storage,
        }
    }

    /// Seed a user record and return it
    pub async fn seed_user(&self, id: &str) -> Value {
        self.gateway
            .create(
                "User",
                json!({"id": id, "email": format!("{id}@example.com"), "name": id}),
                Projection::default(),
                &RequestContext::anonymous(),
            )
            .await
            .expect("seeding a user should succeed")
    }

    /// Seed a task owned by `user_id` and return it
    #[allow(dead_code)]
    pub async fn seed_task(&self, id: &str, user_id: &str, title: &str) -> Value {
        self.gateway
            .create(
                "Task",
                json!({"id": id, "title": title, "user_id": user_id}),
                Projection::default(),
                &RequestContext::anonymous(),
            )
            .await
            .expect("seeding a task should succeed")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
