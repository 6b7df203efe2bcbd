//! Typed platform endpoints.

use agentic_core::{
    Product, ProductId, Project, ProjectId, Spec, SpecId, SubTask, SubTaskId, Task, TaskId,
    TaskStatus, User,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::transport::PlatformClient;

/// Current-user endpoint.
pub const ME_PATH: &str = "/api/v1/me";

/// Success envelope wrapping every platform payload.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    /// Payload
    pub data: T,
}

impl PlatformClient {
    async fn get_data<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.get::<DataEnvelope<T>>(path).await?.data)
    }

    /// Account behind the configured key.
    pub async fn current_user(&self) -> Result<User> {
        self.get_data(ME_PATH).await
    }

    /// All projects visible to the key.
    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.get_data("/api/v1/projects").await
    }

    /// Products of a project.
    pub async fn products(&self, project_id: &ProjectId) -> Result<Vec<Product>> {
        self.get_data(&format!("/api/v1/projects/{project_id}/products"))
            .await
    }

    /// Specs of a product.
    pub async fn specs(&self, product_id: &ProductId) -> Result<Vec<Spec>> {
        self.get_data(&format!("/api/v1/products/{product_id}/specs"))
            .await
    }

    /// Tasks of a spec.
    pub async fn tasks(&self, spec_id: &SpecId) -> Result<Vec<Task>> {
        self.get_data(&format!("/api/v1/specs/{spec_id}/tasks")).await
    }

    /// A single task.
    pub async fn task(&self, task_id: &TaskId) -> Result<Task> {
        self.get_data(&format!("/api/v1/tasks/{task_id}")).await
    }

    /// Sub-tasks of a task.
    pub async fn subtasks(&self, task_id: &TaskId) -> Result<Vec<SubTask>> {
        self.get_data(&format!("/api/v1/tasks/{task_id}/subtasks"))
            .await
    }

    /// Set a task's status.
    pub async fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        let _: serde_json::Value = self
            .patch(&format!("/api/v1/tasks/{task_id}"), &json!({ "status": status }))
            .await?;
        info!("Task {} status set to {}", task_id, status);
        Ok(())
    }

    /// Set a sub-task's status.
    pub async fn update_subtask_status(&self, subtask_id: &SubTaskId, status: TaskStatus) -> Result<()> {
        let _: serde_json::Value = self
            .patch(&format!("/api/v1/subtasks/{subtask_id}"), &json!({ "status": status }))
            .await?;
        info!("Subtask {} status set to {}", subtask_id, status);
        Ok(())
    }

    /// Validate raw strings, then set a task's status.
    ///
    /// An empty id or a status outside [`TaskStatus`] fails locally without
    /// touching the network.
    pub async fn set_task_status(&self, task_id: &str, status: &str) -> Result<()> {
        let task_id = TaskId::parse(task_id)?;
        let status: TaskStatus = status.parse()?;
        self.update_task_status(&task_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientConfig, ClientError};
    use agentic_core::ValidationError;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PlatformClient {
        PlatformClient::new(
            ClientConfig::new("ap_team_testkey123")
                .with_base_url(server.uri())
                .with_backoff(vec![Duration::from_millis(5)]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_tasks_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/specs/s1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "t1", "spec_id": "s1", "title": "First", "status": "planned"},
                    {"id": "t2", "spec_id": "s1", "title": "Second", "status": "processing", "checkpoint_mode": true}
                ]
            })))
            .mount(&server)
            .await;

        let tasks = client_for(&server)
            .tasks(&SpecId::parse("s1").unwrap())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].status, TaskStatus::Processing);
        assert_eq!(tasks[1].checkpoint_mode, Some(true));
    }

    #[tokio::test]
    async fn test_update_task_status_patches_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/tasks/t7"))
            .and(body_json(json!({"status": "awaiting_feedback"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update_task_status(&TaskId::parse("t7").unwrap(), TaskStatus::AwaitingFeedback)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_task_status_validates_before_network() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.set_task_status("t1", "done").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::UnknownStatus(_))
        ));
        let err = client.set_task_status("", "pending").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::EmptyId(_))));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such task"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .task(&TaskId::parse("missing").unwrap())
            .await
            .unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status, 404);
                assert_eq!(api.message, "no such task");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
