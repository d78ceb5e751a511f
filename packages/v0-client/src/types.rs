//! Request and response types for the v0 Platform API.

use serde::{Deserialize, Serialize};

/// A v0 project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for creating a project.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
}

/// Model configuration for chat creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfiguration {
    pub model_id: String,
    pub image_generations: bool,
    pub thinking: bool,
}

/// Request body for creating a chat.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub system: String,
    pub message: String,
    pub model_configuration: ModelConfiguration,
    pub project_id: String,
}

/// A generated version attached to a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatVersion {
    pub id: String,
}

/// A v0 chat. `latest_version` is absent until the platform has
/// finished generating at least one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub latest_version: Option<ChatVersion>,
}

/// A v0 deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub inspector_url: String,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Request body for creating a deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub project_id: String,
    pub chat_id: String,
    pub version_id: String,
}

/// Paged listing wrapper used by the deployments endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentList {
    #[serde(default)]
    pub data: Vec<Deployment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_without_version_deserializes() {
        let chat: Chat = serde_json::from_str(r#"{"id": "chat_1"}"#).unwrap();
        assert!(chat.latest_version.is_none());
    }

    #[test]
    fn chat_with_version_deserializes() {
        let chat: Chat =
            serde_json::from_str(r#"{"id": "chat_1", "latestVersion": {"id": "v_9"}}"#).unwrap();
        assert_eq!(chat.latest_version.unwrap().id, "v_9");
    }

    #[test]
    fn create_chat_request_uses_camel_case() {
        let req = CreateChatRequest {
            system: "sys".into(),
            message: "hello".into(),
            model_configuration: ModelConfiguration {
                model_id: "v0-1.5-sm".into(),
                image_generations: false,
                thinking: false,
            },
            project_id: "prj_1".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("modelConfiguration").is_some());
        assert_eq!(json["modelConfiguration"]["modelId"], "v0-1.5-sm");
        assert_eq!(json["projectId"], "prj_1");
    }

    #[test]
    fn deployment_list_defaults_to_empty() {
        let list: DeploymentList = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_empty());
    }
}
