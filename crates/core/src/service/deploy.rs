//! # Deployment Target
//!
//! Where the finished deliverable is published. The factory only simulates
//! deployment; the default target derives a preview URL from the project
//! name.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::state::{slugify, Artifact};

#[async_trait]
pub trait DeploymentTarget: Send + Sync {
    /// Publish the artifacts and return the public URL
    async fn deploy(&self, project_name: &str, files: &[Artifact]) -> Result<String, ForgeError>;
}

/// `https://<slug>.<domain>`
#[derive(Debug, Clone)]
pub struct PreviewDeployment {
    domain: String,
}

impl PreviewDeployment {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim_matches('.').to_string(),
        }
    }

    pub fn url_for(&self, project_name: &str) -> String {
        format!("https://{}.{}", slugify(project_name), self.domain)
    }
}

impl Default for PreviewDeployment {
    fn default() -> Self {
        Self::new("vercel.app")
    }
}

#[async_trait]
impl DeploymentTarget for PreviewDeployment {
    async fn deploy(&self, project_name: &str, files: &[Artifact]) -> Result<String, ForgeError> {
        let url = self.url_for(project_name);
        tracing::info!(%url, files = files.len(), "Preview deployment published");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_url() {
        let target = PreviewDeployment::new(".vercel.app");
        let url = target.deploy("Hive Mind", &[]).await.unwrap();
        assert_eq!(url, "https://hive-mind.vercel.app");
    }
}
