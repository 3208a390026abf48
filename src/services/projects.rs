use super::ResourceId;
use crate::client::{RequestOption, Response, SwarmClient};
use crate::types::{CreateProjectOptions, ListProjectsOptions, Project, UpdateProjectOptions};
use crate::Result;
use reqwest::Method;
use serde::Deserialize;

#[derive(Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

/// Project endpoints (`projects`, `projects/{id}`).
#[derive(Debug, Clone, Copy)]
pub struct ProjectsService<'a> {
    client: &'a SwarmClient,
}

impl<'a> ProjectsService<'a> {
    pub(crate) fn new(client: &'a SwarmClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        opt: &ListProjectsOptions,
        options: &[RequestOption],
    ) -> Result<(Vec<Project>, Response)> {
        let req = self
            .client
            .new_request(Method::GET, "projects", Some(opt), options)?;
        let (body, resp): (ProjectList, _) = self.client.execute(req).await?;
        Ok((body.projects, resp))
    }

    pub async fn get(
        &self,
        id: impl Into<ResourceId>,
        options: &[RequestOption],
    ) -> Result<(Project, Response)> {
        let path = format!("projects/{}", id.into().escaped());
        let req = self
            .client
            .new_request::<()>(Method::GET, &path, None, options)?;
        let (body, resp): (ProjectEnvelope, _) = self.client.execute(req).await?;
        Ok((body.project, resp))
    }

    pub async fn create(
        &self,
        opt: &CreateProjectOptions,
        options: &[RequestOption],
    ) -> Result<(Project, Response)> {
        let req = self
            .client
            .new_request(Method::POST, "projects", Some(opt), options)?;
        let (body, resp): (ProjectEnvelope, _) = self.client.execute(req).await?;
        Ok((body.project, resp))
    }

    pub async fn update(
        &self,
        id: impl Into<ResourceId>,
        opt: &UpdateProjectOptions,
        options: &[RequestOption],
    ) -> Result<(Project, Response)> {
        let path = format!("projects/{}", id.into().escaped());
        let req = self
            .client
            .new_request(Method::PATCH, &path, Some(opt), options)?;
        let (body, resp): (ProjectEnvelope, _) = self.client.execute(req).await?;
        Ok((body.project, resp))
    }

    pub async fn delete(
        &self,
        id: impl Into<ResourceId>,
        options: &[RequestOption],
    ) -> Result<Response> {
        let path = format!("projects/{}", id.into().escaped());
        let req = self
            .client
            .new_request::<()>(Method::DELETE, &path, None, options)?;
        self.client.execute_empty(req).await
    }
}
