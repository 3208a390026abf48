use super::ResourceId;
use crate::client::{RequestOption, Response, SwarmClient, API_V10_PATH};
use crate::types::workflow::{swarm_group, DEFAULT_UPDATE_DESCRIPTION};
use crate::types::{ListWorkflowsOptions, Workflow};
use crate::Result;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

/// Workflow holding the global settings.
const GLOBAL_WORKFLOW: u64 = 0;

#[derive(Deserialize)]
struct WorkflowList {
    #[serde(default)]
    workflows: Vec<Workflow>,
}

#[derive(Deserialize)]
struct WorkflowEnvelope {
    workflow: Workflow,
}

#[derive(Deserialize)]
struct UpdateEnvelope {
    data: WorkflowList,
}

/// Workflow endpoints. Reads go to v9, updates to the v10 API.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowsService<'a> {
    client: &'a SwarmClient,
}

impl<'a> WorkflowsService<'a> {
    pub(crate) fn new(client: &'a SwarmClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        opt: &ListWorkflowsOptions,
        options: &[RequestOption],
    ) -> Result<(Vec<Workflow>, Response)> {
        let req = self
            .client
            .new_request(Method::GET, "workflows", Some(opt), options)?;
        let (body, resp): (WorkflowList, _) = self.client.execute(req).await?;
        Ok((body.workflows, resp))
    }

    pub async fn get(
        &self,
        id: impl Into<ResourceId>,
        options: &[RequestOption],
    ) -> Result<(Workflow, Response)> {
        let path = format!("workflows/{}", id.into().escaped());
        let req = self
            .client
            .new_request::<()>(Method::GET, &path, None, options)?;
        let (body, resp): (WorkflowEnvelope, _) = self.client.execute(req).await?;
        Ok((body.workflow, resp))
    }

    /// Replace a workflow through the v10 endpoint.
    ///
    /// An empty description is sent as [`DEFAULT_UPDATE_DESCRIPTION`].
    /// Returns the workflows echoed back by the server.
    pub async fn update(
        &self,
        id: impl Into<ResourceId>,
        workflow: &Workflow,
        options: &[RequestOption],
    ) -> Result<(Vec<Workflow>, Response)> {
        let path = format!("{}workflows/{}", API_V10_PATH, id.into().escaped());
        let body: Cow<'_, Workflow> = if workflow.description.is_empty() {
            let mut wf = workflow.clone();
            wf.description = DEFAULT_UPDATE_DESCRIPTION.to_string();
            Cow::Owned(wf)
        } else {
            Cow::Borrowed(workflow)
        };
        let req = self
            .client
            .new_request(Method::PUT, &path, Some(&*body), options)?;
        let (body, resp): (UpdateEnvelope, _) = self.client.execute(req).await?;
        Ok((body.data.workflows, resp))
    }

    /// Set the global group and user exclusion lists.
    ///
    /// Group names are prefixed with `swarm-group-` as Swarm expects. The
    /// other global settings are read first and sent back unchanged.
    pub async fn set_global_exclusions<G, U>(
        &self,
        groups: &[G],
        users: &[U],
        options: &[RequestOption],
    ) -> Result<Response>
    where
        G: AsRef<str>,
        U: AsRef<str>,
    {
        let (mut workflow, _) = self.get(GLOBAL_WORKFLOW, options).await?;

        let groups: Vec<Value> = groups
            .iter()
            .map(|g| Value::String(swarm_group(g.as_ref())))
            .collect();
        let users: Vec<Value> = users
            .iter()
            .map(|u| Value::String(u.as_ref().to_string()))
            .collect();
        debug!(
            groups = groups.len(),
            users = users.len(),
            "updating global exclusions"
        );
        workflow.group_exclusions.rule = Value::Array(groups);
        workflow.user_exclusions.rule = Value::Array(users);

        let (_, resp) = self.update(GLOBAL_WORKFLOW, &workflow, options).await?;
        Ok(resp)
    }
}
