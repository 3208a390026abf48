//! Project endpoints against a mockito server

use crate::integration::mock_server::MockServerFixture;
use mockito::Matcher;
use std::collections::BTreeMap;
use swarm_client::error_payload::UNKNOWN_ERROR_FORMAT;
use swarm_client::types::{BranchOptions, DefaultsOptions, ReviewerOptions};
use swarm_client::{CreateProjectOptions, Error, ListProjectsOptions, UpdateProjectOptions};

const PROJECT_LIST: &str = r#"{
  "projects": [
    {
      "id": "xxx-mainline",
      "branches": [
        {
          "id": "client",
          "name": "Client",
          "workflow": "6",
          "paths": [],
          "defaults": {"reviewers": {"users": {"eyotang": [], "tangyongqiang": []}}},
          "minimumUpVotes": null,
          "retainDefaultReviewers": false,
          "moderators": [],
          "moderators-groups": []
        }
      ],
      "members": ["eyotang", "tangyq"],
      "name": "Exxx_Mainline"
    },
    {
      "id": "main",
      "branches": [
        {
          "id": "artdev",
          "name": "ArtDev",
          "workflow": "6",
          "paths": [],
          "defaults": {"reviewers": {"users": {"eyotang": {"required": true}, "tangyongqiang": []}}}
        }
      ],
      "deleted": false,
      "description": "",
      "members": ["eyotang", "tangyongqiang", "swarm"],
      "name": "DMXX.YYY",
      "owners": ["root"]
    }
  ]
}"#;

const PROJECT: &str = r#"{
  "project": {
    "id": "xxx-mainline",
    "name": "Exxx_Mainline",
    "description": null,
    "members": ["eyotang"],
    "branches": []
  }
}"#;

#[tokio::test]
async fn list_projects_decodes_envelope() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("GET", "/api/v9/projects", 200, PROJECT_LIST)
        .await;
    let client = fixture.client();

    let (projects, resp) = client
        .projects()
        .list(&ListProjectsOptions::default(), &[])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, "xxx-mainline");
    assert_eq!(projects[0].members, vec!["eyotang", "tangyq"]);
    assert_eq!(projects[0].branches[0].workflow, "6");
    assert_eq!(projects[1].name, "DMXX.YYY");
    assert!(projects[1].branches[0].defaults.reviewers.is_required("eyotang"));
    assert!(!projects[1].branches[0].defaults.reviewers.is_required("tangyongqiang"));
}

#[tokio::test]
async fn list_options_become_query_parameters() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", "/api/v9/projects")
            .match_query(Matcher::UrlEncoded("fields".into(), "id,name".into()))
            .with_status(200)
            .with_body(r#"{"projects": []}"#)
            .create_async()
            .await
    };
    let client = fixture.client();

    let opts = ListProjectsOptions {
        fields: Some("id,name".into()),
        workflow: None,
    };
    let (projects, _) = client.projects().list(&opts, &[]).await.unwrap();
    mock.assert_async().await;
    assert!(projects.is_empty());
}

#[tokio::test]
async fn get_project_escapes_identifier() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("GET", "/api/v9/projects/diaspora%2Fdiaspora", 200, PROJECT)
        .await;
    let client = fixture.client();

    let (project, _) = client
        .projects()
        .get("diaspora/diaspora", &[])
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(project.id, "xxx-mainline");
    assert_eq!(project.description, None);
}

#[tokio::test]
async fn create_project_posts_nested_form() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_form(
            "POST",
            "/api/v9/projects",
            &[
                ("name", "got-dev"),
                ("members[0]", "eyotang"),
                ("branches[0][name]", "Client"),
                ("branches[0][workflow]", "6"),
                ("branches[0][defaults][reviewers][alice][required]", "true"),
            ],
            PROJECT,
        )
        .await;
    let client = fixture.client();

    let mut reviewers = BTreeMap::new();
    reviewers.insert(
        "alice".to_string(),
        ReviewerOptions {
            required: Some("true".into()),
        },
    );
    let opts = CreateProjectOptions {
        name: Some("got-dev".into()),
        members: vec!["eyotang".into()],
        branches: vec![BranchOptions {
            name: Some("Client".into()),
            workflow: Some("6".into()),
            defaults: Some(DefaultsOptions { reviewers }),
            ..Default::default()
        }],
    };
    let (project, _) = client.projects().create(&opts, &[]).await.unwrap();
    mock.assert_async().await;
    assert_eq!(project.name, "Exxx_Mainline");
}

#[tokio::test]
async fn update_project_patches() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_form(
            "PATCH",
            "/api/v9/projects/xxx-mainline",
            &[("members[0]", "eyotang"), ("members[1]", "swarm")],
            PROJECT,
        )
        .await;
    let client = fixture.client();

    let opts = UpdateProjectOptions {
        members: vec!["eyotang".into(), "swarm".into()],
        ..Default::default()
    };
    client
        .projects()
        .update("xxx-mainline", &opts, &[])
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_project_returns_response() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("DELETE", "/api/v9/projects/main", 204, "")
        .await;
    let client = fixture.client();

    let resp = client.projects().delete("main", &[]).await.unwrap();
    mock.assert_async().await;
    assert_eq!(resp.status.as_u16(), 204);
}

#[tokio::test]
async fn dot_identifiers_are_refused_before_sending() {
    let fixture = MockServerFixture::new().await;
    let root = {
        let mut server = fixture.server.lock().await;
        server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await
    };
    let client = fixture.client();

    for id in ["..", "."] {
        let err = client.projects().delete(id, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{id}: {err:?}");
    }
    root.assert_async().await;
}

#[tokio::test]
async fn validation_error_is_flattened() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "POST",
            "/api/v9/projects",
            400,
            r#"{"details":{"branches":"Unknown user id(s): tangyongqiang"},"error":"Bad Request","isValid":false}"#,
        )
        .await;
    let client = fixture.client();

    let err = client
        .projects()
        .create(&CreateProjectOptions::default(), &[])
        .await
        .unwrap_err();

    let api = err.api().expect("api error");
    assert_eq!(api.response.status.as_u16(), 400);
    assert_eq!(
        api.message,
        "{details: {branches: Unknown user id(s): tangyongqiang}}, {error: Bad Request}, {isValid: failed to parse unexpected error type: bool}"
    );
    let shown = err.to_string();
    assert!(shown.starts_with("POST http://"), "{shown}");
    assert!(shown.contains("/api/v9/projects: 400 {details:"), "{shown}");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn non_json_error_body_uses_sentinel() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json("GET", "/api/v9/projects/missing", 404, "<html>not found</html>")
        .await;
    let client = fixture.client();

    let err = client.projects().get("missing", &[]).await.unwrap_err();
    match err {
        Error::Api(api) => {
            assert_eq!(api.message, UNKNOWN_ERROR_FORMAT);
            assert_eq!(&api.body[..], b"<html>not found</html>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
