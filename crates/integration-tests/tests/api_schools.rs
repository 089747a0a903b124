use std::sync::Arc;

use axum::http::StatusCode;
use domains::{Actor, Role};
use integration_tests::{alumni, id_of, platform_admin, school_json, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn platform_admins_manage_the_directory() {
    let app = TestApp::new();
    let admin = platform_admin();
    let token = app.token(&admin);

    let (status, _) = app
        .post("/api/schools", &app.token(&alumni()), school_json("Queens College", &[]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let school = app.create_school(&token, "Queens College", &[]).await;
    assert_eq!(school["adminUsers"], json!([admin.id]));
    assert_eq!(school["isActive"], true);
    assert_eq!(school["type"], "Federal Government College");

    let (status, body) = app
        .post("/api/schools", &token, school_json("Queens College", &[]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "School with this name already exists");

    let uri = format!("/api/schools/{}", id_of(&school));
    let (status, body) = app
        .put(&uri, &token, json!({ "description": "Yaba, since 1927", "foundedYear": 1927 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["school"]["foundedYear"], 1927);

    let (status, body) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "School deleted successfully");
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/api/schools").await;
    assert_eq!(body["schools"], json!([]));
}

#[tokio::test]
async fn listing_is_by_name_and_region() {
    let app = TestApp::new();
    let token = app.token(&platform_admin());
    app.create_school(&token, "Kings College", &[]).await;
    app.create_school(&token, "Federal Science College", &[]).await;
    let mut north = school_json("Federal Government College Kano", &[]);
    north["location"]["region"] = json!("North West");
    let (status, _) = app.post("/api/schools", &token, north).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/schools").await;
    let names: Vec<&str> = body["schools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["Federal Government College Kano", "Federal Science College", "Kings College"]
    );

    let (status, body) = app.get("/api/schools/region/North%20West").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schools"].as_array().unwrap().len(), 1);

    let (status, body) = app.get("/api/schools/region/Atlantis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown region: Atlantis");
}

#[tokio::test]
async fn school_admins_curate_their_admin_set() {
    let app = TestApp::new();
    let platform = platform_admin();
    let admin_id = Uuid::now_v7();
    let school = app
        .create_school(&app.token(&platform), "Federal Government Girls College", &[admin_id])
        .await;
    let school_id: Uuid = id_of(&school).parse().unwrap();
    let school_admin = Actor::new(admin_id, Role::SchoolAdmin, Some(school_id));
    let token = app.token(&school_admin);
    let deputy = Uuid::now_v7();

    let (status, body) = app
        .post("/api/schools/admin/add", &token, json!({ "schoolId": school_id, "userId": deputy }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["school"]["adminUsers"], json!([admin_id, deputy]));

    let (status, body) = app
        .post(
            "/api/schools/admin/remove",
            &token,
            json!({ "schoolId": school_id, "userId": admin_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot remove yourself as admin");

    let (status, body) = app
        .post(
            "/api/schools/admin/remove",
            &token,
            json!({ "schoolId": school_id, "userId": deputy }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["school"]["adminUsers"], json!([admin_id]));

    let (status, body) = app
        .post(
            "/api/schools/admin/remove",
            &app.token(&platform),
            json!({ "schoolId": school_id, "userId": admin_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot remove the last admin from a school");

    // Another school's admin has no say here.
    let stranger = Actor::new(Uuid::now_v7(), Role::SchoolAdmin, None);
    let (status, _) = app
        .put(
            &format!("/api/schools/{school_id}"),
            &app.token(&stranger),
            json!({ "description": "not mine" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Only platform admins deactivate.
    let (status, _) = app.delete(&format!("/api/schools/{school_id}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_admit_one_school_per_name() {
    let app = Arc::new(TestApp::new());
    let token = app.token(&platform_admin());
    let requests: Vec<_> = (0..16)
        .map(|_| {
            let (app, token) = (app.clone(), token.clone());
            tokio::spawn(async move {
                app.post("/api/schools", &token, school_json("Kings College Lagos", &[]))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for request in requests {
        let (status, body) = request.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => {
                assert_eq!(body["message"], "School with this name already exists")
            }
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(created, 1);

    let (_, body) = app.get("/api/schools").await;
    assert_eq!(body["schools"].as_array().unwrap().len(), 1);
}
