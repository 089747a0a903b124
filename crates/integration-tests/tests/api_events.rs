use axum::http::StatusCode;
use domains::{Actor, Role};
use integration_tests::{alumni, alumni_of, event_json, guest, id_of, platform_admin, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_event(app: &TestApp, organizer: &Actor, body: Value) -> Value {
    let (status, body) = app.post("/api/events", &app.token(organizer), body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["event"].clone()
}

#[tokio::test]
async fn capacity_is_enforced_and_cancellation_frees_a_seat() {
    let app = TestApp::new();
    let organizer = alumni();
    let event = create_event(&app, &organizer, event_json("public", Some(2), 5000.0)).await;
    let register = format!("/api/events/{}/register", id_of(&event));
    let (a, b, c) = (alumni(), alumni(), alumni());

    let (status, body) = app.post(&register, &app.token(&a), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully registered for event");
    assert_eq!(body["requiresPayment"], true);
    assert_eq!(body["paymentStatus"], "pending");

    let (status, body) = app.post(&register, &app.token(&a), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You are already registered for this event");

    app.post(&register, &app.token(&b), json!({})).await;
    let (status, body) = app.post(&register, &app.token(&c), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Event has reached maximum capacity");

    let (status, _) = app
        .post(
            &format!("/api/events/{}/cancel-registration", id_of(&event)),
            &app.token(&b),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post(&register, &app.token(&c), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get_as(&format!("/api/events/{}", id_of(&event)), &app.token(&organizer))
        .await;
    let roster = body["event"]["attendees"].as_array().unwrap();
    assert_eq!(roster.len(), 3);
    let cancelled = roster
        .iter()
        .find(|entry| entry["userId"] == json!(b.id))
        .unwrap();
    assert_eq!(cancelled["status"], "cancelled");
}

#[tokio::test]
async fn free_events_need_no_payment() {
    let app = TestApp::new();
    let event = create_event(&app, &alumni(), event_json("public", None, 0.0)).await;
    let (status, body) = app
        .post(
            &format!("/api/events/{}/register", id_of(&event)),
            &app.token(&alumni()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requiresPayment"], false);
    assert_eq!(body["paymentStatus"], "not_applicable");
}

#[tokio::test]
async fn cancelling_without_registration_is_not_found() {
    let app = TestApp::new();
    let event = create_event(&app, &alumni(), event_json("public", None, 0.0)).await;
    let (status, body) = app
        .post(
            &format!("/api/events/{}/cancel-registration", id_of(&event)),
            &app.token(&alumni()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Registration not found");
}

#[tokio::test]
async fn anonymous_visitors_only_see_public_events() {
    let app = TestApp::new();
    let organizer = alumni();
    let public = create_event(&app, &organizer, event_json("public", None, 0.0)).await;
    let members = create_event(&app, &organizer, event_json("alumni_only", None, 0.0)).await;

    let (status, body) = app.get("/api/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalEvents"], 1);
    assert_eq!(body["events"][0]["id"], public["id"]);

    let (status, _) = app.get(&format!("/api/events/{}", id_of(&members))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get_as(&format!("/api/events/{}", id_of(&members)), &app.token(&guest()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "This event is for alumni only");

    let (_, body) = app.get_as("/api/events", &app.token(&alumni())).await;
    assert_eq!(body["totalEvents"], 2);
}

#[tokio::test]
async fn school_restricted_events_follow_membership() {
    let app = TestApp::new();
    let admin = platform_admin();
    let school = app
        .create_school(&app.token(&admin), "Federal Government College Ijanikin", &[])
        .await;
    let school_id: Uuid = id_of(&school).parse().unwrap();

    let mut body = event_json("school_alumni_only", None, 0.0);
    body["schoolId"] = json!(school_id);
    let event = create_event(&app, &alumni_of(school_id), body).await;
    assert_eq!(event["isSchoolSpecific"], true);
    let uri = format!("/api/events/{}", id_of(&event));

    let (status, _) = app.get_as(&uri, &app.token(&alumni_of(school_id))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get_as(&uri, &app.token(&alumni())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("{uri}/register"),
            &app.token(&alumni_of(Uuid::now_v7())),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .get(&format!("/api/events?school={school_id}"))
        .await;
    assert_eq!(body["totalEvents"], 0);
    let (_, body) = app
        .get_as(&format!("/api/events?school={school_id}"), &app.token(&admin))
        .await;
    assert_eq!(body["totalEvents"], 1);
}

#[tokio::test]
async fn events_need_an_active_school() {
    let app = TestApp::new();
    let mut body = event_json("public", None, 0.0);
    body["schoolId"] = json!(Uuid::now_v7());
    let (status, body) = app.post("/api/events", &app.token(&alumni()), body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "School not found");
}

#[tokio::test]
async fn guests_cannot_organize() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/events", &app.token(&guest()), event_json("public", None, 0.0))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let app = TestApp::new();
    let mut body = event_json("public", None, 0.0);
    body["endDate"] = json!(chrono::Utc::now());
    let (status, body) = app.post("/api/events", &app.token(&alumni()), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "End date cannot be before start date");
}

#[tokio::test]
async fn invitations_add_only_new_attendees() {
    let app = TestApp::new();
    let organizer = alumni();
    let event = create_event(&app, &organizer, event_json("invite_only", None, 0.0)).await;
    let uri = format!("/api/events/{}", id_of(&event));
    let (x, y) = (Uuid::now_v7(), Uuid::now_v7());

    let (status, _) = app
        .post(&format!("{uri}/invite"), &app.token(&alumni()), json!({ "userIds": [x] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(&format!("{uri}/invite"), &app.token(&organizer), json!({ "userIds": [x, x] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newAttendees"], json!([x]));
    assert_eq!(body["message"], "Successfully invited 1 users to the event");

    let (_, body) = app
        .post(&format!("{uri}/invite"), &app.token(&organizer), json!({ "userIds": [x, y] }))
        .await;
    assert_eq!(body["newAttendees"], json!([y]));

    let (status, body) = app
        .post(&format!("{uri}/invite"), &app.token(&organizer), json!({ "userIds": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User IDs are required");

    // Invitees can now see the event; others cannot.
    let invitee = Actor::new(x, Role::Alumni, None);
    let (status, _) = app.get_as(&uri, &app.token(&invitee)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get_as(&uri, &app.token(&alumni())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn organizer_updates_attendee_payment() {
    let app = TestApp::new();
    let organizer = alumni();
    let attendee = alumni();
    let event = create_event(&app, &organizer, event_json("public", None, 2500.0)).await;
    let uri = format!("/api/events/{}", id_of(&event));
    app.post(&format!("{uri}/register"), &app.token(&attendee), json!({}))
        .await;

    let patch = json!({ "status": "confirmed", "paymentStatus": "completed", "paymentReference": "PSK-001" });
    let attendee_uri = format!("{uri}/attendee/{}", attendee.id);
    let (status, _) = app
        .post(&attendee_uri, &app.token(&attendee), patch.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&attendee_uri, &app.token(&organizer), patch).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&uri).await;
    let entry = &body["event"]["attendees"][0];
    assert_eq!(entry["status"], "confirmed");
    assert_eq!(entry["paymentStatus"], "completed");
    assert_eq!(entry["paymentReference"], "PSK-001");

    let (status, _) = app
        .post(
            &format!("{uri}/attendee/{}", Uuid::now_v7()),
            &app.token(&organizer),
            json!({ "status": "attended" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owners_update_or_delete() {
    let app = TestApp::new();
    let organizer = alumni();
    let event = create_event(&app, &organizer, event_json("public", None, 0.0)).await;
    let uri = format!("/api/events/{}", id_of(&event));

    let (status, _) = app
        .put(&uri, &app.token(&alumni()), json!({ "title": "Hijacked" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&uri, &app.token(&organizer), json!({ "title": "Founders' Day Gala" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["title"], "Founders' Day Gala");

    let (status, _) = app.delete(&uri, &app.token(&platform_admin())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_by_type_and_status() {
    let app = TestApp::new();
    let organizer = alumni();
    create_event(&app, &organizer, event_json("public", None, 0.0)).await;
    let mut workshop = event_json("public", None, 0.0);
    workshop["eventType"] = json!("Workshop");
    create_event(&app, &organizer, workshop).await;
    let mut draft = event_json("public", None, 0.0);
    draft["status"] = json!("draft");
    create_event(&app, &organizer, draft).await;

    let (_, body) = app.get("/api/events?type=Workshop").await;
    assert_eq!(body["totalEvents"], 1);
    let (_, body) = app.get("/api/events").await;
    assert_eq!(body["totalEvents"], 2);
    let (_, body) = app.get("/api/events?status=draft").await;
    assert_eq!(body["totalEvents"], 1);
    let (_, body) = app.get("/api/events?limit=1&page=2").await;
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalPages"], 2);
}
