
use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use uuid::Uuid;

use community_hub::{
    entities::{
        external_profile::{NewExternalProfileRequest, Platform, ReorderExternalProfilesRequest, UpdateExternalProfileRequest},
        user::User,
    },
    errors::AppError,
};
use test_utils::TestApp;

fn link(platform: Platform, handle: &str) -> NewExternalProfileRequest {
    NewExternalProfileRequest {
        platform,
        handle: handle.into(),
        url: None,
    }
}

async fn user_with_profiles(app: &TestApp) -> (User, Vec<Uuid>) {
    let user = app.store.add_user("Linked Person");
    let mut ids = Vec::new();

    for (platform, handle) in [(Platform::Github, "octocat"), (Platform::Gitlab, "tanuki"), (Platform::Dev, "writer")] {
        let profile = app.state.profile_handler
            .create_profile(user.id, link(platform, handle))
            .await
            .unwrap();
        ids.push(profile.id);
    }

    (user, ids)
}

#[actix_rt::test]
async fn profiles_are_appended_with_derived_urls() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;

    let profiles = app.state.profile_handler.list_for_user(user.id).await.unwrap();
    assert_eq!(profiles.iter().map(|p| p.id).collect::<Vec<_>>(), ids);
    assert_eq!(profiles.iter().map(|p| p.position).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(profiles[1].url, "https://gitlab.com/tanuki");
}

#[actix_rt::test]
async fn one_profile_per_platform() {
    let app = TestApp::new();
    let (user, _) = user_with_profiles(&app).await;

    let err = app.state.profile_handler
        .create_profile(user.id, link(Platform::Github, "someone-else"))
        .await
        .unwrap_err();

    match err {
        AppError::ValidationError(fields) => assert_eq!(fields[0].field, "platform"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[actix_rt::test]
async fn website_needs_an_explicit_url() {
    let app = TestApp::new();
    let user = app.store.add_user("Site Owner");

    let err = app.state.profile_handler
        .create_profile(user.id, link(Platform::Website, "home"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref fields) if fields[0].field == "url"));

    let created = app.state.profile_handler
        .create_profile(user.id, NewExternalProfileRequest {
            url: Some("https://example.org".into()),
            ..link(Platform::Website, "home")
        })
        .await
        .unwrap();
    assert_eq!(created.url, "https://example.org");
}

#[actix_rt::test]
async fn reorder_assigns_positions_in_submitted_order() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;
    let order = vec![ids[1], ids[2], ids[0]];

    app.state.profile_handler
        .reorder_profiles(user.id, ReorderExternalProfilesRequest { profile_ids: order.clone() })
        .await
        .unwrap();

    assert_eq!(app.store.profile_positions(user.id), vec![(order[0], 1), (order[1], 2), (order[2], 3)]);
}

#[actix_rt::test]
async fn reorder_with_duplicates_changes_nothing() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;
    let before = app.store.profile_positions(user.id);

    let err = app.state.profile_handler
        .reorder_profiles(user.id, ReorderExternalProfilesRequest { profile_ids: vec![ids[0], ids[0], ids[1]] })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(ref fields) if fields[0].field == "profile_ids"));
    assert_eq!(app.store.profile_positions(user.id), before);
}

#[actix_rt::test]
async fn changing_the_handle_rederives_the_url() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;

    let updated = app.state.profile_handler
        .update_profile(user.id, &ids[0].to_string(), UpdateExternalProfileRequest {
            handle: Some("hubot".into()),
            url: None,
        })
        .await
        .unwrap();

    assert_eq!(updated.handle, "hubot");
    assert_eq!(updated.url, "https://github.com/hubot");
    assert_eq!(updated.position, 1);
}

#[actix_rt::test]
async fn deleting_a_profile_compacts_positions() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;

    app.state.profile_handler.delete_profile(user.id, &ids[0].to_string()).await.unwrap();

    assert_eq!(app.store.profile_positions(user.id), vec![(ids[1], 1), (ids[2], 2)]);
}

#[actix_rt::test]
async fn malformed_profile_id_is_bad_request() {
    let app = TestApp::new();
    let user = app.store.add_user("Typo");

    let err = app.state.profile_handler.delete_profile(user.id, "not-a-uuid").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn reorder_endpoint_is_not_mistaken_for_an_id() {
    let app = TestApp::new();
    let (user, ids) = user_with_profiles(&app).await;
    let service = spawn_app!(app.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/external-profiles/reorder/")
        .insert_header(app.bearer(&user))
        .set_json(json!({ "profile_ids": [ids[2], ids[1], ids[0]] }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["id"], ids[2].to_string());
    assert_eq!(body[0]["position"], 1);
}

#[actix_rt::test]
async fn public_profile_listing_is_ordered() {
    let app = TestApp::new();
    let owner = app.store.add_named_user("Public Person", "public-person");
    for (platform, handle) in [(Platform::Twitter, "birdie"), (Platform::Github, "octo")] {
        app.state.profile_handler.create_profile(owner.id, link(platform, handle)).await.unwrap();
    }
    let service = spawn_app!(app.state);

    let req = test::TestRequest::get().uri("/api/v1/users/public-person/external-profiles").to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;

    assert_eq!(body[0]["platform"], "twitter");
    assert_eq!(body[1]["platform"], "github");

    let missing = test::TestRequest::get().uri("/api/v1/users/nobody-here/external-profiles").to_request();
    let resp = test::call_service(&service, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
