
use std::collections::BTreeSet;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use community_hub::{
    entities::user::NewUser,
    username::is_valid_username,
};
use test_utils::TestApp;

const STRONG_PASSWORD: &str = "Tr1cky-Harbor-Lantern!";

fn registration(email: &str, display_name: &str) -> NewUser {
    NewUser {
        email: email.into(),
        display_name: display_name.into(),
        password: STRONG_PASSWORD.into(),
    }
}

#[actix_rt::test]
async fn identical_display_names_get_distinct_usernames() {
    let app = TestApp::new();

    let first = app.state.auth_handler
        .register(registration("ada@example.com", "Ada Lovelace"))
        .await
        .unwrap();
    let second = app.state.auth_handler
        .register(registration("ada.l@example.com", "Ada Lovelace"))
        .await
        .unwrap();

    assert_eq!(first.username.as_deref(), Some("ada-lovelace"));
    assert_eq!(second.username.as_deref(), Some("ada-lovelace-2"));
}

#[actix_rt::test]
async fn concurrently_claimed_name_moves_to_next_candidate() {
    let app = TestApp::new();
    app.store.contest_username("grace-hopper");

    let user = app.store.add_user("Grace Hopper");
    let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();

    assert_eq!(named.username.as_deref(), Some("grace-hopper-2"));
}

#[actix_rt::test]
async fn numbering_keeps_counting_past_a_crowded_name() {
    let app = TestApp::new();
    app.store.add_named_user("Grace Hopper", "grace-hopper");
    for n in 2..=25 {
        app.store.add_named_user("Grace Hopper", &format!("grace-hopper-{n}"));
    }

    let user = app.store.add_user("Grace Hopper");
    let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();
    assert_eq!(named.username.as_deref(), Some("grace-hopper-26"));

    let suggested = app.state.auth_handler.usernames.suggest("Grace Hopper").await.unwrap();
    assert_eq!(suggested, "grace-hopper-27");
}

#[actix_rt::test]
async fn route_words_never_become_usernames() {
    let app = TestApp::new();

    let user = app.store.add_user("Username Suggestion");
    let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();
    assert_eq!(named.username.as_deref(), Some("username-suggestion-2"));

    let me = app.store.add_user("Me");
    let named = app.state.auth_handler.usernames.assign(&me).await.unwrap();
    assert_eq!(named.username.as_deref(), Some("me-2"));
}

#[actix_rt::test]
async fn assign_keeps_an_existing_username() {
    let app = TestApp::new();
    let user = app.store.add_named_user("Linus", "penguin");

    let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();
    assert_eq!(named.username.as_deref(), Some("penguin"));
}

#[actix_rt::test]
async fn unusable_display_name_falls_back() {
    let app = TestApp::new();
    let user = app.store.add_user("!!! ???");

    let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();
    assert_eq!(named.username.as_deref(), Some("member"));
}

#[actix_rt::test]
async fn backfill_names_every_pending_user_uniquely() {
    let app = TestApp::new();
    app.store.add_named_user("Ada Lovelace", "ada-lovelace");
    let pending: Vec<_> = (0..3).map(|_| app.store.add_user("Ada Lovelace")).collect();
    app.store.add_user("Alan Turing");

    let report = app.state.auth_handler.usernames.backfill().await.unwrap();
    assert_eq!(report.assigned, 4);
    assert_eq!(report.failed, 0);

    let names: BTreeSet<String> = pending
        .iter()
        .map(|u| app.store.user(u.id).unwrap().username.unwrap())
        .collect();
    let expected: BTreeSet<String> = ["ada-lovelace-2", "ada-lovelace-3", "ada-lovelace-4"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(names, expected);

    let again = app.state.auth_handler.usernames.backfill().await.unwrap();
    assert_eq!(again.assigned, 0);
}

#[actix_rt::test]
async fn generated_usernames_are_well_formed() {
    let app = TestApp::new();

    for display_name in ["  Zoë   Saldaña ", "O'Brien-Smith", "a very long display name that keeps going on and on"] {
        let user = app.store.add_user(display_name);
        let named = app.state.auth_handler.usernames.assign(&user).await.unwrap();
        let username = named.username.unwrap();
        assert!(is_valid_username(&username), "{username:?} from {display_name:?}");
    }
}

#[actix_rt::test]
async fn suggestion_endpoint_skips_taken_names() {
    let app = TestApp::new();
    app.store.add_named_user("Margaret Hamilton", "margaret-hamilton");
    let service = spawn_app!(app.state);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/username-suggestion?display_name=Margaret%20Hamilton")
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "username": "margaret-hamilton-2" }));
}

#[actix_rt::test]
async fn suggestion_endpoint_validates_display_name() {
    let app = TestApp::new();
    let service = spawn_app!(app.state);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/username-suggestion?display_name=")
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
