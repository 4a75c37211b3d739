
use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use uuid::Uuid;

use community_hub::{
    entities::{
        skill::{NewSkillRequest, ReorderSkillsRequest, SkillLevel, UpdateSkillRequest, Visibility},
        technology::TechnologyCategory,
        user::User,
    },
    errors::AppError,
};
use test_utils::TestApp;

fn new_skill(technology_id: Uuid) -> NewSkillRequest {
    NewSkillRequest {
        technology_id,
        level: SkillLevel::Intermediate,
        years_experience: 3,
        visibility: Visibility::Public,
    }
}

/// A user holding one skill per technology name, in the order given.
async fn user_with_skills(app: &TestApp, names: &[&str]) -> (User, Vec<Uuid>) {
    let user = app.store.add_user("Skill Owner");
    let mut ids = Vec::new();

    for name in names {
        let technology = app.store.add_technology(name, TechnologyCategory::Language);
        let skill = app.state.skill_handler
            .create_skill(user.id, new_skill(technology.id))
            .await
            .unwrap();
        ids.push(skill.skill.id);
    }

    (user, ids)
}

fn assert_contiguous(positions: &[(Uuid, i32)]) {
    let observed: Vec<i32> = positions.iter().map(|(_, p)| *p).collect();
    let expected: Vec<i32> = (1..=positions.len() as i32).collect();
    assert_eq!(observed, expected);
}

#[actix_rt::test]
async fn created_skills_are_appended_in_order() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go", "Elixir"]).await;

    let positions = app.store.skill_positions(user.id);
    assert_eq!(positions.iter().map(|(id, _)| *id).collect::<Vec<_>>(), ids);
    assert_contiguous(&positions);
}

#[actix_rt::test]
async fn every_permutation_yields_contiguous_positions() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go", "Elixir"]).await;

    let permutations = [
        [0, 1, 2], [0, 2, 1], [1, 0, 2],
        [1, 2, 0], [2, 0, 1], [2, 1, 0],
    ];

    for permutation in permutations {
        let order: Vec<Uuid> = permutation.iter().map(|i| ids[*i]).collect();

        let listed = app.state.skill_handler
            .reorder_skills(user.id, ReorderSkillsRequest { skill_ids: order.clone() })
            .await
            .unwrap();

        assert_eq!(listed.iter().map(|s| s.skill.id).collect::<Vec<_>>(), order);

        let positions = app.store.skill_positions(user.id);
        assert_eq!(positions.iter().map(|(id, _)| *id).collect::<Vec<_>>(), order);
        assert_contiguous(&positions);
    }
}

#[actix_rt::test]
async fn reorder_is_idempotent() {
    let app = TestApp::new();
    let (user, mut ids) = user_with_skills(&app, &["Rust", "Go", "Elixir", "Zig"]).await;
    ids.reverse();

    let request = ReorderSkillsRequest { skill_ids: ids.clone() };
    app.state.skill_handler.reorder_skills(user.id, request.clone()).await.unwrap();
    let first = app.store.skill_positions(user.id);

    app.state.skill_handler.reorder_skills(user.id, request).await.unwrap();
    assert_eq!(app.store.skill_positions(user.id), first);
}

#[actix_rt::test]
async fn incomplete_order_is_rejected_without_changes() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go", "Elixir"]).await;
    let before = app.store.skill_positions(user.id);

    let err = app.state.skill_handler
        .reorder_skills(user.id, ReorderSkillsRequest { skill_ids: vec![ids[2], ids[0]] })
        .await
        .unwrap_err();

    match err {
        AppError::ValidationError(fields) => assert_eq!(fields[0].field, "skill_ids"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(app.store.skill_positions(user.id), before);
}

#[actix_rt::test]
async fn foreign_skill_in_order_is_rejected() {
    let app = TestApp::new();
    let (owner, ids) = user_with_skills(&app, &["Rust", "Go"]).await;
    let (_, other_ids) = user_with_skills(&app, &["Haskell"]).await;
    let before = app.store.skill_positions(owner.id);

    let err = app.state.skill_handler
        .reorder_skills(owner.id, ReorderSkillsRequest { skill_ids: vec![ids[1], ids[0], other_ids[0]] })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(app.store.skill_positions(owner.id), before);
}

#[actix_rt::test]
async fn duplicate_technology_is_a_field_error() {
    let app = TestApp::new();
    let user = app.store.add_user("Dup Tester");
    let rust = app.store.add_technology("Rust", TechnologyCategory::Language);

    app.state.skill_handler.create_skill(user.id, new_skill(rust.id)).await.unwrap();
    let err = app.state.skill_handler.create_skill(user.id, new_skill(rust.id)).await.unwrap_err();

    match err {
        AppError::ValidationError(fields) => assert_eq!(fields[0].field, "technology_id"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(app.store.skill_count(), 1);
}

#[actix_rt::test]
async fn unknown_technology_is_a_field_error() {
    let app = TestApp::new();
    let user = app.store.add_user("Lost");

    let err = app.state.skill_handler
        .create_skill(user.id, new_skill(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
}

#[actix_rt::test]
async fn deleting_a_skill_closes_the_gap() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go", "Elixir", "Zig"]).await;

    app.state.skill_handler.delete_skill(user.id, &ids[1].to_string()).await.unwrap();

    let positions = app.store.skill_positions(user.id);
    assert_eq!(positions.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![ids[0], ids[2], ids[3]]);
    assert_contiguous(&positions);
}

#[actix_rt::test]
async fn updating_a_skill_keeps_its_position() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go"]).await;

    let updated = app.state.skill_handler
        .update_skill(user.id, &ids[1].to_string(), UpdateSkillRequest {
            level: Some(SkillLevel::Advanced),
            ..UpdateSkillRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.skill.level, SkillLevel::Advanced);
    assert_eq!(updated.skill.position, 2);
}

#[actix_rt::test]
async fn other_users_skills_are_not_found() {
    let app = TestApp::new();
    let (_, ids) = user_with_skills(&app, &["Rust"]).await;
    let intruder = app.store.add_user("Intruder");

    let err = app.state.skill_handler
        .delete_skill(intruder.id, &ids[0].to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.store.skill_count(), 1);
}

#[actix_rt::test]
async fn reorder_endpoint_returns_the_new_order() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go", "Elixir"]).await;
    let service = spawn_app!(app.state);

    let order = vec![ids[2], ids[0], ids[1]];
    let req = test::TestRequest::post()
        .uri("/api/v1/skills/reorder")
        .insert_header(app.bearer(&user))
        .set_json(json!({ "skill_ids": order }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let listed: Vec<(String, i64)> = body.as_array().unwrap()
        .iter()
        .map(|s| (s["id"].as_str().unwrap().to_string(), s["position"].as_i64().unwrap()))
        .collect();

    assert_eq!(listed, vec![
        (ids[2].to_string(), 1),
        (ids[0].to_string(), 2),
        (ids[1].to_string(), 3),
    ]);
}

#[actix_rt::test]
async fn reorder_endpoint_rejects_partial_orders_with_422() {
    let app = TestApp::new();
    let (user, ids) = user_with_skills(&app, &["Rust", "Go"]).await;
    let service = spawn_app!(app.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/skills/reorder")
        .insert_header(app.bearer(&user))
        .set_json(json!({ "skill_ids": [ids[0]] }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "skill_ids");
}

#[actix_rt::test]
async fn reorder_endpoint_requires_a_token() {
    let app = TestApp::new();
    let service = spawn_app!(app.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/skills/reorder")
        .set_json(json!({ "skill_ids": [] }))
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn public_listing_respects_visibility() {
    let app = TestApp::new();
    let owner = app.store.add_named_user("Visible Owner", "visible-owner");
    let viewer = app.store.add_user("Viewer");

    for (name, visibility) in [("Rust", Visibility::Public), ("Go", Visibility::Members), ("Zig", Visibility::Private)] {
        let technology = app.store.add_technology(name, TechnologyCategory::Language);
        app.state.skill_handler
            .create_skill(owner.id, NewSkillRequest { visibility, ..new_skill(technology.id) })
            .await
            .unwrap();
    }

    let service = spawn_app!(app.state);

    let count_for = |body: &Value| body.as_array().map(Vec::len).unwrap_or_default();

    let anonymous = test::TestRequest::get().uri("/api/v1/users/visible-owner/skills").to_request();
    let body: Value = test::call_and_read_body_json(&service, anonymous).await;
    assert_eq!(count_for(&body), 1);

    let member = test::TestRequest::get()
        .uri("/api/v1/users/visible-owner/skills")
        .insert_header(app.bearer(&viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, member).await;
    assert_eq!(count_for(&body), 2);

    let own = test::TestRequest::get()
        .uri("/api/v1/users/visible-owner/skills")
        .insert_header(app.bearer(&owner))
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, own).await;
    assert_eq!(count_for(&body), 3);
}
