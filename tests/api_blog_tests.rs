//! Post lifecycle over HTTP: create, read, list, update, delete and likes.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

mod common;

macro_rules! sync {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/sync")
            .insert_header(common::bearer($name))
            .to_request();
        let body: Value = test::call_and_read_body_json($app, req).await;
        body["user"].clone()
    }};
}

macro_rules! create {
    ($app:expr, $name:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/blogs")
            .insert_header(common::bearer($name))
            .set_json($body)
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["blog"].clone()
    }};
}

macro_rules! like {
    ($app:expr, $name:expr, $id:expr) => {{
        let req = test::TestRequest::post()
            .uri(&format!("/api/blogs/{}/like", $id))
            .insert_header(common::bearer($name))
            .to_request();
        let body: Value = test::call_and_read_body_json($app, req).await;
        body
    }};
}

#[actix_web::test]
async fn create_fetch_and_like_round() {
    let app = test_app!(common::test_state());
    let alice = sync!(&app, "alice");
    let bob = sync!(&app, "bob");

    let content = vec!["rip"; 400].join(" ");
    let blog = create!(
        &app,
        "alice",
        json!({
            "title": "Cold morning bando",
            "excerpt": "ten chars!",
            "content": content,
            "category": "Tips",
        })
    );

    assert_eq!(blog["readTime"], 2);
    assert_eq!(blog["status"], "published");
    assert_eq!(blog["likeCount"], 0);
    assert_eq!(blog["viewCount"], 0);
    assert_eq!(blog["authorId"]["_id"], alice["id"]);
    assert_eq!(blog["authorId"]["name"], "alice");
    let id = blog["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/api/blogs/{}", id)).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["blog"]["viewCount"], 1);

    let liked = like!(&app, "bob", &id);
    assert_eq!(liked["liked"], true);
    assert_eq!(liked["likeCount"], 1);
    assert_eq!(liked["message"], "Blog post liked");

    let req = test::TestRequest::get().uri(&format!("/api/blogs/{}", id)).to_request();
    let refetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(refetched["blog"]["likes"], json!([bob["id"]]));

    let unliked = like!(&app, "bob", &id);
    assert_eq!(unliked["liked"], false);
    assert_eq!(unliked["likeCount"], 0);
}

#[actix_web::test]
async fn invalid_post_reports_every_field() {
    let app = test_app!(common::test_state());
    let _ = sync!(&app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header(common::bearer("alice"))
        .set_json(json!({
            "title": "  ",
            "excerpt": "x".repeat(151),
            "content": "",
            "category": "Drifting",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "excerpt", "content", "category"]);
}

#[actix_web::test]
async fn unsynced_author_cannot_post() {
    let app = test_app!(common::test_state());

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header(common::bearer("carol"))
        .set_json(common::post_body("Ghost post", "Racing"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User not found. Please sync your account first.");
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let app = test_app!(common::test_state());
    let _ = sync!(&app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/blogs")
        .insert_header(common::bearer("alice"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn only_the_owner_may_update_or_delete() {
    let app = test_app!(common::test_state());
    let _ = sync!(&app, "alice");
    let _ = sync!(&app, "bob");

    let blog = create!(&app, "alice", common::post_body("Whoop build", "Builds"));
    let uri = format!("/api/blogs/{}", blog["_id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(common::bearer("bob"))
        .set_json(json!({ "title": "Stolen" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(common::bearer("bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(common::bearer("alice"))
        .set_json(json!({ "title": "Whoop build v2", "category": "Reviews" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["message"], "Blog post updated successfully");
    assert_eq!(updated["blog"]["title"], "Whoop build v2");
    assert_eq!(updated["blog"]["category"], "Reviews");
    assert_eq!(updated["blog"]["excerpt"], blog["excerpt"]);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(common::bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_and_unknown_ids() {
    let app = test_app!(common::test_state());

    let req = test::TestRequest::get().uri("/api/blogs/not-an-id").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/blogs/0123456789abcdef01234567")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Blog post not found");
}

#[actix_web::test]
async fn listing_filters_and_sorts() {
    let app = test_app!(common::test_state());
    let _ = sync!(&app, "alice");
    let _ = sync!(&app, "bob");

    let racing = create!(&app, "alice", common::post_body("Spec class racing", "Racing"));
    let tips = create!(&app, "alice", common::post_body("Prop balancing", "Tips"));
    let mut draft = common::post_body("Unfinished racing notes", "Racing");
    draft["status"] = json!("draft");
    let _ = create!(&app, "alice", draft);

    let _ = like!(&app, "bob", racing["_id"].as_str().unwrap());

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/blogs{}", query))
            .to_request()
    };

    let all: Value = test::call_and_read_body_json(&app, list("")).await;
    assert_eq!(all["total"], 2);
    assert_eq!(all["blogs"][0]["_id"], tips["_id"]);

    let liked: Value = test::call_and_read_body_json(&app, list("?sortBy=mostLiked")).await;
    assert_eq!(liked["blogs"][0]["_id"], racing["_id"]);

    let racing_only: Value = test::call_and_read_body_json(&app, list("?category=Racing")).await;
    assert_eq!(racing_only["total"], 1);

    let everything: Value = test::call_and_read_body_json(&app, list("?category=All")).await;
    assert_eq!(everything["total"], 2);

    let drafts: Value = test::call_and_read_body_json(&app, list("?status=draft")).await;
    assert_eq!(drafts["total"], 1);
    assert_eq!(drafts["blogs"][0]["status"], "draft");

    let search: Value = test::call_and_read_body_json(&app, list("?search=BALANCING")).await;
    assert_eq!(search["total"], 1);
    assert_eq!(search["blogs"][0]["_id"], tips["_id"]);

    let literal: Value = test::call_and_read_body_json(&app, list("?search=.*")).await;
    assert_eq!(literal["total"], 0);

    let resp = test::call_service(&app, list("?status=archived")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn my_posts_include_drafts_and_totals() {
    let app = test_app!(common::test_state());
    let _ = sync!(&app, "alice");
    let _ = sync!(&app, "bob");

    let first = create!(&app, "alice", common::post_body("Goggles review", "Reviews"));
    let mut draft = common::post_body("Cinematic settings", "Cinematic");
    draft["status"] = json!("draft");
    let _ = create!(&app, "alice", draft);
    let _ = create!(&app, "bob", common::post_body("Not mine", "Tips"));

    let id = first["_id"].as_str().unwrap();
    let _ = like!(&app, "bob", id);
    let req = test::TestRequest::get().uri(&format!("/api/blogs/{}", id)).to_request();
    let _ = test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/blogs/user/my-posts")
        .insert_header(common::bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["blogs"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["totalPosts"], 2);
    assert_eq!(body["stats"]["totalLikes"], 1);
    assert_eq!(body["stats"]["totalViews"], 1);
}
