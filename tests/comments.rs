//! Threaded comment tests.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

#[tokio::test]
async fn create_comment_bumps_counter() {
    let app = app().await;
    let author = app.create_user("cmt_create_author").await;
    let commenter = app.create_user("cmt_create_user").await;
    let post_id = app.create_post_for_user(author.id).await;

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", post_id),
            json!({ "userId": commenter.id, "content": "  nice post  " }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["content"], "nice post");
    assert!(body["parentId"].is_null());
    assert_eq!(body["author"]["id"], commenter.id);
    assert!(body["createdAt"].is_string());
    assert_eq!(app.post_counters(post_id).await.1, 1);
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let app = app().await;
    let user = app.create_user("cmt_empty").await;
    let post_id = app.create_post_for_user(user.id).await;

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", post_id),
            json!({ "userId": user.id, "content": "   " }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "comment cannot be empty");
    assert_eq!(app.post_counters(post_id).await.1, 0);
}

#[tokio::test]
async fn overlong_comment_is_rejected() {
    let app = app().await;
    let user = app.create_user("cmt_long").await;
    let post_id = app.create_post_for_user(user.id).await;

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", post_id),
            json!({ "userId": user.id, "content": "x".repeat(501) }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", post_id),
            json!({ "userId": user.id, "content": "x".repeat(500) }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn comment_on_missing_post() {
    let app = app().await;
    let user = app.create_user("cmt_no_post").await;

    let resp = app
        .post_json(
            "/api/posts/654321/comments",
            json!({ "userId": user.id, "content": "hello?" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parent_must_belong_to_same_post() {
    let app = app().await;
    let user = app.create_user("cmt_cross_post").await;
    let first = app.create_post_for_user(user.id).await;
    let second = app.create_post_for_user(user.id).await;
    let parent = app.comment(first, user.id, "on the first post", None).await;

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", second),
            json!({ "userId": user.id, "content": "reply", "parentId": parent }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "parent comment not found");
}

#[tokio::test]
async fn threads_are_ordered_and_nested() {
    let app = app().await;
    let user = app.create_user("cmt_threads").await;
    let post_id = app.create_post_for_user(user.id).await;

    let first = app.comment(post_id, user.id, "first", None).await;
    let second = app.comment(post_id, user.id, "second", None).await;
    let reply_a = app.comment(post_id, user.id, "reply a", Some(first)).await;
    let reply_b = app.comment(post_id, user.id, "reply b", Some(first)).await;
    // A reply to a reply joins the top-level thread.
    let nested = app.comment(post_id, user.id, "reply c", Some(reply_a)).await;

    let resp = app.get(&format!("/api/posts/{}/comments", post_id)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let threads = resp.json();
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["id"], second);
    assert_eq!(threads[0]["replies"].as_array().unwrap().len(), 0);
    assert_eq!(threads[1]["id"], first);

    let replies: Vec<i64> = threads[1]["replies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|reply| reply["id"].as_i64().unwrap())
        .collect();
    assert_eq!(replies, vec![reply_a, reply_b, nested]);
    assert_eq!(threads[1]["replies"][2]["parentId"], first);
    assert_eq!(app.post_counters(post_id).await.1, 5);
}

#[tokio::test]
async fn deleting_top_level_comment_removes_replies_from_counter() {
    let app = app().await;
    let user = app.create_user("cmt_delete_cascade").await;
    let post_id = app.create_post_for_user(user.id).await;

    let top = app.comment(post_id, user.id, "top", None).await;
    app.comment(post_id, user.id, "reply 1", Some(top)).await;
    app.comment(post_id, user.id, "reply 2", Some(top)).await;
    app.comment(post_id, user.id, "unrelated", None).await;
    assert_eq!(app.post_counters(post_id).await.1, 4);

    let resp = app
        .delete(&format!(
            "/api/posts/{}/comments/{}?userId={}",
            post_id, top, user.id
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["message"], "comment deleted");
    assert_eq!(app.post_counters(post_id).await.1, 1);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn deleting_a_reply_only_removes_it() {
    let app = app().await;
    let user = app.create_user("cmt_delete_reply").await;
    let post_id = app.create_post_for_user(user.id).await;

    let top = app.comment(post_id, user.id, "top", None).await;
    let reply = app.comment(post_id, user.id, "reply", Some(top)).await;

    let resp = app
        .delete(&format!(
            "/api/posts/{}/comments/{}?userId={}",
            post_id, reply, user.id
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.post_counters(post_id).await.1, 1);
}

#[tokio::test]
async fn only_the_author_can_delete() {
    let app = app().await;
    let owner = app.create_user("cmt_owner").await;
    let stranger = app.create_user("cmt_stranger").await;
    let post_id = app.create_post_for_user(owner.id).await;
    let comment = app.comment(post_id, owner.id, "mine", None).await;

    let resp = app
        .delete(&format!(
            "/api/posts/{}/comments/{}?userId={}",
            post_id, comment, stranger.id
        ))
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(app.post_counters(post_id).await.1, 1);
}

#[tokio::test]
async fn delete_missing_comment() {
    let app = app().await;
    let user = app.create_user("cmt_delete_missing").await;
    let post_id = app.create_post_for_user(user.id).await;

    let resp = app
        .delete(&format!(
            "/api/posts/{}/comments/543210?userId={}",
            post_id, user.id
        ))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "comment not found");
}

#[tokio::test]
async fn string_user_id_is_rejected_as_json_error() {
    let app = app().await;
    let user = app.create_user("cmt_string_id").await;
    let post_id = app.create_post_for_user(user.id).await;

    let resp = app
        .post_json(
            &format!("/api/posts/{}/comments", post_id),
            json!({ "userId": "abc", "content": "hello" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(!resp.error_message().is_empty());
    assert_eq!(app.post_counters(post_id).await.1, 0);
}
