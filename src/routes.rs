mod api;
mod extract;
mod pages;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/categories", get(api::list_categories).post(api::create_category))
        .route(
            "/categories/{id}",
            get(api::get_category).put(api::update_category).delete(api::delete_category),
        )
        .route("/actors", get(api::list_actors).post(api::create_actor))
        .route(
            "/actors/{id}",
            get(api::get_actor).put(api::update_actor).delete(api::delete_actor),
        )
        .route("/actors/{id}/directed", get(api::actor_directed))
        .route("/actors/{id}/starred", get(api::actor_starred))
        .route("/genres", get(api::list_genres).post(api::create_genre))
        .route(
            "/genres/{id}",
            get(api::get_genre).put(api::update_genre).delete(api::delete_genre),
        )
        .route("/movies", get(api::list_movies).post(api::create_movie))
        .route(
            "/movies/{id}",
            get(api::get_movie).put(api::update_movie).delete(api::delete_movie),
        )
        .route("/movies/{id}/reviews", get(api::movie_reviews))
        .route("/shots", get(api::list_shots).post(api::create_shot))
        .route("/shots/{id}", get(api::get_shot).put(api::update_shot).delete(api::delete_shot))
        .route("/rating-stars", get(api::list_rating_stars).post(api::create_rating_star))
        .route(
            "/rating-stars/{id}",
            get(api::get_rating_star).put(api::update_rating_star).delete(api::delete_rating_star),
        )
        .route("/ratings", get(api::list_ratings).post(api::create_rating))
        .route(
            "/ratings/{id}",
            get(api::get_rating).put(api::update_rating).delete(api::delete_rating),
        )
        .route("/ratings/{id}/label", get(api::rating_label))
        .route("/reviews", get(api::list_reviews).post(api::create_review))
        .route(
            "/reviews/{id}",
            get(api::get_review).put(api::update_review).delete(api::delete_review),
        )
        .route("/reviews/{id}/label", get(api::review_label));

    Router::new()
        .route("/", get(pages::index))
        .route("/movies/{url}", get(pages::movie))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::router;
    use crate::{AppState, catalog::Catalog, config::Config};

    async fn app() -> axum::Router {
        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "sqlite::memory:".into(),
            db_max_connections: 1,
            page_size: 20,
            max_page_size: 100,
            media_url: "/media/".into(),
        };
        let catalog = Catalog::new(crate::db::test_db().await);
        router(Arc::new(AppState { config: Arc::new(config), catalog }))
    }

    async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn movie_body(url: &str) -> Value {
        json!({
            "title": "Inception",
            "tagline": "Your mind is the scene of the crime",
            "description": "A thief who steals corporate secrets through dream-sharing.",
            "poster": "inception.jpg",
            "year": 2010,
            "country": "USA",
            "world_premiere": "2010-07-08",
            "budget": 160000000,
            "fees_in_usa": 292576195,
            "fees_in_world": 828322032,
            "url": url
        })
    }

    #[tokio::test]
    async fn second_movie_with_same_url_is_rejected() {
        let app = app().await;

        let (status, created) = send_json(&app, Method::POST, "/api/movies", Some(movie_body("inception"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["url"], "inception");
        assert_eq!(created["poster"], "movies/inception.jpg");

        let (status, body) = send_json(&app, Method::POST, "/api/movies", Some(movie_body("inception"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["url"].is_array());
    }

    #[tokio::test]
    async fn validation_errors_are_keyed_by_field() {
        let app = app().await;
        let (status, body) =
            send_json(&app, Method::POST, "/api/reviews", Some(json!({"email": "nope", "movie_id": 1}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        for field in ["email", "name", "text", "movie_id"] {
            assert!(body["errors"][field].is_array(), "missing {field}");
        }
    }

    #[tokio::test]
    async fn malformed_input_is_keyed_by_field() {
        let app = app().await;

        let mut body = movie_body("inception");
        body["category_id"] = json!(3_000_000_000u64);
        let (status, body) = send_json(&app, Method::POST, "/api/movies", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["category_id"][0].as_str().unwrap().contains("3000000000"));

        let (status, body) = send_json(&app, Method::GET, "/api/categories/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["id"].is_array());

        let (status, body) = send_json(&app, Method::GET, "/api/movies?per_page=lots", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["per_page"].is_array());
    }

    #[tokio::test]
    async fn huge_page_number_returns_empty_page() {
        let app = app().await;
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/categories",
            Some(json!({"name": "Films", "description": "Feature films", "url": "films"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) =
            send_json(&app, Method::GET, "/api/categories?page=18446744073709551615", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["total_items"], 1);

        let (status, _) = send(&app, Method::GET, "/?page=18446744073709551615", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn crud_round_trip_for_category() {
        let app = app().await;
        let (status, created) = send_json(
            &app,
            Method::POST,
            "/api/categories",
            Some(json!({"name": "Films", "description": "Feature films", "url": "films"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send_json(
            &app,
            Method::PUT,
            &format!("/api/categories/{id}"),
            Some(json!({"name": "Feature films", "description": "Long", "url": "films"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Feature films");

        let (status, page) = send_json(&app, Method::GET, "/api/categories?per_page=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total_items"], 1);
        assert_eq!(page["per_page"], 5);

        let (status, _) = send_json(&app, Method::DELETE, &format!("/api/categories/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send_json(&app, Method::GET, &format!("/api/categories/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn movie_detail_includes_review_tree() {
        let app = app().await;
        let (_, movie) = send_json(&app, Method::POST, "/api/movies", Some(movie_body("inception"))).await;
        let movie_id = movie["id"].as_i64().unwrap();

        let (_, root) = send_json(
            &app,
            Method::POST,
            "/api/reviews",
            Some(json!({"email": "a@example.com", "name": "Ann", "text": "Great", "movie_id": movie_id})),
        )
        .await;
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/reviews",
            Some(json!({
                "email": "b@example.com",
                "name": "Bob",
                "text": "Agreed",
                "movie_id": movie_id,
                "parent_id": root["id"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, detail) = send_json(&app, Method::GET, &format!("/api/movies/{movie_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["reviews"][0]["name"], "Ann");
        assert_eq!(detail["reviews"][0]["replies"][0]["name"], "Bob");
        assert_eq!(detail["rating"]["votes"], 0);

        let (status, tree) =
            send_json(&app, Method::GET, &format!("/api/movies/{movie_id}/reviews"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree.as_array().unwrap().len(), 1);

        let (status, label) =
            send_json(&app, Method::GET, &format!("/api/reviews/{}/label", root["id"]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(label["label"], "Ann - Inception");
    }

    #[tokio::test]
    async fn pages_hide_drafts() {
        let app = app().await;
        send_json(&app, Method::POST, "/api/movies", Some(movie_body("inception"))).await;
        let mut draft = movie_body("secret-cut");
        draft["title"] = json!("Secret Cut");
        draft["draft"] = json!(true);
        send_json(&app, Method::POST, "/api/movies", Some(draft)).await;

        let (status, html) = send(&app, Method::GET, "/", None).await;
        let html = String::from_utf8(html).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Inception"));
        assert!(!html.contains("Secret Cut"));

        let (status, _) = send(&app, Method::GET, "/movies/inception", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, "/movies/secret-cut", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/?genre=unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
