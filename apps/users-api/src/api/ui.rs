//! Browser client served at `/`

use axum::{Router, response::Html, routing::get};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
