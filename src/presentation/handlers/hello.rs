use axum::Json;
use axum::extract::Query;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct HelloQuery {
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct HelloResponse {
    pub message: String,
}

pub async fn hello_handler(Query(query): Query<HelloQuery>) -> Json<HelloResponse> {
    let name = query.name.as_deref().unwrap_or("world");
    Json(HelloResponse {
        message: format!("hello, {}", name),
    })
}
