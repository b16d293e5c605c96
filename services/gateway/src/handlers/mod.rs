pub mod books;

pub async fn health() -> axum::Json<&'static str> {
    axum::Json("ok")
}
