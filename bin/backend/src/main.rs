//! Classroom Chicken Backend
//!
//! Serves sessions over HTTP on BIND_ADDR (default 0.0.0.0:8888).
//! Persists to PostgreSQL when DB_URL is set, else keeps state in memory.

#[tokio::main]
async fn main() {
    chicken_core::log();
    chicken_core::kys();
    chicken_server::run().await.unwrap();
}
