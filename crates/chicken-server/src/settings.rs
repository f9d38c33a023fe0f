/// Process configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `BIND_ADDR`, default `0.0.0.0:8888`.
    pub bind: String,
    /// `DB_URL`. Without it sessions live in process memory.
    pub db_url: Option<String>,
    /// `DB_POOL`, connections held by the store.
    pub pool: usize,
    /// `WORKERS`, actix worker threads.
    pub workers: usize,
}

impl Settings {
    pub const BIND: &'static str = "0.0.0.0:8888";
    pub const POOL: usize = 8;
    pub const WORKERS: usize = 4;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: usize| match get(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("{} = {:?} is not a number, using {}", key, raw, default);
                default
            }),
        };
        Self {
            bind: get("BIND_ADDR").unwrap_or_else(|| Self::BIND.to_string()),
            db_url: get("DB_URL").filter(|url| !url.trim().is_empty()),
            pool: number("DB_POOL", Self::POOL).max(1),
            workers: number("WORKERS", Self::WORKERS).max(1),
        }
    }
}
