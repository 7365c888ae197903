use tracing_subscriber::{EnvFilter, fmt, prelude::*};


/// Installs a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`. Returns `false` if a global subscriber already exists.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_once() {
        init_tracing("soft_deleteable=debug");
        assert!(!init_tracing("soft_deleteable=debug"));
    }
}
