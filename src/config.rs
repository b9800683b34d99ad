use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Server-level settings, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub question_bank_path: PathBuf,
    /// Game loop frequency
    pub tick_hz: u32,
    pub generate_on_startup: bool,
    pub generate_on_restart: bool,
    /// Served as the fallback for a browser UI
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 6574,
            question_bank_path: PathBuf::from("questions.json"),
            tick_hz: 60,
            generate_on_startup: false,
            generate_on_restart: true,
            static_dir: PathBuf::from("static"),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .unwrap_or(defaults.bind_addr);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let tick_hz = std::env::var("TICK_HZ")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|hz| hz.clamp(1, 240))
            .unwrap_or(defaults.tick_hz);

        Self {
            bind_addr,
            port,
            question_bank_path: env_path("QUESTION_BANK_PATH", defaults.question_bank_path),
            tick_hz,
            generate_on_startup: env_bool("GENERATE_ON_STARTUP", defaults.generate_on_startup),
            generate_on_restart: env_bool("GENERATE_ON_RESTART", defaults.generate_on_restart),
            static_dir: env_path("STATIC_DIR", defaults.static_dir),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "BIND_ADDR",
        "PORT",
        "QUESTION_BANK_PATH",
        "TICK_HZ",
        "GENERATE_ON_STARTUP",
        "GENERATE_ON_RESTART",
        "STATIC_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:6574");
        assert_eq!(config.question_bank_path, PathBuf::from("questions.json"));
        assert_eq!(config.tick_hz, 60);
        assert!(!config.generate_on_startup);
        assert!(config.generate_on_restart);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("BIND_ADDR", "127.0.0.1");
        std::env::set_var("PORT", "8080");
        std::env::set_var("QUESTION_BANK_PATH", "/tmp/bank.json");
        std::env::set_var("TICK_HZ", "1000");
        std::env::set_var("GENERATE_ON_STARTUP", "yes");
        std::env::set_var("GENERATE_ON_RESTART", "off");

        let config = AppConfig::from_env();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.question_bank_path, PathBuf::from("/tmp/bank.json"));
        assert_eq!(config.tick_hz, 240);
        assert!(config.generate_on_startup);
        assert!(!config.generate_on_restart);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("GENERATE_ON_RESTART", "maybe");
        std::env::set_var("STATIC_DIR", "   ");

        let config = AppConfig::from_env();
        assert_eq!(config.port, 6574);
        assert!(config.generate_on_restart);
        assert_eq!(config.static_dir, PathBuf::from("static"));

        clear_env();
    }
}
