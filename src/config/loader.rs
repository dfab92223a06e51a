use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;
#[cfg(test)]
use super::{
    AppSettings, Argon2Config, CacheConfig, CorsConfig, DatabaseConfig, JwtConfig, LimitConfig,
    MemoryConfig, RedisConfig, ServerConfig, TimeoutConfig,
};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("EDUTASK")
                    .separator("__")
                    .try_parsing(true),
            );

        // 常用环境变量的简写形式
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        app_config.normalize();

        if app_config.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set (JWT_SECRET)".to_string(),
            ));
        }

        Ok(app_config)
    }

    /// 处理需要运行时推导的字段
    fn normalize(&mut self) {
        // 处理工作线程数
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers).max(1);
        }
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            #[cfg(test)]
            {
                Self::for_tests(1)
            }
            #[cfg(not(test))]
            {
                Self::load().unwrap_or_else(|e| {
                    eprintln!("Failed to load configuration: {e}");
                    std::process::exit(1);
                })
            }
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }

    /// 单元测试使用的固定配置
    #[cfg(test)]
    pub(crate) fn for_tests(workers: usize) -> AppConfig {
        AppConfig {
            app: AppSettings {
                system_name: "EduTask".to_string(),
                environment: "development".to_string(),
                log_level: "info".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                unix_socket_path: String::new(),
                workers,
                max_workers: 4,
                timeouts: TimeoutConfig {
                    client_request: 5000,
                    client_disconnect: 1000,
                    keep_alive: 30,
                },
                limits: LimitConfig {
                    max_payload_size: 1024,
                },
            },
            jwt: JwtConfig {
                secret: "unit-test-secret".to_string(),
                access_token_expiry: 15,
                refresh_token_expiry: 7,
                refresh_token_remember_me_expiry: 30,
            },
            argon2: Argon2Config {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                pool_size: 4,
                timeout: 10,
            },
            cache: CacheConfig {
                cache_type: "moka".to_string(),
                default_ttl: 60,
                redis: RedisConfig {
                    url: "redis://127.0.0.1/".to_string(),
                    key_prefix: "edutask:".to_string(),
                },
                memory: MemoryConfig { max_capacity: 100 },
            },
            cors: CorsConfig {
                allowed_origins: vec![],
                max_age: 3600,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workers_are_derived_when_zero() {
        let mut config = AppConfig::for_tests(0);
        config.normalize();
        assert!(config.server.workers >= 1);
        assert!(config.server.workers <= 4);
    }

    #[test]
    fn test_explicit_workers_are_kept() {
        let mut config = AppConfig::for_tests(3);
        config.normalize();
        assert_eq!(config.server.workers, 3);
    }

    #[test]
    fn test_bundled_config_file_deserializes() {
        use config::FileFormat;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                include_str!("../../config.toml"),
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.cache.cache_type, "moka");
        assert_eq!(config.server.timeouts.client_request, 5000);
        assert!(config.cors.allowed_origins.is_empty());
        assert!(config.jwt.secret.is_empty());
    }

    #[test]
    fn test_bind_address_and_environment() {
        let config = AppConfig::for_tests(1);
        assert_eq!(config.server_bind_address(), "127.0.0.1:8080");
        assert!(config.is_development());
        assert!(!config.is_production());
    }
}
