//! 配置管理
//!
//! 配置加载顺序：`config.toml` → `config.{APP_ENV}.toml` → `EDUTASK_*` 环境变量 → 显式覆盖。

mod loader;
mod structs;

pub use structs::*;
