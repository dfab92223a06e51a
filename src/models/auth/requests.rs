use serde::Deserialize;
use ts_rs::TS;

// 用户登录请求（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginRequest {
    /// 邮箱
    #[serde(default)]
    pub email: String,
    /// 密码
    #[serde(default)]
    pub password: String,
    /// 是否记住我
    #[serde(default)]
    pub remember_me: bool,
}
