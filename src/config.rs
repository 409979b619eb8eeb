/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 地址
    pub api_base_url: String,
    /// 会话文件路径（保存令牌）
    pub session_file: String,
    /// 导出文件保存目录
    pub export_dir: String,
    /// 单次请求超时（秒），AI 分析可能较慢
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            session_file: ".cv_analyzer/session.toml".to_string(),
            export_dir: "exports".to_string(),
            request_timeout_secs: 120,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            session_file: std::env::var("SESSION_FILE").unwrap_or(default.session_file),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 覆盖 API 地址（命令行参数优先于环境变量）
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
