/// 认证令牌
///
/// 不透明字符串，Debug 输出时隐藏内容，避免写入日志
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// 认证状态（对外展示用，不含令牌）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    /// `credits` 为 None 表示余额尚未与服务器同步
    Authenticated { credits: Option<u32> },
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated { .. })
    }
}

/// 兑换成功的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub credits: u32,
}

/// 会话快照，供视图层使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    /// 上次已知的余额，仅作提示
    pub credits_hint: Option<u32>,
}
