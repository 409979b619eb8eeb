//! 会话控制服务 - 业务能力层
//!
//! 唯一持有认证令牌和积分余额的组件：
//! - 兑换访问码 / 恢复会话 / 同步余额 / 退出登录
//! - 余额只来自服务器的权威数值，从不在本地预扣
//! - 唯一写入会话存储的组件

use crate::clients::ScoringApi;
use crate::error::{
    AppError, AppResult, AuthError, RemoteError, ValidationError, CONNECTIVITY_MESSAGE,
    INVALID_CODE_MESSAGE,
};
use crate::infrastructure::session_store::{SessionStore, CREDITS_HINT_KEY, TOKEN_KEY};
use crate::models::{AuthStatus, AuthToken, Redemption, SessionSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum Auth {
    Anonymous,
    Authenticated {
        token: AuthToken,
        credits: Option<u32>,
    },
}

#[derive(Debug)]
struct SessionState {
    auth: Auth,
    credits_hint: Option<u32>,
    /// 每次登录 / 退出都会变化，用于让旧会话的分析结果失效
    epoch: u64,
}

/// 会话控制器
pub struct SessionController {
    api: Arc<dyn ScoringApi>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
}

impl SessionController {
    /// 创建新的会话控制器（初始为未登录）
    pub fn new(api: Arc<dyn ScoringApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(SessionState {
                auth: Auth::Anonymous,
                credits_hint: None,
                epoch: 0,
            }),
        }
    }

    /// 兑换访问码
    ///
    /// # 参数
    /// - `code`: 用户输入的访问码，发送前会去除首尾空白并转为大写
    ///
    /// # 返回
    /// 成功时返回服务器给出的初始积分；失败时状态和存储都不变
    pub async fn redeem(&self, code: &str) -> AppResult<Redemption> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ValidationError::EmptyCode.into());
        }

        info!("🔑 正在验证访问码...");

        let response = match self.api.validate_code(&code).await {
            Ok(response) => response,
            Err(AppError::Remote(RemoteError::Rejected {
                message: Some(message),
                ..
            })) if !message.trim().is_empty() => {
                warn!("⚠️ 访问码验证被拒绝: {}", message);
                return Err(AuthError::CodeRejected { message }.into());
            }
            Err(AppError::Auth(AuthError::TokenRejected { message })) => {
                warn!("⚠️ 访问码验证被拒绝: {}", message);
                return Err(AuthError::CodeRejected { message }.into());
            }
            Err(e @ AppError::Remote(RemoteError::MalformedResponse { .. })) => {
                warn!("⚠️ 访问码验证响应无法解析: {}", e);
                return Err(e);
            }
            Err(e) => {
                warn!("⚠️ 访问码验证失败: {}", e);
                return Err(AuthError::Unreachable {
                    message: CONNECTIVITY_MESSAGE.to_string(),
                    source: Box::new(e),
                }
                .into());
            }
        };

        let token = match response.token.filter(|t| !t.is_empty()) {
            Some(token) if response.valid => AuthToken::new(token),
            _ => {
                let message = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| INVALID_CODE_MESSAGE.to_string());
                warn!("⚠️ 访问码无效: {}", message);
                return Err(AuthError::CodeRejected { message }.into());
            }
        };

        // 先落盘，成功后才切换状态
        self.store.put(TOKEN_KEY, token.as_str())?;
        self.persist_hint(response.credits);

        let credits = response.credits;
        let mut state = self.state.write().await;
        state.auth = Auth::Authenticated {
            token,
            credits: Some(credits),
        };
        state.credits_hint = Some(credits);
        state.epoch += 1;

        info!("✓ 登录成功，剩余积分: {}", credits);
        Ok(Redemption { credits })
    }

    /// 从存储恢复会话
    ///
    /// 找到令牌时先乐观地标记为已登录（余额未知），并在后台同步余额。
    /// 返回的任务句柄可用于等待同步完成。
    pub async fn resume_from_store(self: &Arc<Self>) -> (AuthStatus, Option<JoinHandle<AppResult<u32>>>) {
        let Some(token) = self.store.get(TOKEN_KEY).filter(|t| !t.is_empty()) else {
            debug!("存储中没有令牌，保持未登录");
            return (AuthStatus::Anonymous, None);
        };
        let hint = self
            .store
            .get(CREDITS_HINT_KEY)
            .and_then(|v| v.trim().parse::<u32>().ok());

        {
            let mut state = self.state.write().await;
            state.auth = Auth::Authenticated {
                token: AuthToken::new(token),
                credits: None,
            };
            state.credits_hint = hint;
            state.epoch += 1;
        }

        info!("🔄 已恢复会话，正在同步积分...");

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move { controller.refresh_balance().await });

        (AuthStatus::Authenticated { credits: None }, Some(handle))
    }

    /// 同步余额
    ///
    /// 失败时保留原有余额，只记录警告，不会强制退出登录
    pub async fn refresh_balance(&self) -> AppResult<u32> {
        let token = self.current_token().await.ok_or(AuthError::NotAuthenticated)?;

        match self.api.session_info(&token).await {
            Ok(info) => {
                self.apply_remote_balance(&token, info.credits_remaining).await;
                Ok(info.credits_remaining)
            }
            Err(e) => {
                warn!("⚠️ 同步积分失败，保留当前余额: {}", e);
                Err(e)
            }
        }
    }

    /// 退出登录（幂等）
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!("⚠️ 清除会话文件失败: {}", e);
        }

        let mut state = self.state.write().await;
        let was_authenticated = matches!(state.auth, Auth::Authenticated { .. });
        state.auth = Auth::Anonymous;
        state.credits_hint = None;
        state.epoch += 1;

        if was_authenticated {
            info!("👋 已退出登录");
        }
    }

    /// 当前认证状态
    pub async fn status(&self) -> AuthStatus {
        match &self.state.read().await.auth {
            Auth::Anonymous => AuthStatus::Anonymous,
            Auth::Authenticated { credits, .. } => AuthStatus::Authenticated { credits: *credits },
        }
    }

    /// 已知的积分余额（未登录或尚未同步时为 None）
    pub async fn credits(&self) -> Option<u32> {
        match &self.state.read().await.auth {
            Auth::Authenticated { credits, .. } => *credits,
            Auth::Anonymous => None,
        }
    }

    /// 会话快照
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        let status = match &state.auth {
            Auth::Anonymous => AuthStatus::Anonymous,
            Auth::Authenticated { credits, .. } => AuthStatus::Authenticated { credits: *credits },
        };
        SessionSnapshot {
            status,
            credits_hint: state.credits_hint,
        }
    }

    /// 当前会话纪元
    pub async fn epoch(&self) -> u64 {
        self.state.read().await.epoch
    }

    /// 当前令牌及其所属纪元
    pub(crate) async fn credentials(&self) -> Option<(AuthToken, u64)> {
        let state = self.state.read().await;
        match &state.auth {
            Auth::Authenticated { token, .. } => Some((token.clone(), state.epoch)),
            Auth::Anonymous => None,
        }
    }

    async fn current_token(&self) -> Option<AuthToken> {
        self.credentials().await.map(|(token, _)| token)
    }

    /// 应用服务器返回的余额
    ///
    /// 令牌已变化（退出或重新登录）时忽略，返回是否已应用
    pub(crate) async fn apply_remote_balance(&self, token: &AuthToken, credits: u32) -> bool {
        let mut state = self.state.write().await;
        match &mut state.auth {
            Auth::Authenticated {
                token: current,
                credits: balance,
            } if *current == *token => {
                *balance = Some(credits);
            }
            _ => {
                debug!("会话已变化，忽略服务器余额 {}", credits);
                return false;
            }
        }
        state.credits_hint = Some(credits);
        drop(state);

        self.persist_hint(credits);
        debug!("积分已同步: {}", credits);
        true
    }

    fn persist_hint(&self, credits: u32) {
        if let Err(e) = self.store.put(CREDITS_HINT_KEY, &credits.to_string()) {
            warn!("⚠️ 保存积分提示失败: {}", e);
        }
    }
}

/// 规范化访问码：去除首尾空白并转为大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
