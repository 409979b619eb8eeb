//! 分析任务编排 - 流程层
//!
//! 状态机：Idle → Submitting → {Succeeded | Failed} → Idle
//!
//! - 同一时间最多只有一个分析任务在进行，重复提交立即失败，不排队
//! - 成功时把服务器返回的余额交给会话控制器（覆盖，不做本地扣减）
//! - 失败时只记录错误消息，不改变余额，也不清除上一次的结果
//! - 任何失败都不会导致退出登录

use crate::clients::ScoringApi;
use crate::error::{AppError, AppResult, AuthError, ValidationError};
use crate::models::AnalysisResult;
use crate::services::submission_builder::Payload;
use crate::services::SessionController;
use crate::utils::truncate_text;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

const INTERRUPTED_MESSAGE: &str = "分析请求已中断，请重新提交";

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// 任务快照，供视图层使用
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub state: JobState,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct JobSlot {
    state: JobState,
    result: Option<AnalysisResult>,
    error: Option<String>,
    /// 结果或错误所属的会话纪元
    epoch: u64,
}

impl JobSlot {
    fn reset(&mut self) {
        self.state = JobState::Idle;
        self.result = None;
        self.error = None;
    }
}

// 锁内不跨越 await，使用标准库互斥锁，Drop 中也能同步获取
fn lock_slot(slot: &Mutex<JobSlot>) -> MutexGuard<'_, JobSlot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// 进行中的提交
///
/// 调用方在请求完成前丢弃 `submit` 的 future 时，把状态从 Submitting 移到 Failed
struct InFlight<'a> {
    slot: &'a Mutex<JobSlot>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = lock_slot(self.slot);
        if slot.state == JobState::Submitting {
            warn!("⚠️ 分析请求在完成前被中断");
            slot.state = JobState::Failed;
            slot.error = Some(INTERRUPTED_MESSAGE.to_string());
        }
    }
}

/// 分析任务编排器
pub struct JobOrchestrator {
    session: Arc<SessionController>,
    api: Arc<dyn ScoringApi>,
    slot: Mutex<JobSlot>,
}

impl JobOrchestrator {
    pub fn new(session: Arc<SessionController>, api: Arc<dyn ScoringApi>) -> Self {
        Self {
            session,
            api,
            slot: Mutex::new(JobSlot {
                state: JobState::Idle,
                result: None,
                error: None,
                epoch: 0,
            }),
        }
    }

    /// 提交分析任务
    ///
    /// # 参数
    /// - `payload`: 由 `SubmissionBuilder` 构建的负载，提交后即被消费
    ///
    /// # 返回
    /// 成功时返回分析结果；前置检查失败时状态不变，网络或服务器失败时进入 Failed，
    /// 上一次成功的结果保留不变
    pub async fn submit(&self, payload: Payload) -> AppResult<AnalysisResult> {
        let credentials = self.session.credentials().await;
        let credits = self.session.credits().await;

        let (token, epoch) = {
            let mut slot = lock_slot(&self.slot);
            if slot.state == JobState::Submitting {
                warn!("⚠️ 已有分析任务在进行，拒绝重复提交");
                return Err(AppError::ConcurrentSubmission);
            }

            let (token, epoch) = credentials.ok_or(AuthError::NotAuthenticated)?;

            let required = payload.required_credits();
            if let Some(available) = credits {
                if available < required {
                    warn!("⚠️ 积分不足: 需要 {}，剩余 {}", required, available);
                    return Err(ValidationError::InsufficientCredits { required, available }.into());
                }
            }

            // 上一个会话留下的结果不再保留
            if slot.epoch != epoch {
                slot.reset();
                slot.epoch = epoch;
            }
            slot.state = JobState::Submitting;
            slot.error = None;
            (token, epoch)
        };
        let mut in_flight = InFlight {
            slot: &self.slot,
            armed: true,
        };

        info!(
            "📋 提交分析: 模式 {:?}, {} 份简历",
            payload.mode(),
            payload.required_credits()
        );
        if let Some(description) = payload.job_description() {
            debug!("职位描述: {}", truncate_text(description, 60));
        }

        let outcome = self.api.analyze(&token, &payload).await;
        drop(payload);
        let current_epoch = self.session.epoch().await;

        let credits_remaining = {
            let mut slot = lock_slot(&self.slot);
            in_flight.armed = false;

            if current_epoch != epoch {
                info!("会话已变化，丢弃本次分析结果");
                slot.reset();
                return outcome.map(|o| o.result);
            }

            match &outcome {
                Ok(outcome) => {
                    slot.state = JobState::Succeeded;
                    slot.result = Some(outcome.result.clone());
                    slot.error = None;
                    Some(outcome.credits_remaining)
                }
                Err(e) => {
                    error!("❌ 分析失败: {}", e);
                    slot.state = JobState::Failed;
                    slot.error = Some(e.user_message());
                    None
                }
            }
        };

        if let Some(credits) = credits_remaining {
            self.session.apply_remote_balance(&token, credits).await;
            info!("✓ 分析完成，剩余积分: {}", credits);
        }
        outcome.map(|o| o.result)
    }

    /// 开始新的搜索：丢弃结果和错误，回到 Idle
    pub async fn new_search(&self) -> AppResult<()> {
        let mut slot = lock_slot(&self.slot);
        if slot.state == JobState::Submitting {
            return Err(AppError::ConcurrentSubmission);
        }
        slot.reset();
        Ok(())
    }

    /// 当前状态
    pub async fn state(&self) -> JobState {
        lock_slot(&self.slot).state
    }

    /// 任务快照（已退出的会话的结果和错误不会暴露）
    pub async fn snapshot(&self) -> JobSnapshot {
        let current_epoch = self.session.epoch().await;
        let slot = lock_slot(&self.slot);

        let finished = matches!(slot.state, JobState::Succeeded | JobState::Failed);
        if finished && slot.epoch != current_epoch {
            return JobSnapshot {
                state: JobState::Idle,
                result: None,
                error: None,
            };
        }

        JobSnapshot {
            state: slot.state,
            result: slot.result.clone(),
            error: slot.error.clone(),
        }
    }
}
