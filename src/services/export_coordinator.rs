//! 导出服务 - 业务能力层
//!
//! 把排名发送给导出接口，拿到表格文件后交给本地保存。
//! 与分析任务的状态无关，重复导出互不影响。

use crate::clients::ScoringApi;
use crate::error::{AppResult, AuthError, ExportError};
use crate::infrastructure::SaveSink;
use crate::models::CandidateScore;
use crate::services::SessionController;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 导出完成的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub location: PathBuf,
    pub blob: Vec<u8>,
}

/// 导出协调器
pub struct ExportCoordinator {
    session: Arc<SessionController>,
    api: Arc<dyn ScoringApi>,
    sink: Arc<dyn SaveSink>,
}

impl ExportCoordinator {
    pub fn new(session: Arc<SessionController>, api: Arc<dyn ScoringApi>, sink: Arc<dyn SaveSink>) -> Self {
        Self { session, api, sink }
    }

    /// 导出排名为表格文件
    ///
    /// # 参数
    /// - `ranking`: 已完成的批量分析排名，不能为空
    ///
    /// # 返回
    /// 返回文件名、保存位置和文件内容
    pub async fn export_ranking(&self, ranking: &[CandidateScore]) -> AppResult<ExportedFile> {
        if ranking.is_empty() {
            debug!("没有排名可导出");
            return Err(ExportError::NoRanking.into());
        }

        let (token, _) = self
            .session
            .credentials()
            .await
            .ok_or(AuthError::NotAuthenticated)?;

        info!("📥 正在导出 {} 位候选人的排名...", ranking.len());

        let blob = self.api.export_ranking(&token, ranking).await?;
        let file_name = export_file_name(chrono::Utc::now().timestamp_millis());
        let location = self.sink.save(&file_name, &blob).await?;

        info!("✓ 排名已导出: {}", location.display());

        Ok(ExportedFile {
            file_name,
            location,
            blob,
        })
    }
}

/// 生成带时间戳的导出文件名
pub fn export_file_name(timestamp_millis: i64) -> String {
    format!("Ranking_CV_{}.xlsx", timestamp_millis)
}
