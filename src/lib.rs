//! # CV Analyzer
//!
//! 简历分析服务的客户端核心
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有本地资源，只暴露能力
//! - `SessionStore` - 令牌和积分提示的持久化
//! - `SaveSink` - 导出文件的保存位置
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - `ScoringApi` 与后端的 HTTP 通信
//!
//! ### ③ 业务能力层（Services）
//! - `SessionController` - 访问码兑换、会话恢复、余额同步、退出登录
//! - `SubmissionBuilder` - 把简历和职位描述组装成负载
//! - `ExportCoordinator` - 排名导出为表格文件
//!
//! ### ④ 流程层（Workflow）
//! - `JobOrchestrator` - 单任务状态机（Idle → Submitting → Succeeded/Failed）
//!
//! ### ⑤ 视图层（View）
//! - `view::project` - 把会话和任务状态投影为可渲染结构
//!
//! ## 模块结构

pub mod app;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;
pub mod view;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use app::App;
pub use clients::{AnalysisOutcome, ApiClient, ScoringApi};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnalysisResult, AuthStatus, CandidateScore, Document};
pub use services::{ExportCoordinator, SessionController, SubmissionBuilder, SubmissionMode};
pub use view::{project, ViewModel};
pub use workflow::{JobOrchestrator, JobSnapshot, JobState};
