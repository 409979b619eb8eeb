use crate::cli::{AnalyzeArgs, Command};
use crate::clients::{ApiClient, ScoringApi};
use crate::config::Config;
use crate::infrastructure::{DirectorySink, FileSessionStore};
use crate::models::{AuthStatus, Document};
use crate::services::{ExportCoordinator, SessionController, SubmissionBuilder, SubmissionMode};
use crate::utils::logging::log_startup;
use crate::view::project;
use crate::workflow::JobOrchestrator;
use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    session: Arc<SessionController>,
    jobs: JobOrchestrator,
    exporter: ExportCoordinator,
}

impl App {
    /// 初始化应用：组装客户端、会话存储和各项服务
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let api: Arc<dyn ScoringApi> = Arc::new(ApiClient::new(&config).context("创建 HTTP 客户端失败")?);
        let store = Arc::new(
            FileSessionStore::open_or_reset(&config.session_file)
                .with_context(|| format!("打开会话文件失败: {}", config.session_file))?,
        );
        let sink = Arc::new(DirectorySink::new(&config.export_dir));

        let session = Arc::new(SessionController::new(api.clone(), store));
        let jobs = JobOrchestrator::new(session.clone(), api.clone());
        let exporter = ExportCoordinator::new(session.clone(), api, sink);

        Ok(Self {
            session,
            jobs,
            exporter,
        })
    }

    /// 执行一条命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { code } => self.login(&code).await,
            Command::Logout => {
                self.session.logout().await;
                println!("👋 已退出登录");
                Ok(())
            }
            Command::Status => {
                self.resume().await;
                self.render().await;
                Ok(())
            }
            Command::Analyze(args) => self.analyze(args).await,
        }
    }

    async fn login(&self, code: &str) -> Result<()> {
        let redemption = self
            .session
            .redeem(code)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        println!("✅ 登录成功，剩余 {} 积分", redemption.credits);
        Ok(())
    }

    /// 恢复会话并等待余额同步（同步失败只记录警告）
    async fn resume(&self) -> AuthStatus {
        let (status, refresh) = self.session.resume_from_store().await;
        if let Some(handle) = refresh {
            match handle.await {
                Ok(Ok(credits)) => info!("✓ 积分已同步: {}", credits),
                Ok(Err(_)) => {}
                Err(e) => warn!("⚠️ 积分同步任务异常: {}", e),
            }
        }
        status
    }

    async fn analyze(&self, args: AnalyzeArgs) -> Result<()> {
        if !self.resume().await.is_authenticated() {
            anyhow::bail!("尚未登录，请先运行 `cv-analyzer login <CODE>`");
        }

        let job_description = match (&args.job_description, &args.job_description_file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(path)) => Some(
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("读取职位描述失败: {}", path.display()))?,
            ),
            (None, None) => None,
        };

        let documents = load_documents(&args.files).await?;
        let mode = SubmissionMode::infer(documents.len(), job_description.as_deref());
        info!("📄 已加载 {} 份简历，模式: {:?}", documents.len(), mode);

        let payload = SubmissionBuilder::new()
            .build(mode, documents, job_description.as_deref())
            .context("提交内容不完整")?;

        let outcome = self.jobs.submit(payload).await;
        self.render().await;
        let result = outcome.map_err(|e| anyhow::anyhow!(e.user_message()))?;

        if args.export {
            match result.ranking() {
                Some(ranking) => {
                    let exported = self
                        .exporter
                        .export_ranking(ranking)
                        .await
                        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                    println!("📥 已导出: {}", exported.location.display());
                }
                None => warn!("⚠️ 单份分析没有排名，跳过导出"),
            }
        }

        Ok(())
    }

    async fn render(&self) {
        let session = self.session.snapshot().await;
        let job = self.jobs.snapshot().await;
        print!("{}", project(&session, &job));
    }
}

/// 按给定顺序读取所有简历文件
async fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let documents = try_join_all(paths.iter().map(Document::from_path))
        .await
        .context("读取简历文件失败")?;
    Ok(documents)
}
