//! 命令行参数

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cv-analyzer", version, about = "简历分析客户端")]
pub struct Cli {
    /// 后端 API 地址，优先于 API_BASE_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 使用访问码登录
    Login {
        /// 访问码，例如 AAAA-BBBB-CCCC
        code: String,
    },
    /// 退出登录并清除本地令牌
    Logout,
    /// 查看登录状态和积分
    Status,
    /// 分析一份或多份简历
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// 职位描述文本
    #[arg(long, short = 'j', conflicts_with = "job_description_file")]
    pub job_description: Option<String>,

    /// 从文件读取职位描述
    #[arg(long)]
    pub job_description_file: Option<PathBuf>,

    /// 分析完成后导出排名表格
    #[arg(long)]
    pub export: bool,

    /// 简历文件，顺序即提交顺序
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
