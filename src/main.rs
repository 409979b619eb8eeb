use anyhow::Result;
use clap::Parser;
use cv_analyzer::cli::Cli;
use cv_analyzer::utils::logging;
use cv_analyzer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url.clone() {
        config = config.with_api_base_url(url);
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)?.run(cli.command).await?;

    Ok(())
}
