// apps/nf_cli/src/main.rs

//! NaviFlow 命令行界面
//!
//! 非结构有限体积求解器的命令行入口。
//! 正常结束退出码 0；配置或网格装载错误退出码 1。

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::FmtSubscriber;

/// NaviFlow 非结构有限体积求解器
#[derive(Parser)]
#[command(name = "nf_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NaviFlow unstructured finite-volume solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行算例
    Run(commands::run::RunArgs),
    /// 校验算例文件与网格
    Validate(commands::validate::ValidateArgs),
    /// 显示网格信息
    Info(commands::info::InfoArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("日志初始化失败");

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
