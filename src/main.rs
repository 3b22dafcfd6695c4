//! # hostdi
//!
//! 模拟宿主：启动插件、发布命令按钮并执行命令
//!
//! ```bash
//! hostdi list
//! hostdi --document Tower.model run greet greet
//! hostdi --no-active-app --json run greet
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use hostdi::config::ConfigLoader;
use hostdi::errors::CapabilityError;
use hostdi::host::{
    ActiveHostHandle, DialogService, HostEnvironment, Invocation, RecordingSurface,
};
use hostdi::{HostContext, PluginApplication, ResultCode};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated plugin host for DI command dispatch", long_about = None)]
struct Args {
    /// 配置文件路径，默认 ~/.config/hostdi/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 宿主应用名称
    #[arg(long, default_value = "Designer")]
    host_name: String,

    /// 活动文档标题
    #[arg(long, value_name = "TITLE")]
    document: Option<String>,

    /// 模拟宿主尚未完成初始化（没有活动应用）
    #[arg(long)]
    no_active_app: bool,

    /// 以 JSON 输出结果
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: HostCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum HostCommand {
    /// 列出启动时发布的命令按钮
    List,
    /// 依次执行命令
    Run {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
}

/// 把对话框打印到标准输出
struct ConsoleDialogs;

impl DialogService for ConsoleDialogs {
    fn show(&self, title: &str, body: &str) -> Result<(), CapabilityError> {
        let mut out = io::stdout().lock();
        let mut write = || -> io::Result<()> {
            writeln!(out, "┌ {}", title)?;
            for line in body.lines() {
                writeln!(out, "│ {}", line)?;
            }
            writeln!(out, "└")
        };
        write().map_err(|e| CapabilityError::host_operation("show_dialog", e.to_string()))
    }
}

struct ConsoleHost {
    name: String,
    application: Option<ActiveHostHandle>,
    dialogs: Arc<ConsoleDialogs>,
}

impl HostEnvironment for ConsoleHost {
    fn host_name(&self) -> &str {
        &self.name
    }

    fn active_application(&self) -> Option<ActiveHostHandle> {
        self.application.clone()
    }

    fn dialogs(&self) -> Option<Arc<dyn DialogService>> {
        Some(self.dialogs.clone())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader
        .load()
        .with_context(|| format!("failed to load config from {}", loader.path().display()))?;
    if let Err(err) = hostdi::logging::init_logging(&config.logging) {
        eprintln!("warning: {}", err);
    }

    let application = (!args.no_active_app).then(|| {
        let handle = ActiveHostHandle::new(args.host_name.clone(), env!("CARGO_PKG_VERSION"));
        match &args.document {
            Some(title) => handle.with_document(title.clone()),
            None => handle,
        }
    });
    let host = HostContext::new(ConsoleHost {
        name: args.host_name.clone(),
        application,
        dialogs: Arc::new(ConsoleDialogs),
    });

    let plugin = PluginApplication::new(config);
    let mut surface = RecordingSurface::default();
    if plugin.on_startup(host.clone(), &mut surface) != ResultCode::Succeeded {
        anyhow::bail!("plugin startup failed");
    }

    let mut failures = 0;
    match &args.command {
        HostCommand::List => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(surface.buttons())?);
            } else {
                for (panel, button) in surface.buttons() {
                    println!("[{}] {:<12} {}  {}", panel, button.command_id, button.text, button.tooltip);
                }
            }
        }
        HostCommand::Run { ids } => {
            for id in ids {
                let result = plugin.execute(&Invocation::new(id.as_str()));
                if !result.is_success() {
                    failures += 1;
                }
                if args.json {
                    println!("{}", serde_json::to_string(&result)?);
                } else {
                    match &result.message {
                        Some(message) => println!("{}: {} ({})", result.command, result.code, message),
                        None => println!("{}: {}", result.command, result.code),
                    }
                }
            }
        }
    }

    plugin.on_shutdown(&host);
    if failures > 0 {
        anyhow::bail!("{} command(s) did not succeed", failures);
    }
    Ok(())
}
