use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use bbdown_manager::common::logger::PrettyLogger;
use bbdown_manager::{
    AddOutcome, BackendClient, BackendConfig, Listing, Lookup, RemoveOutcome, ShutdownOutcome,
    TaskPoller, log_info, log_success, log_warning,
};

mod cli;

/// 配置文件打底，命令行参数覆盖
async fn load_config(args: &cli::Cli) -> Result<BackendConfig> {
    let mut config = match &args.config {
        Some(path) => BackendConfig::load(path)
            .await
            .with_context(|| format!("无法加载配置文件 {:?}", path))?,
        None => BackendConfig::default(),
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;

    debug!("当前配置: {:?}", config);
    Ok(config)
}

async fn list_tasks(client: &BackendClient, running: bool, finished: bool, json: bool) -> Result<()> {
    if running || finished {
        let tasks = if running {
            client.list_running().await
        } else {
            client.list_finished().await
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&tasks)?);
            return Ok(());
        }
        for task in &tasks {
            if running {
                PrettyLogger::running_task(task);
            } else {
                PrettyLogger::finished_task(task);
            }
        }
        if tasks.is_empty() {
            log_info!("没有任务");
        }
        return Ok(());
    }

    match client.list_all().await {
        Listing::Available(snapshot) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                PrettyLogger::snapshot(&snapshot);
            }
            Ok(())
        }
        Listing::Unavailable(e) => bail!("获取任务失败: {}", e),
    }
}

async fn remove_tasks(client: &BackendClient, aids: &[String]) -> Result<()> {
    let outcomes =
        futures::future::join_all(aids.iter().map(|aid| client.remove_one(aid))).await;

    let mut failed = 0;
    for (aid, outcome) in aids.iter().zip(outcomes) {
        match outcome {
            RemoveOutcome::Removed => log_success!("已移除任务 {}", aid),
            RemoveOutcome::Failed(e) => {
                failed += 1;
                PrettyLogger::error(format!("移除任务 {} 失败: {}", aid, e));
            }
        }
    }

    if failed > 0 {
        bail!("{} 个任务移除失败", failed);
    }
    Ok(())
}

async fn watch_tasks(client: BackendClient, interval: Duration) -> Result<()> {
    let poller = TaskPoller::new(client, interval);
    let mut updates = poller.subscribe();
    let handle = poller.spawn();
    log_info!("每 {} 秒刷新一次，按 Ctrl+C 退出", interval.as_secs());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    println!();
                    PrettyLogger::snapshot(&snapshot);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("跳过了 {} 次过期的刷新结果", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    info!("已退出监视");
    Ok(())
}

async fn stop_backend(client: &BackendClient) -> Result<()> {
    if let ShutdownOutcome::Failed(e) = client.shutdown().await {
        bail!("停止服务器失败: {}", e);
    }

    // 等待服务端真正退出
    tokio::time::sleep(Duration::from_secs(2)).await;
    if client.probe(Duration::from_secs(2)).await {
        log_warning!("服务器可能仍在运行，请手动检查");
    } else {
        log_success!("BBDown服务器已停止");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = load_config(&args).await?;
    let client = BackendClient::from_config(&config).context("无法创建客户端")?;
    debug!("连接目标: {}", client.base_url());

    match &args.command {
        cli::Command::List {
            running,
            finished,
            json,
        } => list_tasks(&client, *running, *finished, *json).await?,

        cli::Command::Show { aid } => match client.get_one(aid).await {
            Lookup::Found(task) => PrettyLogger::task_detail(&task),
            Lookup::NotFound(e) => bail!("找不到任务 {}: {}", aid, e),
        },

        cli::Command::Add(add) => {
            let options = add.to_options()?;
            match client.add(&add.url, &options).await {
                AddOutcome::Accepted => log_success!("任务已添加: {}", add.url.trim()),
                AddOutcome::Rejected(e) => bail!("添加任务失败: {}", e),
            }
        }

        cli::Command::Remove { aids } => remove_tasks(&client, aids).await?,

        cli::Command::ClearFinished => match client.remove_all_finished().await {
            RemoveOutcome::Removed => log_success!("已移除所有已完成任务"),
            RemoveOutcome::Failed(e) => bail!("移除已完成任务失败: {}", e),
        },

        cli::Command::ClearFailed => match client.remove_all_failed().await {
            RemoveOutcome::Removed => log_success!("已移除所有失败任务"),
            RemoveOutcome::Failed(e) => bail!("移除失败任务失败: {}", e),
        },

        cli::Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval());
            watch_tasks(client.clone(), interval).await?
        }

        cli::Command::Status => {
            if client.probe(client.read_timeout()).await {
                log_success!("{} {}", "服务端在线:".green(), client.base_url());
            } else {
                bail!("无法连接到BBDown服务器: {}", client.base_url());
            }
        }

        cli::Command::Stop => stop_backend(&client).await?,
    }

    Ok(())
}
