use colored::*;

use crate::common::api::models::snapshot::TaskSnapshot;
use crate::common::api::models::task::Task;
use crate::common::format::{
    ProgressLevel, format_bytes, format_progress, format_speed, format_timestamp, status_label,
};

/// 终端输出工具
pub struct PrettyLogger;

impl PrettyLogger {
    /// 显示成功消息
    pub fn success(message: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), message.as_ref());
    }

    /// 显示信息消息
    pub fn info(message: impl AsRef<str>) {
        println!("{} {}", "ℹ".blue().bold(), message.as_ref());
    }

    /// 显示警告消息
    pub fn warning(message: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow().bold(), message.as_ref());
    }

    /// 显示错误消息
    pub fn error(message: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), message.as_ref());
    }

    /// 显示分割线
    pub fn separator() {
        println!("{}", "─".repeat(72).bright_black());
    }

    /// 显示标题
    pub fn title(text: impl AsRef<str>) {
        let text = text.as_ref();
        let width = text.chars().count().min(70);
        let padding = (70 - width) / 2;
        println!(
            "{} {} {}",
            "─".repeat(padding).bright_black(),
            text.bold(),
            "─".repeat(70 - padding - width).bright_black()
        );
    }

    fn progress_cell(progress: f64) -> ColoredString {
        let text = format_progress(progress);
        match ProgressLevel::of(progress) {
            ProgressLevel::Low => text.red(),
            ProgressLevel::Medium => text.yellow(),
            ProgressLevel::High => text.green(),
        }
    }

    fn status_cell(is_successful: bool) -> ColoredString {
        let label = status_label(is_successful);
        if is_successful { label.green() } else { label.red() }
    }

    /// 单行显示运行中的任务
    pub fn running_task(task: &Task) {
        println!(
            "{} {} {} {} {}",
            "⬇".blue().bold(),
            task.aid.cyan(),
            task.title.bold(),
            Self::progress_cell(task.progress),
            format_speed(task.download_speed).bright_black()
        );
    }

    /// 单行显示已结束的任务
    pub fn finished_task(task: &Task) {
        println!(
            "{} {} {} {} {} {}",
            "■".bright_black(),
            task.aid.cyan(),
            task.title.bold(),
            Self::status_cell(task.is_successful),
            format_bytes(task.total_downloaded_bytes),
            format_timestamp(task.finished_time()).bright_black()
        );
    }

    pub fn snapshot(snapshot: &TaskSnapshot) {
        Self::title(format!("运行中 ({})", snapshot.running().len()));
        for task in snapshot.running() {
            Self::running_task(task);
        }
        Self::title(format!("已完成 ({})", snapshot.finished().len()));
        for task in snapshot.finished() {
            Self::finished_task(task);
        }
        Self::separator();
    }

    /// 显示任务详情
    pub fn task_detail(task: &Task) {
        Self::title(format!("任务详情 - {}", task.aid));
        let rows = [
            ("AID", task.aid.clone()),
            ("标题", task.title.clone()),
            ("URL", task.url.clone()),
            ("创建时间", format_timestamp(task.created_time())),
            ("完成时间", format_timestamp(task.finished_time())),
            ("进度", format_progress(task.progress)),
            ("下载速度", format_speed(task.download_speed)),
            ("已下载", format_bytes(task.total_downloaded_bytes)),
            ("状态", status_label(task.is_successful).to_string()),
        ];
        for (label, value) in rows {
            println!("  {}: {}", label.bold(), value);
        }
    }
}

/// 便捷宏用于漂亮的日志输出
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::warning(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::error(format!($($arg)*))
    };
}
