use chrono::{DateTime, Local};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// 将字节数格式化为易读的形式
pub fn format_bytes(size: u64) -> String {
    let value = size as f64;
    if value < KIB {
        format!("{} B", size)
    } else if value < MIB {
        format!("{:.2} KB", value / KIB)
    } else if value < GIB {
        format!("{:.2} MB", value / MIB)
    } else {
        format!("{:.2} GB", value / GIB)
    }
}

pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// 时间为空时输出空串
pub fn format_timestamp(time: Option<DateTime<Local>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn format_progress(progress: f64) -> String {
    format!("{:.2}%", progress * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Low,
    Medium,
    High,
}

impl ProgressLevel {
    pub fn of(progress: f64) -> Self {
        if progress < 0.3 {
            ProgressLevel::Low
        } else if progress < 0.7 {
            ProgressLevel::Medium
        } else {
            ProgressLevel::High
        }
    }
}

pub fn status_label(is_successful: bool) -> &'static str {
    if is_successful { "成功" } else { "失败" }
}
