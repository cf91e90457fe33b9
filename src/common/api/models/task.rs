use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// BBDown 服务端返回的单个下载任务
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_string")]
    pub aid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(rename = "TaskCreateTime", default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<i64>,
    #[serde(rename = "TaskFinishTime", default, deserialize_with = "lenient_timestamp")]
    pub finished_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: f64,
    #[serde(rename = "DownloadSpeed", default, deserialize_with = "lenient_u64")]
    pub download_speed: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_downloaded_bytes: u64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_successful: bool,
}

impl Task {
    pub fn new(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            ..Default::default()
        }
    }

    /// 服务端已写入完成时间即视为结束，与成功与否无关
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn created_time(&self) -> Option<DateTime<Local>> {
        self.created_at.and_then(to_local_time)
    }

    pub fn finished_time(&self) -> Option<DateTime<Local>> {
        self.finished_at.and_then(to_local_time)
    }
}

fn to_local_time(secs: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(secs, 0).single()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        ),
        _ => false,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| {
        n.as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
    }))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number
        .and_then(|n| {
            n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite())
                    .map(|v| if v > 0.0 { v.trunc() as u64 } else { 0 })
            })
        })
        .unwrap_or(0))
}

fn lenient_progress<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if value.is_nan() {
        return Ok(0.0);
    }
    Ok(value.clamp(0.0, 1.0))
}
