use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

/// 添加任务请求中 URL 所在的键
pub const URL_KEY: &str = "Url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    Text,
}

macro_rules! option_keys {
    ($($variant:ident => ($name:literal, $kind:ident)),* $(,)?) => {
        /// BBDown `add-task` 接口认识的全部选项
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum OptionKey {
            $($variant),*
        }

        impl OptionKey {
            pub const ALL: &'static [OptionKey] = &[$(OptionKey::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(OptionKey::$variant => $name),*
                }
            }

            pub fn kind(&self) -> OptionKind {
                match self {
                    $(OptionKey::$variant => OptionKind::$kind),*
                }
            }
        }
    };
}

option_keys! {
    // 基本选项
    OnlyShowInfo => ("OnlyShowInfo", Flag),
    ShowAll => ("ShowAll", Flag),
    Interactive => ("Interactive", Flag),
    Area => ("Area", Text),
    Language => ("Language", Text),
    DelayPerPage => ("DelayPerPage", Text),
    // API
    UseTvApi => ("UseTvApi", Flag),
    UseAppApi => ("UseAppApi", Flag),
    UseIntlApi => ("UseIntlApi", Flag),
    TvHost => ("TvHost", Text),
    // 内容选择
    VideoOnly => ("VideoOnly", Flag),
    AudioOnly => ("AudioOnly", Flag),
    DanmakuOnly => ("DanmakuOnly", Flag),
    CoverOnly => ("CoverOnly", Flag),
    SubOnly => ("SubOnly", Flag),
    DownloadDanmaku => ("DownloadDanmaku", Flag),
    DownloadDanmakuFormats => ("DownloadDanmakuFormats", Text),
    SkipAi => ("SkipAi", Flag),
    // 下载控制
    MultiThread => ("MultiThread", Flag),
    UseMp4box => ("UseMP4box", Flag),
    UseAria2c => ("UseAria2c", Flag),
    SimplyMux => ("SimplyMux", Flag),
    SkipMux => ("SkipMux", Flag),
    SkipSubtitle => ("SkipSubtitle", Flag),
    SkipCover => ("SkipCover", Flag),
    EncodingPriority => ("EncodingPriority", Text),
    DfnPriority => ("DfnPriority", Text),
    SelectPage => ("SelectPage", Text),
    // 文件命名
    FilePattern => ("FilePattern", Text),
    MultiFilePattern => ("MultiFilePattern", Text),
    AddDfnSubfix => ("AddDfnSubfix", Flag),
    NoPaddingPageNum => ("NoPaddingPageNum", Flag),
    // 路径
    WorkDir => ("WorkDir", Text),
    FfmpegPath => ("FFmpegPath", Text),
    Mp4boxPath => ("Mp4boxPath", Text),
    Aria2cPath => ("Aria2cPath", Text),
    // 网络
    UserAgent => ("UserAgent", Text),
    Cookie => ("Cookie", Text),
    AccessToken => ("AccessToken", Text),
    Host => ("Host", Text),
    EpHost => ("EpHost", Text),
    UposHost => ("UposHost", Text),
    Aria2cArgs => ("Aria2cArgs", Text),
    Aria2cProxy => ("Aria2cProxy", Text),
    // 高级
    Debug => ("Debug", Flag),
    ForceHttp => ("ForceHttp", Flag),
    AllowPcdn => ("AllowPcdn", Flag),
    ForceReplaceHost => ("ForceReplaceHost", Flag),
    SaveArchivesToFile => ("SaveArchivesToFile", Flag),
    VideoAscending => ("VideoAscending", Flag),
    AudioAscending => ("AudioAscending", Flag),
    BandwithAscending => ("BandwithAscending", Flag),
    // 兼容性
    OnlyHevc => ("OnlyHevc", Flag),
    OnlyAvc => ("OnlyAvc", Flag),
    OnlyAv1 => ("OnlyAv1", Flag),
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        OptionKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| OptionError::UnknownKey(name.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("未知的选项: {0}")]
    UnknownKey(String),

    #[error("选项 {key} 需要布尔值，实际为: {value}")]
    InvalidFlag { key: OptionKey, value: String },

    #[error("选项格式应为 KEY=VALUE: {0}")]
    MalformedPair(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Flag(bool),
}

/// 添加任务时附带的稀疏选项表。
///
/// 文本值会去掉首尾空白，空串直接丢弃；布尔值无论真假都会发送。
/// 字段之间的互斥关系交给服务端校验。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTaskOptions {
    values: BTreeMap<OptionKey, OptionValue>,
}

impl AddTaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&mut self, key: OptionKey, value: bool) -> &mut Self {
        self.values.insert(key, OptionValue::Flag(value));
        self
    }

    pub fn set_text(&mut self, key: OptionKey, value: impl AsRef<str>) -> &mut Self {
        let value = value.as_ref().trim();
        if value.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, OptionValue::Text(value.to_string()));
        }
        self
    }

    pub fn with_flag(mut self, key: OptionKey, value: bool) -> Self {
        self.set_flag(key, value);
        self
    }

    pub fn with_text(mut self, key: OptionKey, value: impl AsRef<str>) -> Self {
        self.set_text(key, value);
        self
    }

    /// 按选项名和字符串值写入，布尔选项接受 true/false/1/0/yes/no
    pub fn set_raw(&mut self, name: &str, value: &str) -> Result<&mut Self, OptionError> {
        let key: OptionKey = name.parse()?;
        match key.kind() {
            OptionKind::Text => Ok(self.set_text(key, value)),
            OptionKind::Flag => {
                let flag = parse_flag(value).ok_or_else(|| OptionError::InvalidFlag {
                    key,
                    value: value.to_string(),
                })?;
                Ok(self.set_flag(key, flag))
            }
        }
    }

    /// 解析 `KEY=VALUE`，省略 `=VALUE` 时布尔选项视为 true
    pub fn set_pair(&mut self, pair: &str) -> Result<&mut Self, OptionError> {
        match pair.split_once('=') {
            Some((name, value)) => self.set_raw(name, value),
            None => {
                let key: OptionKey = pair.parse()?;
                if key.kind() == OptionKind::Flag {
                    Ok(self.set_flag(key, true))
                } else {
                    Err(OptionError::MalformedPair(pair.to_string()))
                }
            }
        }
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.values.get(&key)
    }

    pub fn remove(&mut self, key: OptionKey) -> Option<OptionValue> {
        self.values.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// 生成 `add-task` 请求体，`url` 写入 `Url` 键
    pub fn to_request_body(&self, url: &str) -> Value {
        let mut body = Map::new();
        body.insert(URL_KEY.to_string(), Value::String(url.trim().to_string()));
        for (key, value) in &self.values {
            let value = match value {
                OptionValue::Text(text) => Value::String(text.clone()),
                OptionValue::Flag(flag) => Value::Bool(*flag),
            };
            body.insert(key.as_str().to_string(), value);
        }
        Value::Object(body)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
