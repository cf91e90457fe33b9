use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use bbdown_manager::common::api::models::options::{AddTaskOptions, OptionError, OptionKey};

/// BBDown 任务管理器
#[derive(Parser, Debug)]
#[command(name = "bbdm")]
#[command(version = "0.1")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "管理 BBDown 服务端下载任务的命令行工具", long_about = None)]
pub struct Cli {
    /// BBDown 服务端主机
    #[arg(long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// BBDown 服务端端口
    #[arg(long, global = true, value_name = "PORT")]
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// JSON 配置文件
    #[arg(long, global = true, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 列出任务
    List {
        /// 只看运行中的任务
        #[arg(long, conflicts_with = "finished")]
        running: bool,
        /// 只看已完成的任务
        #[arg(long)]
        finished: bool,
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 查看任务详情
    Show {
        #[arg(value_name = "AID")]
        aid: String,
    },
    /// 添加下载任务
    Add(AddArgs),
    /// 移除指定任务
    Remove {
        #[arg(value_name = "AID", required = true)]
        aids: Vec<String>,
    },
    /// 移除全部已完成任务
    ClearFinished,
    /// 移除全部失败任务
    ClearFailed,
    /// 持续刷新任务列表
    Watch {
        /// 刷新间隔（秒）
        #[arg(long, value_name = "SECS")]
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
    /// 检查服务端是否在线
    Status,
    /// 请求服务端退出
    Stop,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiVariant {
    /// 网页端 API
    Web,
    /// TV 端 API
    Tv,
    /// App 端 API
    App,
    /// 国际版 API
    Intl,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentOnly {
    Video,
    Audio,
    Danmaku,
    Cover,
    Sub,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// BV/av/ep/ss号或视频URL
    #[arg(value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: String,

    /// 解析使用的 API
    #[arg(long, value_enum, default_value_t = ApiVariant::Web)]
    pub api: ApiVariant,

    /// 只下载某一类内容
    #[arg(long, value_enum, value_name = "KIND")]
    pub only: Option<ContentOnly>,

    /// 下载文件保存路径
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub work_dir: Option<String>,

    /// 文件命名模式，如: <videoTitle>[<dfn>]
    #[arg(long, value_name = "PATTERN")]
    pub file_pattern: Option<String>,

    /// 多P文件命名模式，如: P<pageNumber>_<videoTitle>
    #[arg(long, value_name = "PATTERN")]
    pub multi_file_pattern: Option<String>,

    /// 分页选择，如: 1-5,8
    #[arg(long, value_name = "PAGES")]
    pub select_page: Option<String>,

    /// 画质优先级，如: 1080p,720p
    #[arg(long, value_name = "LIST")]
    pub dfn_priority: Option<String>,

    /// 编码优先级，如: hevc,av1,avc
    #[arg(long, value_name = "LIST")]
    pub encoding_priority: Option<String>,

    /// B站Cookie
    #[arg(long, value_name = "COOKIE")]
    pub cookie: Option<String>,

    /// API访问令牌
    #[arg(long, value_name = "TOKEN")]
    pub access_token: Option<String>,

    /// 多线程下载
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub multi_thread: bool,

    /// 跳过AI生成字幕
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub skip_ai: bool,

    /// 下载弹幕
    #[arg(long)]
    pub download_danmaku: bool,

    /// 使用aria2c下载
    #[arg(long)]
    pub use_aria2c: bool,

    /// 跳过混流步骤
    #[arg(long)]
    pub skip_mux: bool,

    /// 跳过字幕下载
    #[arg(long)]
    pub skip_subtitle: bool,

    /// 跳过封面下载
    #[arg(long)]
    pub skip_cover: bool,

    /// 其余选项，如: -o FFmpegPath=/usr/bin/ffmpeg -o ForceHttp
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,
}

impl AddArgs {
    pub fn to_options(&self) -> Result<AddTaskOptions, OptionError> {
        let mut options = AddTaskOptions::new();

        options
            .set_flag(OptionKey::UseTvApi, self.api == ApiVariant::Tv)
            .set_flag(OptionKey::UseAppApi, self.api == ApiVariant::App)
            .set_flag(OptionKey::UseIntlApi, self.api == ApiVariant::Intl);

        let only = [
            (ContentOnly::Video, OptionKey::VideoOnly),
            (ContentOnly::Audio, OptionKey::AudioOnly),
            (ContentOnly::Danmaku, OptionKey::DanmakuOnly),
            (ContentOnly::Cover, OptionKey::CoverOnly),
            (ContentOnly::Sub, OptionKey::SubOnly),
        ];
        for (kind, key) in only {
            options.set_flag(key, self.only == Some(kind));
        }

        options
            .set_flag(OptionKey::MultiThread, self.multi_thread)
            .set_flag(OptionKey::SkipAi, self.skip_ai)
            .set_flag(OptionKey::DownloadDanmaku, self.download_danmaku)
            .set_flag(OptionKey::UseAria2c, self.use_aria2c)
            .set_flag(OptionKey::SkipMux, self.skip_mux)
            .set_flag(OptionKey::SkipSubtitle, self.skip_subtitle)
            .set_flag(OptionKey::SkipCover, self.skip_cover);

        let texts = [
            (OptionKey::WorkDir, &self.work_dir),
            (OptionKey::FilePattern, &self.file_pattern),
            (OptionKey::MultiFilePattern, &self.multi_file_pattern),
            (OptionKey::SelectPage, &self.select_page),
            (OptionKey::DfnPriority, &self.dfn_priority),
            (OptionKey::EncodingPriority, &self.encoding_priority),
            (OptionKey::Cookie, &self.cookie),
            (OptionKey::AccessToken, &self.access_token),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                options.set_text(key, value);
            }
        }

        // 手写的选项最后写入，可以覆盖上面的值
        for pair in &self.extra {
            options.set_pair(pair)?;
        }

        Ok(options)
    }
}
