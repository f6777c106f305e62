//! 程序配置
//!
//! 配置文件为分节的 `key = value` 文本（`[section]` 节头、`#` 注释、空行忽略），
//! 启动时一次性解析为 [`Config`]，之后作为显式参数传入各层。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;

/// 默认的元数据文件名
pub const DEFAULT_METADATA_FILE: &str = "gifs_metadata.json";

const IDENTITY_VARS: &[&str] = &["GIPHY_USERNAME", "username", "USERNAME", "email", "EMAIL"];
const SECRET_VARS: &[&str] = &["GIPHY_PASSWORD", "pword", "PWORD", "password", "PASSWORD"];

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 素材（GIF）所在目录
    pub asset_dir: PathBuf,
    /// 元数据文件名（位于素材目录内）
    pub metadata_file: String,
    /// 参与上传的文件扩展名（小写，不带点）
    pub extensions: Vec<String>,
    /// 默认标签，逗号分隔
    pub default_tags: String,
    /// 目标合集名称，为空时跳过合集选择
    pub collection_name: String,
    /// 每批最多上传数量
    pub batch_size: usize,
    /// 批次之间的冷却时间
    pub cooldown: Duration,
    /// 浏览器调试端口，设置后连接已有浏览器而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 登录页
    pub login_url: String,
    /// 上传页
    pub upload_url: String,
    /// 等待条目渲染时的数量上限
    pub render_cap: usize,
    /// 会话内的各类等待时间
    pub timings: SessionTimings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("."),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            extensions: vec!["gif".to_string()],
            default_tags: String::new(),
            collection_name: String::new(),
            batch_size: 100,
            cooldown: Duration::from_secs(15 * 60),
            browser_debug_port: None,
            login_url: "https://giphy.com/login".to_string(),
            upload_url: "https://giphy.com/upload".to_string(),
            render_cap: 100,
            timings: SessionTimings::default(),
        }
    }
}

/// 上传会话中的等待时间
#[derive(Clone, Debug)]
pub struct SessionTimings {
    /// 提交文件后的固定等待
    pub settle: Duration,
    /// 等待条目行渲染的超时
    pub render_timeout: Duration,
    /// 等待文件上传控件出现的超时
    pub intake_timeout: Duration,
    /// 默认标签逐个输入时，每个标签之后的停顿
    pub token_pause: Duration,
    /// 默认标签的按键间隔
    pub bulk_keystroke_delay: Duration,
    /// 单个条目标签的按键间隔
    pub row_keystroke_delay: Duration,
    /// 默认标签确认后的等待
    pub bulk_confirm_pause: Duration,
    /// 上传前重新确认合集的最大尝试次数
    pub collection_attempts: usize,
    /// 每次确认合集失败后的等待
    pub collection_retry_delay: Duration,
    /// 提交后无条件的最短等待
    pub min_completion_wait: Duration,
    /// 最短等待之后的宽限期
    pub completion_grace: Duration,
    /// 轮询页面状态的间隔
    pub poll_interval: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(30),
            render_timeout: Duration::from_secs(40),
            intake_timeout: Duration::from_secs(15),
            token_pause: Duration::from_secs(1),
            bulk_keystroke_delay: Duration::from_millis(25),
            row_keystroke_delay: Duration::from_millis(60),
            bulk_confirm_pause: Duration::from_secs(5),
            collection_attempts: 10,
            collection_retry_delay: Duration::from_secs(2),
            min_completion_wait: Duration::from_secs(5 * 60),
            completion_grace: Duration::from_secs(3 * 60),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// 配置文件不存在、数值非法或素材目录不存在时返回错误。
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = ConfigFile::read(path)?;
        let config = Self::from_file(&file)?;

        if !config.asset_dir.is_dir() {
            return Err(ConfigError::AssetDirNotFound {
                path: config.asset_dir.clone(),
            });
        }

        Ok(config)
    }

    /// 从已解析的配置文件构建（不检查目录）
    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let default = Self::default();

        let asset_dir = file
            .get("gif_output", "folder")
            .or_else(|| file.get("output", "folder"))
            .map(PathBuf::from)
            .unwrap_or(default.asset_dir);

        let mut metadata_file = file
            .get("giphy_upload", "metadata_json")
            .unwrap_or(DEFAULT_METADATA_FILE)
            .to_string();

        // 未显式指定时，按影片标题自动探测
        if metadata_file == DEFAULT_METADATA_FILE {
            if let Some(title) = file.get("movie", "title") {
                let candidate = format!("gifs_metadata_{}.json", title);
                if asset_dir.join(&candidate).exists() {
                    info!("自动识别元数据文件: {}", candidate);
                    metadata_file = candidate;
                }
            }
        }

        let extensions = match file.get("giphy_upload", "extensions") {
            Some(raw) => split_list(raw)
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            None => default.extensions,
        };

        let cooldown = match file.parse_value::<u64>("giphy_upload", "cooldown_minutes", "非负整数")? {
            Some(minutes) => minutes
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidValue {
                    section: "giphy_upload".to_string(),
                    key: "cooldown_minutes".to_string(),
                    value: minutes.to_string(),
                    expected: "合理的分钟数",
                })?,
            None => default.cooldown,
        };

        let batch_size = file
            .parse_value::<usize>("giphy_upload", "batch_size", "正整数")?
            .unwrap_or(default.batch_size);
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: "giphy_upload".to_string(),
                key: "batch_size".to_string(),
                value: "0".to_string(),
                expected: "正整数",
            });
        }

        Ok(Self {
            asset_dir,
            metadata_file,
            extensions,
            default_tags: file.get("giphy_upload", "tags").unwrap_or_default().to_string(),
            collection_name: file
                .get("giphy_upload", "collection_name")
                .unwrap_or_default()
                .to_string(),
            batch_size,
            cooldown,
            ..default
        })
    }
}

/// 分节的 key=value 配置文件
#[derive(Debug, Default, Clone)]
pub struct ConfigFile {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigFile {
    /// 读取并解析配置文件
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse(&content))
    }

    /// 解析配置文本，节外的键值对会被忽略
    pub fn parse(content: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(name) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .filter(|name| !name.is_empty())
            {
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            if let (Some(section), Some((key, value))) = (&current, trimmed.split_once('=')) {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                sections
                    .entry(section.clone())
                    .or_default()
                    .insert(key.to_string(), value.trim().to_string());
            }
        }

        Self { sections }
    }

    /// 读取配置值
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    fn parse_value<T: std::str::FromStr>(
        &self,
        section: &str,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(section, key).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
                expected,
            }),
            None => Ok(None),
        }
    }
}

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    /// 从环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 按候选变量名顺序查找，取第一个非空值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first = |names: &'static [&'static str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        let identity = first(IDENTITY_VARS).ok_or(ConfigError::CredentialsMissing {
            what: "用户名",
            tried: IDENTITY_VARS,
        })?;
        let secret = first(SECRET_VARS).ok_or(ConfigError::CredentialsMissing {
            what: "密码",
            tried: SECRET_VARS,
        })?;

        Ok(Self { identity, secret })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .finish()
    }
}

/// 逗号分隔列表，去空白、去空项
pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}
