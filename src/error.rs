use std::path::PathBuf;

use thiserror::Error;

use crate::workflow::Phase;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命，启动阶段即退出）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 元数据文件写入错误
    #[error("元数据错误: {0}")]
    Metadata(#[from] MetadataError),
    /// 上传会话中止
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 素材目录扫描失败
    #[error("扫描素材目录失败 ({path}): {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {}", path.display())]
    FileNotFound { path: PathBuf },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置值无法解析
    #[error("配置项 [{section}] {key} 解析失败: 值 '{value}' 无法转换为 {expected}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },
    /// 缺少登录凭据
    #[error("缺少{what}，请设置以下任一环境变量: {}", tried.join(", "))]
    CredentialsMissing {
        what: &'static str,
        tried: &'static [&'static str],
    },
    /// 素材目录不存在
    #[error("素材目录不存在: {}", path.display())]
    AssetDirNotFound { path: PathBuf },
}

/// 元数据文件错误
///
/// 读取失败不会出现在这里：读取总是降级为空映射。
#[derive(Debug, Error)]
pub enum MetadataError {
    /// 序列化失败
    #[error("序列化元数据失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 写入失败
    #[error("写入元数据文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 上传会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 不可恢复阶段失败，整个批次放弃且不记录进度
    #[error("[批次 {batch}] 阶段「{phase}」失败，会话中止: {source}")]
    PhaseAborted {
        batch: usize,
        phase: Phase,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SessionError {
    /// 创建阶段中止错误
    pub fn aborted(batch: usize, phase: Phase, source: anyhow::Error) -> Self {
        SessionError::PhaseAborted {
            batch,
            phase,
            source: source.into(),
        }
    }

    /// 失败的阶段
    pub fn phase(&self) -> Phase {
        match self {
            SessionError::PhaseAborted { phase, .. } => *phase,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
