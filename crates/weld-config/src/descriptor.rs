//! Bean 归档描述文件
//!
//! 描述文件相当于 `beans.xml`, 支持 TOML、YAML 与 JSON:
//!
//! ```toml
//! bean-discovery-mode = "all"
//! alternatives = ["app.MockPaymentService"]
//! excludes = ["app.internal.*"]
//! ```

use crate::loader::invalid_patterns;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use weld_common::{BeanDiscoveryMode, ConfigError, ConfigResult};
use weld_spi::BeansXml;

/// 描述文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl DescriptorFormat {
    /// 按文件扩展名识别格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawDescriptor {
    bean_discovery_mode: Option<BeanDiscoveryMode>,
    alternatives: Vec<String>,
    excludes: Vec<String>,
}

/// 解析描述文件内容, 未声明发现模式时使用 `default_mode`
pub fn parse_descriptor(
    content: &str,
    format: DescriptorFormat,
    default_mode: BeanDiscoveryMode,
) -> ConfigResult<BeansXml> {
    let raw: RawDescriptor = match format {
        DescriptorFormat::Toml => toml::from_str(content).map_err(ConfigError::parse)?,
        DescriptorFormat::Yaml => {
            // 空文档等价于没有任何声明
            if content.trim().is_empty() {
                RawDescriptor::default()
            } else {
                serde_yaml::from_str(content).map_err(ConfigError::parse)?
            }
        }
        DescriptorFormat::Json => serde_json::from_str(content).map_err(ConfigError::parse)?,
    };

    let errors = invalid_patterns("excludes", &raw.excludes);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    let mut beans_xml = BeansXml::new(raw.bean_discovery_mode.unwrap_or(default_mode));
    beans_xml.enabled_alternatives = raw.alternatives;
    beans_xml.excludes = raw.excludes;
    Ok(beans_xml)
}

/// 读取描述文件
pub fn load_descriptor(
    path: impl AsRef<Path>,
    default_mode: BeanDiscoveryMode,
) -> ConfigResult<BeansXml> {
    let path = path.as_ref();
    let format = DescriptorFormat::from_path(path).ok_or_else(|| ConfigError::ValidationFailed {
        errors: vec![format!("无法识别的描述文件格式: {}", path.display())],
    })?;
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(ConfigError::parse)?;
    debug!("读取 Bean 描述文件: {} ({:?})", path.display(), format);
    parse_descriptor(&content, format, default_mode)
}
