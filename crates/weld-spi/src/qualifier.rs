//! 限定符
//!
//! 限定符由类型名与成员值组成。被声明为非绑定的成员不参与相等性与哈希,
//! 因此 `@Cache(value = 1, note = 5)` 与 `@Cache(value = 1)` 在解析时等价。

use crate::scope::Scope;
use crate::types::BeanType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// `@Any` 限定符类型名
pub const ANY: &str = "Any";
/// `@Default` 限定符类型名
pub const DEFAULT: &str = "Default";
/// `@Named` 限定符类型名
pub const NAMED: &str = "Named";
/// `@Initialized` 限定符类型名
pub const INITIALIZED: &str = "Initialized";
/// `@BeforeDestroyed` 限定符类型名
pub const BEFORE_DESTROYED: &str = "BeforeDestroyed";
/// `@Destroyed` 限定符类型名
pub const DESTROYED: &str = "Destroyed";

/// 限定符成员值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualifierValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Type(BeanType),
    List(Vec<QualifierValue>),
}

impl fmt::Display for QualifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "\"{v}\""),
            Self::Type(v) => write!(f, "{v}"),
            Self::List(values) => {
                f.write_str("{")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for QualifierValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for QualifierValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for QualifierValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for QualifierValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for QualifierValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for QualifierValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for QualifierValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<BeanType> for QualifierValue {
    fn from(value: BeanType) -> Self {
        Self::Type(value)
    }
}

impl<T: Into<QualifierValue>> From<Vec<T>> for QualifierValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// 限定符实例
///
/// 非绑定声明随实例保存, 相等性与哈希只看各自的绑定成员。
/// 手工构造的必需限定符若带有 Bean 侧声明为非绑定的成员, 必须同样声明
/// (`with_nonbinding_member` 或 `declare_nonbinding`), 否则该成员按绑定成员比较。
#[derive(Clone, Serialize, Deserialize)]
pub struct Qualifier {
    type_name: String,
    members: BTreeMap<String, QualifierValue>,
    nonbinding: BTreeSet<String>,
}

impl Qualifier {
    /// 创建不带成员的限定符
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: BTreeMap::new(),
            nonbinding: BTreeSet::new(),
        }
    }

    /// 添加绑定成员
    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<QualifierValue>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// 添加非绑定成员
    pub fn with_nonbinding_member(
        mut self,
        name: impl Into<String>,
        value: impl Into<QualifierValue>,
    ) -> Self {
        let name = name.into();
        self.nonbinding.insert(name.clone());
        self.members.insert(name, value.into());
        self
    }

    /// 把成员名声明为非绑定, 成员可以尚未赋值
    pub fn declare_nonbinding(mut self, name: impl Into<String>) -> Self {
        self.nonbinding.insert(name.into());
        self
    }

    /// `@Any`
    pub fn any() -> Self {
        Self::new(ANY)
    }

    /// `@Default`
    pub fn default_qualifier() -> Self {
        Self::new(DEFAULT)
    }

    /// `@Named(value)`
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(NAMED).with_member("value", value.into())
    }

    /// `@Initialized(scope)`
    pub fn initialized(scope: &Scope) -> Self {
        Self::new(INITIALIZED).with_member("value", scope.name())
    }

    /// `@BeforeDestroyed(scope)`
    pub fn before_destroyed(scope: &Scope) -> Self {
        Self::new(BEFORE_DESTROYED).with_member("value", scope.name())
    }

    /// `@Destroyed(scope)`
    pub fn destroyed(scope: &Scope) -> Self {
        Self::new(DESTROYED).with_member("value", scope.name())
    }

    /// 限定符类型名
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 成员值
    pub fn member(&self, name: &str) -> Option<&QualifierValue> {
        self.members.get(name)
    }

    /// 成员是否参与相等性判断
    pub fn is_binding(&self, name: &str) -> bool {
        !self.nonbinding.contains(name)
    }

    /// 参与相等性判断的成员
    pub fn binding_members(&self) -> impl Iterator<Item = (&String, &QualifierValue)> {
        self.members
            .iter()
            .filter(|(name, _)| !self.nonbinding.contains(*name))
    }

    /// 是否为 `@Any`
    pub fn is_any(&self) -> bool {
        self.type_name == ANY
    }

    /// 是否为 `@Default`
    pub fn is_default(&self) -> bool {
        self.type_name == DEFAULT
    }

    /// 是否为 `@Named`
    pub fn is_named(&self) -> bool {
        self.type_name == NAMED
    }

    /// `@Named` 的值
    pub fn named_value(&self) -> Option<&str> {
        if !self.is_named() {
            return None;
        }
        match self.members.get("value") {
            Some(QualifierValue::Str(value)) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.binding_members().eq(other.binding_members())
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        for (name, value) in self.binding_members() {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl PartialOrd for Qualifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Qualifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_name
            .cmp(&other.type_name)
            .then_with(|| self.binding_members().cmp(other.binding_members()))
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.type_name)?;
        if self.members.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, (name, value)) in self.members.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// 可以转换为限定符的类型, `#[derive(Qualifier)]` 生成该实现
pub trait AsQualifier {
    /// 转换为限定符实例
    fn to_qualifier(&self) -> Qualifier;
}

impl AsQualifier for Qualifier {
    fn to_qualifier(&self) -> Qualifier {
        self.clone()
    }
}

/// 格式化限定符集合, 用于错误信息
pub fn describe_qualifiers(qualifiers: &[Qualifier]) -> String {
    if qualifiers.is_empty() {
        return "{}".to_string();
    }
    let parts: Vec<String> = qualifiers.iter().map(ToString::to_string).collect();
    format!("{{{}}}", parts.join(", "))
}
