//! Bean 类型模型
//!
//! 描述类、参数化类型、数组、通配符、类型变量与基本类型,
//! 作为类型安全解析的输入。

use serde::{Deserialize, Serialize};
use std::fmt;

/// `Object` 类型名, 所有引用类型的根
pub const OBJECT: &str = "Object";

/// 基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    const ALL: [Self; 9] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Char,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Void,
    ];

    /// 基本类型名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Char => "char",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }

    /// 对应的包装类型名称
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Char => "Character",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Void => "Void",
        }
    }

    /// 根据包装类型名称查找基本类型
    pub fn from_wrapper(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.wrapper_name() == name)
    }
}

/// Bean 类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BeanType {
    /// 原始类 (或擦除后的泛型类)
    Class(String),
    /// 参数化类型
    Parameterized {
        raw: String,
        arguments: Vec<BeanType>,
    },
    /// 数组
    Array(Box<BeanType>),
    /// 通配符, 上界为空时等价于 `Object`
    Wildcard {
        upper: Vec<BeanType>,
        lower: Vec<BeanType>,
    },
    /// 类型变量
    Variable { name: String, bounds: Vec<BeanType> },
    /// 基本类型
    Primitive(Primitive),
}

impl BeanType {
    /// 由 Rust 类型推导类类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Class(std::any::type_name::<T>().to_string())
    }

    /// 类类型
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// `Object`
    pub fn object() -> Self {
        Self::Class(OBJECT.to_string())
    }

    /// 参数化类型
    pub fn parameterized(raw: impl Into<String>, arguments: Vec<BeanType>) -> Self {
        Self::Parameterized {
            raw: raw.into(),
            arguments,
        }
    }

    /// 数组类型
    pub fn array(component: BeanType) -> Self {
        Self::Array(Box::new(component))
    }

    /// 无界通配符 `?`
    pub fn wildcard() -> Self {
        Self::Wildcard {
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }

    /// 上界通配符 `? extends T`
    pub fn wildcard_extends(bound: BeanType) -> Self {
        Self::Wildcard {
            upper: vec![bound],
            lower: Vec::new(),
        }
    }

    /// 下界通配符 `? super T`
    pub fn wildcard_super(bound: BeanType) -> Self {
        Self::Wildcard {
            upper: Vec::new(),
            lower: vec![bound],
        }
    }

    /// 无界类型变量
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// 有界类型变量
    pub fn bounded_variable(name: impl Into<String>, bounds: Vec<BeanType>) -> Self {
        Self::Variable {
            name: name.into(),
            bounds,
        }
    }

    /// 基本类型
    pub fn primitive(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }

    /// 是否为 `Object`
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Class(name) if name == OBJECT)
    }

    /// 原始类名; 基本类型返回包装类名, 数组、通配符与类型变量返回 `None`
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            Self::Parameterized { raw, .. } => Some(raw),
            Self::Primitive(p) => Some(p.wrapper_name()),
            _ => None,
        }
    }

    /// 装箱: 基本类型转换为包装类, 包装类保持不变
    pub fn boxed(&self) -> Self {
        match self {
            Self::Primitive(p) => Self::Class(p.wrapper_name().to_string()),
            other => other.clone(),
        }
    }

    /// 类型参数 (非参数化类型为空)
    pub fn arguments(&self) -> &[BeanType] {
        match self {
            Self::Parameterized { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// 通配符上界, 空上界视为 `Object`
    pub fn upper_bounds(&self) -> Vec<BeanType> {
        match self {
            Self::Wildcard { upper, .. } | Self::Variable { bounds: upper, .. } => {
                if upper.is_empty() {
                    vec![Self::object()]
                } else {
                    upper.clone()
                }
            }
            other => vec![other.clone()],
        }
    }

    /// 是否为实际类型 (非通配符、非类型变量)
    pub fn is_actual_type(&self) -> bool {
        !matches!(self, Self::Wildcard { .. } | Self::Variable { .. })
    }

    /// 是否 (递归地) 包含类型变量
    pub fn contains_type_variable(&self) -> bool {
        match self {
            Self::Variable { .. } => true,
            Self::Parameterized { arguments, .. } => {
                arguments.iter().any(Self::contains_type_variable)
            }
            Self::Array(component) => component.contains_type_variable(),
            Self::Wildcard { upper, lower } => upper
                .iter()
                .chain(lower)
                .any(Self::contains_type_variable),
            _ => false,
        }
    }

    /// 是否 (递归地) 包含通配符
    pub fn contains_wildcard(&self) -> bool {
        match self {
            Self::Wildcard { .. } => true,
            Self::Parameterized { arguments, .. } => arguments.iter().any(Self::contains_wildcard),
            Self::Array(component) => component.contains_wildcard(),
            _ => false,
        }
    }

    /// 是否可以作为 Bean 类型: 顶层不能是通配符或类型变量, 参数中不能含通配符
    pub fn is_legal_bean_type(&self) -> bool {
        self.is_actual_type() && !self.contains_wildcard()
    }

    /// 解析器索引键: 装箱后的原始类名, 数组统一归入 `[]`
    pub fn index_key(&self) -> String {
        match self {
            Self::Array(_) => "[]".to_string(),
            other => other
                .boxed()
                .raw_name()
                .map_or_else(|| "*".to_string(), str::to_string),
        }
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => f.write_str(name),
            Self::Parameterized { raw, arguments } => {
                write!(f, "{raw}<")?;
                write_joined(f, arguments, ", ")?;
                f.write_str(">")
            }
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Wildcard { upper, lower } => {
                f.write_str("?")?;
                if !lower.is_empty() {
                    f.write_str(" super ")?;
                    write_joined(f, lower, " & ")?;
                } else if !upper.is_empty() && !(upper.len() == 1 && upper[0].is_object()) {
                    f.write_str(" extends ")?;
                    write_joined(f, upper, " & ")?;
                }
                Ok(())
            }
            Self::Variable { name, .. } => f.write_str(name),
            Self::Primitive(p) => f.write_str(p.name()),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[BeanType], separator: &str) -> fmt::Result {
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl From<Primitive> for BeanType {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}
