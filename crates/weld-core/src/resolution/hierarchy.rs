//! 类型层次
//!
//! 在没有运行时反射的情况下, 由调用方为每个类声明类型参数与直接父类型,
//! 容器据此计算类型闭包并判断协变可赋值性。

use std::collections::HashMap;
use weld_spi::BeanType;

#[derive(Debug, Clone, Default)]
struct TypeDeclaration {
    parameters: Vec<String>,
    supertypes: Vec<BeanType>,
}

/// 类型层次声明
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    declarations: HashMap<String, TypeDeclaration>,
}

impl TypeHierarchy {
    /// 创建空的类型层次
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明非泛型类的直接父类型
    pub fn declare(&mut self, class: impl Into<String>, supertypes: Vec<BeanType>) -> &mut Self {
        self.declare_generic(class, &[], supertypes)
    }

    /// 声明泛型类的类型参数与直接父类型, 父类型中可以引用类型参数
    pub fn declare_generic(
        &mut self,
        class: impl Into<String>,
        parameters: &[&str],
        supertypes: Vec<BeanType>,
    ) -> &mut Self {
        let declaration = self.declarations.entry(class.into()).or_default();
        if !parameters.is_empty() {
            declaration.parameters = parameters.iter().map(ToString::to_string).collect();
        }
        for supertype in supertypes {
            if !declaration.supertypes.contains(&supertype) {
                declaration.supertypes.push(supertype);
            }
        }
        self
    }

    /// 以 Rust 类型名声明直接父类型
    pub fn declare_type<T: ?Sized + 'static>(&mut self, supertypes: Vec<BeanType>) -> &mut Self {
        self.declare(std::any::type_name::<T>(), supertypes)
    }

    /// 合并另一份声明
    pub fn merge(&mut self, other: &Self) {
        for (class, declaration) in &other.declarations {
            let parameters: Vec<&str> = declaration.parameters.iter().map(String::as_str).collect();
            self.declare_generic(class.clone(), &parameters, declaration.supertypes.clone());
        }
    }

    /// 已声明的类数量
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// 是否没有任何声明
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// 直接父类型, 类型参数已替换为实际参数
    pub fn direct_supertypes(&self, ty: &BeanType) -> Vec<BeanType> {
        match ty {
            BeanType::Primitive(_) => self.direct_supertypes(&ty.boxed()),
            BeanType::Class(name) => match self.declarations.get(name) {
                Some(declaration) if declaration.parameters.is_empty() => {
                    declaration.supertypes.clone()
                }
                Some(declaration) => declaration.supertypes.iter().map(erase).collect(),
                None => Vec::new(),
            },
            BeanType::Parameterized { raw, arguments } => match self.declarations.get(raw) {
                Some(declaration) if declaration.parameters.len() == arguments.len() => {
                    let bindings: HashMap<&str, &BeanType> = declaration
                        .parameters
                        .iter()
                        .map(String::as_str)
                        .zip(arguments)
                        .collect();
                    declaration
                        .supertypes
                        .iter()
                        .map(|s| substitute(s, &bindings))
                        .collect()
                }
                Some(declaration) => declaration.supertypes.iter().map(erase).collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// 类型闭包: 自身、全部传递父类型与 `Object`, 按广度优先顺序
    pub fn type_closure(&self, ty: &BeanType) -> Vec<BeanType> {
        let mut closure = vec![ty.clone()];
        let mut cursor = 0;
        while cursor < closure.len() {
            let supertypes = self.direct_supertypes(&closure[cursor]);
            for supertype in supertypes {
                if !closure.contains(&supertype) {
                    closure.push(supertype);
                }
            }
            cursor += 1;
        }
        let object = BeanType::object();
        if !closure.contains(&object) {
            closure.push(object);
        }
        closure
    }
}

/// 用实际类型参数替换类型变量
fn substitute(ty: &BeanType, bindings: &HashMap<&str, &BeanType>) -> BeanType {
    match ty {
        BeanType::Variable { name, .. } => bindings
            .get(name.as_str())
            .map_or_else(|| ty.clone(), |bound| (*bound).clone()),
        BeanType::Parameterized { raw, arguments } => BeanType::Parameterized {
            raw: raw.clone(),
            arguments: arguments.iter().map(|a| substitute(a, bindings)).collect(),
        },
        BeanType::Array(component) => BeanType::array(substitute(component, bindings)),
        BeanType::Wildcard { upper, lower } => BeanType::Wildcard {
            upper: upper.iter().map(|b| substitute(b, bindings)).collect(),
            lower: lower.iter().map(|b| substitute(b, bindings)).collect(),
        },
        other => other.clone(),
    }
}

/// 类型擦除
fn erase(ty: &BeanType) -> BeanType {
    match ty {
        BeanType::Parameterized { raw, .. } => BeanType::class(raw.clone()),
        BeanType::Variable { bounds, .. } => bounds.first().map_or_else(BeanType::object, erase),
        BeanType::Wildcard { upper, .. } => upper.first().map_or_else(BeanType::object, erase),
        BeanType::Array(component) => BeanType::array(erase(component)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> BeanType {
        BeanType::class(name)
    }

    #[test]
    fn test_closure_includes_transitive_supertypes_and_object() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy
            .declare("Poodle", vec![class("Dog")])
            .declare("Dog", vec![class("Animal"), class("Pet")]);
        let closure = hierarchy.type_closure(&class("Poodle"));
        assert_eq!(
            closure,
            vec![class("Poodle"), class("Dog"), class("Animal"), class("Pet"), BeanType::object()]
        );
    }

    #[test]
    fn test_generic_supertypes_are_substituted() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare_generic(
            "ArrayList",
            &["E"],
            vec![BeanType::parameterized("List", vec![BeanType::variable("E")])],
        );
        hierarchy.declare_generic(
            "List",
            &["E"],
            vec![BeanType::parameterized("Collection", vec![BeanType::variable("E")])],
        );
        let closure = hierarchy.type_closure(&BeanType::parameterized("ArrayList", vec![class("String")]));
        assert!(closure.contains(&BeanType::parameterized("List", vec![class("String")])));
        assert!(closure.contains(&BeanType::parameterized("Collection", vec![class("String")])));
    }

    #[test]
    fn test_raw_use_of_generic_class_erases_supertypes() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare_generic(
            "ArrayList",
            &["E"],
            vec![BeanType::parameterized("List", vec![BeanType::variable("E")])],
        );
        let closure = hierarchy.type_closure(&class("ArrayList"));
        assert!(closure.contains(&class("List")));
    }
}
