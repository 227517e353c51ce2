//! 类型可赋值性规则
//!
//! - Bean 类型规则: 原始类型按擦除匹配, 参数化类型逐参数匹配,
//!   实际类型参数要求相同, 通配符与类型变量按边界匹配, 数组递归比较组件类型
//! - 事件类型规则: 观察的原始类型匹配任意参数化事件, 类型参数按边界协变匹配
//!
//! 两套规则在比较前都把基本类型装箱。

use super::hierarchy::TypeHierarchy;
use weld_spi::BeanType;

/// 可赋值性规则
#[derive(Debug, Clone, Copy)]
pub struct AssignabilityRules<'h> {
    hierarchy: &'h TypeHierarchy,
}

impl<'h> AssignabilityRules<'h> {
    /// 基于类型层次创建规则
    pub fn new(hierarchy: &'h TypeHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Bean 的任一类型是否满足所需类型
    pub fn matches_bean_types(&self, required: &BeanType, bean_types: &[BeanType]) -> bool {
        bean_types.iter().any(|bean_type| self.matches_bean_type(required, bean_type))
    }

    /// 单个 Bean 类型是否满足所需类型
    pub fn matches_bean_type(&self, required: &BeanType, bean_type: &BeanType) -> bool {
        self.bean_matches_no_boxing(&required.boxed(), &bean_type.boxed())
    }

    fn bean_matches_no_boxing(&self, required: &BeanType, bean_type: &BeanType) -> bool {
        match (required, bean_type) {
            (BeanType::Array(required), BeanType::Array(bean)) => {
                self.bean_matches_no_boxing(required, bean)
            }
            (BeanType::Class(required), BeanType::Class(bean)) => required == bean,
            (BeanType::Class(raw), BeanType::Parameterized { raw: bean_raw, arguments })
            | (BeanType::Parameterized { raw: bean_raw, arguments }, BeanType::Class(raw)) => {
                raw == bean_raw && arguments.iter().all(is_unbounded_variable_or_object)
            }
            (
                BeanType::Parameterized {
                    raw: required_raw,
                    arguments: required_arguments,
                },
                BeanType::Parameterized {
                    raw: bean_raw,
                    arguments: bean_arguments,
                },
            ) => {
                required_raw == bean_raw
                    && required_arguments.len() == bean_arguments.len()
                    && required_arguments
                        .iter()
                        .zip(bean_arguments)
                        .all(|(r, b)| self.parameters_match(r, b))
            }
            _ => false,
        }
    }

    fn parameters_match(&self, required: &BeanType, bean: &BeanType) -> bool {
        match (required, bean) {
            (r, b) if r.is_actual_type() && b.is_actual_type() => self.matches_bean_type(r, b),
            (BeanType::Wildcard { .. }, b) if b.is_actual_type() => self.is_assignable_from(required, b),
            (BeanType::Wildcard { upper, lower }, BeanType::Variable { bounds, .. }) => {
                let upper_bound = upper.first().cloned().unwrap_or_else(BeanType::object);
                effective_bounds(bounds).iter().all(|bound| {
                    let overlaps = self.is_assignable_from(bound, &upper_bound)
                        || self.is_assignable_from(&upper_bound, bound);
                    let respects_lower = lower
                        .first()
                        .map_or(true, |lower_bound| self.is_assignable_from(bound, lower_bound));
                    overlaps && respects_lower
                })
            }
            (r, BeanType::Variable { bounds, .. }) if r.is_actual_type() => {
                effective_bounds(bounds).iter().all(|bound| match bound {
                    BeanType::Variable { .. } => self.parameters_match(r, bound),
                    _ => self.is_assignable_from(bound, r),
                })
            }
            (BeanType::Variable { bounds: required_bounds, .. }, BeanType::Variable { bounds: bean_bounds, .. }) => {
                effective_bounds(required_bounds).iter().all(|required_bound| {
                    effective_bounds(bean_bounds)
                        .iter()
                        .all(|bean_bound| self.is_assignable_from(bean_bound, required_bound))
                })
            }
            _ => false,
        }
    }

    /// 协变可赋值性: `from` 的值能否赋给 `to`
    pub fn is_assignable_from(&self, to: &BeanType, from: &BeanType) -> bool {
        let to = to.boxed();
        let from = from.boxed();
        if to == from {
            return true;
        }
        match (&to, &from) {
            (BeanType::Wildcard { upper, lower }, _) => {
                upper.iter().all(|bound| self.is_assignable_from(bound, &from))
                    && lower.iter().all(|bound| self.is_assignable_from(&from, bound))
            }
            (_, BeanType::Variable { bounds, .. }) => effective_bounds(bounds)
                .iter()
                .any(|bound| self.is_assignable_from(&to, bound)),
            (_, BeanType::Wildcard { upper, .. }) => effective_bounds(upper)
                .iter()
                .any(|bound| self.is_assignable_from(&to, bound)),
            (BeanType::Variable { .. }, _) => false,
            (t, _) if t.is_object() => true,
            (BeanType::Array(to_component), BeanType::Array(from_component)) => {
                self.is_assignable_from(to_component, from_component)
            }
            (BeanType::Array(_), _) | (_, BeanType::Array(_)) => false,
            (BeanType::Class(raw), _) => self
                .hierarchy
                .type_closure(&from)
                .iter()
                .any(|supertype| supertype.raw_name() == Some(raw.as_str())),
            (BeanType::Parameterized { raw, arguments }, _) => {
                self.hierarchy.type_closure(&from).iter().any(|supertype| match supertype {
                    BeanType::Parameterized {
                        raw: super_raw,
                        arguments: super_arguments,
                    } => {
                        super_raw == raw
                            && super_arguments.len() == arguments.len()
                            && arguments
                                .iter()
                                .zip(super_arguments)
                                .all(|(t, f)| self.argument_contains(t, f))
                    }
                    BeanType::Class(super_raw) => super_raw == raw,
                    _ => false,
                })
            }
            _ => false,
        }
    }

    fn argument_contains(&self, to: &BeanType, from: &BeanType) -> bool {
        match to {
            BeanType::Wildcard { .. } => self.is_assignable_from(to, from),
            _ => to.boxed() == from.boxed(),
        }
    }

    /// 观察的类型是否匹配事件类型闭包中的任一类型
    pub fn matches_event_types(&self, observed: &BeanType, event_types: &[BeanType]) -> bool {
        event_types.iter().any(|event_type| self.matches_event_type(observed, event_type))
    }

    /// 观察的类型是否匹配单个事件类型
    pub fn matches_event_type(&self, observed: &BeanType, event_type: &BeanType) -> bool {
        match observed {
            BeanType::Wildcard { upper, lower } => self.inside_bounds(event_type, lower, upper),
            BeanType::Variable { bounds, .. } => self.inside_bounds(event_type, &[], bounds),
            _ => self.actual_matches_event(observed, event_type),
        }
    }

    fn actual_matches_event(&self, observed: &BeanType, event_type: &BeanType) -> bool {
        match event_type {
            BeanType::Variable { bounds, .. } => self.inside_bounds(observed, &[], bounds),
            BeanType::Wildcard { upper, .. } => effective_bounds(upper)
                .iter()
                .any(|bound| self.actual_matches_event(observed, bound)),
            _ => {
                let (observed_raw, observed_arguments) = holder(observed);
                let (event_raw, event_arguments) = holder(event_type);
                observed_raw == event_raw
                    && observed_arguments.iter().enumerate().all(|(index, argument)| {
                        let event_argument = event_arguments
                            .get(index)
                            .cloned()
                            .unwrap_or_else(BeanType::object);
                        self.matches_event_type(argument, &event_argument)
                    })
            }
        }
    }

    fn inside_bounds(&self, ty: &BeanType, lower: &[BeanType], upper: &[BeanType]) -> bool {
        let above_lower = lower.is_empty() || lower.iter().any(|bound| self.is_assignable_from(ty, bound));
        let below_upper = upper.is_empty() || upper.iter().any(|bound| self.is_assignable_from(bound, ty));
        above_lower && below_upper
    }
}

/// 实际类型的 (装箱后的原始类型, 类型参数); 数组以组件类型区分
fn holder(ty: &BeanType) -> (String, Vec<BeanType>) {
    match ty {
        BeanType::Array(component) => {
            let (raw, arguments) = holder(component);
            (format!("{raw}[]"), arguments)
        }
        BeanType::Parameterized { raw, arguments } => (raw.clone(), arguments.clone()),
        other => (other.boxed().raw_name().unwrap_or_default().to_string(), Vec::new()),
    }
}

fn effective_bounds(bounds: &[BeanType]) -> Vec<BeanType> {
    if bounds.is_empty() {
        vec![BeanType::object()]
    } else {
        bounds.to_vec()
    }
}

fn is_unbounded_variable_or_object(ty: &BeanType) -> bool {
    match ty {
        BeanType::Variable { bounds, .. } => bounds.iter().all(BeanType::is_object),
        other => other.is_object(),
    }
}
