//! 命名约定规范
//!
//! 提供组件标识派生的约定

/// 从组件显示名称派生组件标识
///
/// 驼峰命名转换为蛇形命名，如 `OrderService` -> `order_service`
pub fn derive_component_id(name: &str) -> String {
    to_snake_case(name)
}

/// 将驼峰命名转换为蛇形命名
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_uppercase() && !result.is_empty() {
            if let Some(&next_ch) = chars.peek() {
                if next_ch.is_lowercase() {
                    result.push('_');
                }
            }
        }
        result.push(ch.to_lowercase().next().unwrap_or(ch));
    }

    result
}
