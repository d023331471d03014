//! 处理顺序模型
//!
//! 五个符号级别构成全序，并划分为两个不可变阶段：阶段一允许替换组件
//! 实例，阶段二只允许原地修饰。

/// 处理顺序级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessingOrder {
    /// 最先执行
    First,
    /// 较早执行
    Early,
    /// 默认顺序
    Normal,
    /// 较晚执行
    Late,
    /// 最后执行
    Last,
}

impl ProcessingOrder {
    /// 全部级别，按执行顺序排列
    pub const ALL: [Self; 5] = [Self::First, Self::Early, Self::Normal, Self::Late, Self::Last];

    /// 级别所属的处理阶段
    pub fn phase(self) -> ProcessingPhase {
        match self {
            Self::First | Self::Early => ProcessingPhase::One,
            Self::Normal | Self::Late | Self::Last => ProcessingPhase::Two,
        }
    }
}

impl std::fmt::Display for ProcessingOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::First => "First",
            Self::Early => "Early",
            Self::Normal => "Normal",
            Self::Late => "Late",
            Self::Last => "Last",
        };
        f.write_str(name)
    }
}

/// 处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingPhase {
    /// 阶段一：实例可被丢弃并替换
    One,
    /// 阶段二：实例身份必须保持不变
    Two,
}

impl std::fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => f.write_str("Phase1"),
            Self::Two => f.write_str("Phase2"),
        }
    }
}
