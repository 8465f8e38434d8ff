//! Catalog Context - Value Objects

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// 书籍唯一标识（自增主键）
    BookId
);

row_id!(
    /// 章节唯一标识（自增主键）
    ChapterId
);

row_id!(
    /// 标签唯一标识（自增主键）
    TagId
);

/// 懒加载字段的解析状态
///
/// 区分「从未拉取」与「拉取成功但上游为空」：
/// - `Unresolved`: 未拉取，或上次拉取失败；读取时会触发懒加载
/// - `Resolved`: 已拉取且非空，或由其他途径预先填充
/// - `Empty`: 已拉取，上游确实没有数据；读取时不再重复拉取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
    Empty,
}

impl ResolutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionState::Unresolved => "unresolved",
            ResolutionState::Resolved => "resolved",
            ResolutionState::Empty => "empty",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unresolved" => Some(ResolutionState::Unresolved),
            "resolved" => Some(ResolutionState::Resolved),
            "empty" => Some(ResolutionState::Empty),
            _ => None,
        }
    }

    /// 根据拉取结果是否为空得出最终状态
    pub fn settled(is_empty: bool) -> Self {
        if is_empty {
            ResolutionState::Empty
        } else {
            ResolutionState::Resolved
        }
    }

    /// 是否应当尝试懒加载
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolutionState::Unresolved)
    }
}

impl Default for ResolutionState {
    fn default() -> Self {
        ResolutionState::Unresolved
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_state_str_mapping() {
        for state in [
            ResolutionState::Unresolved,
            ResolutionState::Resolved,
            ResolutionState::Empty,
        ] {
            assert_eq!(ResolutionState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(ResolutionState::from_str("resolving"), None);
    }

    #[test]
    fn test_settled() {
        assert_eq!(ResolutionState::settled(true), ResolutionState::Empty);
        assert_eq!(ResolutionState::settled(false), ResolutionState::Resolved);
        assert!(ResolutionState::default().is_unresolved());
    }
}
