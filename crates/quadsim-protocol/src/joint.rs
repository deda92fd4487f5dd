//! 关节索引和数组
//!
//! 12 个驱动关节的规范顺序：每条腿依次为 hip / thigh / calf，
//! 腿的顺序为 FR, FL, RR, RL。
//!
//! 所有跨模块的逐关节数组（反馈、控制器命令、力矩、最终作用力）都使用
//! 同一套索引。外部控制器按这个顺序解释数据包，任何重排都会静默地破坏命令。
//!
//! # 示例
//!
//! ```rust
//! use quadsim_protocol::{JointArray, JointId, Leg, JointKind};
//!
//! let stance = JointArray::stance();
//! let calf = JointId::new(Leg::RearLeft, JointKind::Calf);
//! assert_eq!(calf.index(), 11);
//! assert_eq!(stance[calf], 1.6);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

/// 驱动关节数量
pub const NUM_JOINTS: usize = 12;

/// 单条腿的标准站立姿态 `[hip, thigh, calf]`（弧度）
pub const STANCE_LEG: [f64; 3] = [0.0, -0.8, 1.6];

/// 腿
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Leg {
    /// 右前
    FrontRight = 0,
    /// 左前
    FrontLeft = 1,
    /// 右后
    RearRight = 2,
    /// 左后
    RearLeft = 3,
}

impl Leg {
    /// 规范顺序下的所有腿
    pub const ALL: [Leg; 4] = [
        Leg::FrontRight,
        Leg::FrontLeft,
        Leg::RearRight,
        Leg::RearLeft,
    ];

    /// 短名称
    pub const fn name(self) -> &'static str {
        match self {
            Leg::FrontRight => "FR",
            Leg::FrontLeft => "FL",
            Leg::RearRight => "RR",
            Leg::RearLeft => "RL",
        }
    }
}

/// 腿内关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JointKind {
    /// 髋关节（外展/内收）
    Hip = 0,
    /// 大腿
    Thigh = 1,
    /// 小腿
    Calf = 2,
}

impl JointKind {
    /// 腿内顺序
    pub const ALL: [JointKind; 3] = [JointKind::Hip, JointKind::Thigh, JointKind::Calf];

    /// 名称
    pub const fn name(self) -> &'static str {
        match self {
            JointKind::Hip => "hip",
            JointKind::Thigh => "thigh",
            JointKind::Calf => "calf",
        }
    }
}

/// 关节标识（腿 × 关节类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointId {
    /// 所属腿
    pub leg: Leg,
    /// 关节类型
    pub kind: JointKind,
}

impl JointId {
    /// 创建关节标识
    pub const fn new(leg: Leg, kind: JointKind) -> Self {
        Self { leg, kind }
    }

    /// 规范索引（0-11）
    #[inline]
    pub const fn index(self) -> usize {
        self.leg as usize * 3 + self.kind as usize
    }

    /// 从规范索引创建（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_JOINTS {
            return None;
        }
        Some(Self::new(Leg::ALL[index / 3], JointKind::ALL[index % 3]))
    }

    /// 规范顺序下的全部关节
    pub fn all() -> impl Iterator<Item = JointId> {
        (0..NUM_JOINTS).filter_map(JointId::from_index)
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.leg.name(), self.kind.name())
    }
}

/// 关节数组
///
/// 规范顺序的 12 元素容器，支持按 [`JointId`] 或下标访问。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointArray<T> {
    data: [T; NUM_JOINTS],
}

impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; NUM_JOINTS]) -> Self {
        JointArray { data }
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; NUM_JOINTS] {
        &self.data
    }

    /// 获取内部数组的可变引用
    #[inline]
    pub fn as_array_mut(&mut self) -> &mut [T; NUM_JOINTS] {
        &mut self.data
    }

    /// 获取内部数组（消耗 self）
    #[inline]
    pub fn into_array(self) -> [T; NUM_JOINTS] {
        self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 可变迭代器
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; NUM_JOINTS])
    }

    /// 与另一个数组逐元素组合
    pub fn map_with<U, V, F>(self, other: JointArray<U>, mut f: F) -> JointArray<V>
    where
        U: Copy,
        F: FnMut(T, U) -> V,
    {
        JointArray::new(std::array::from_fn(|i| f(self.data[i], other.data[i])))
    }
}

impl JointArray<f64> {
    /// 标准站立姿态（每条腿 `[0.0, -0.8, 1.6]`）
    pub fn stance() -> Self {
        let mut data = [0.0; NUM_JOINTS];
        for (i, value) in data.iter_mut().enumerate() {
            *value = STANCE_LEG[i % 3];
        }
        JointArray::new(data)
    }

    /// 是否全部为有限值
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl<T: Default + Copy> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::splat(T::default())
    }
}

impl<T> Index<JointId> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: JointId) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<JointId> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: JointId) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> Index<usize> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> From<[T; NUM_JOINTS]> for JointArray<T> {
    #[inline]
    fn from(data: [T; NUM_JOINTS]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; NUM_JOINTS] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, NUM_JOINTS>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
