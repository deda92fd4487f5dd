//! 渲染器接口
//!
//! 深度与颜色由外部物理/渲染引擎提供，本 crate 只消费其输出。

use crate::error::PerceptionError;
use nalgebra::Matrix4;

/// 渲染请求
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// 视图矩阵
    pub view: Matrix4<f64>,
    /// 投影矩阵
    pub projection: Matrix4<f64>,
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

/// 渲染结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedFrame {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    /// RGBA，行优先，长度 `width · height · 4`
    pub rgba: Vec<u8>,
    /// 非线性深度缓冲 `[0, 1]`，行优先，长度 `width · height`
    pub depth: Vec<f32>,
}

impl RenderedFrame {
    /// 检查缓冲区尺寸
    pub fn check(&self) -> Result<(), PerceptionError> {
        let pixels = self.width as usize * self.height as usize;
        if self.depth.len() != pixels {
            return Err(PerceptionError::BufferSize {
                buffer: "depth",
                expected: pixels,
                actual: self.depth.len(),
            });
        }
        if self.rgba.len() != pixels * 4 {
            return Err(PerceptionError::BufferSize {
                buffer: "rgba",
                expected: pixels * 4,
                actual: self.rgba.len(),
            });
        }
        Ok(())
    }
}

/// 渲染器
pub trait Renderer: Send {
    /// 按给定视图与投影渲染一帧
    fn render(&mut self, request: &RenderRequest) -> Result<RenderedFrame, PerceptionError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, request: &RenderRequest) -> Result<RenderedFrame, PerceptionError> {
        (**self).render(request)
    }
}
