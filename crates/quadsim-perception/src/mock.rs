//! 测试用渲染器

use crate::error::PerceptionError;
use crate::renderer::{RenderRequest, RenderedFrame, Renderer};

/// 均匀场景渲染器：所有像素同一深度、同一颜色
#[derive(Debug, Clone)]
pub struct UniformRenderer {
    /// 非线性深度值
    pub depth: f32,
    /// RGBA 颜色
    pub color: [u8; 4],
    /// 已渲染帧数
    pub frames: u64,
    /// 最近一次请求
    pub last_request: Option<RenderRequest>,
}

impl UniformRenderer {
    /// 创建渲染器
    pub fn new(depth: f32, color: [u8; 4]) -> Self {
        Self {
            depth,
            color,
            frames: 0,
            last_request: None,
        }
    }
}

impl Renderer for UniformRenderer {
    fn render(&mut self, request: &RenderRequest) -> Result<RenderedFrame, PerceptionError> {
        let pixels = request.width as usize * request.height as usize;
        self.frames += 1;
        self.last_request = Some(request.clone());
        Ok(RenderedFrame {
            width: request.width,
            height: request.height,
            rgba: self.color.repeat(pixels),
            depth: vec![self.depth; pixels],
        })
    }
}
