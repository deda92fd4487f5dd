//! RGB(A) → 8 位灰度

use crate::error::PerceptionError;
use quadsim_protocol::MonoImage;

/// ITU-R 601-2 亮度（定点，四舍五入）
///
/// `L = (19595·R + 38470·G + 7471·B + 2¹⁵) >> 16`
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 0x8000) >> 16) as u8
}

/// RGBA 缓冲区转为灰度图（alpha 忽略）
///
/// # 错误
///
/// 缓冲区长度不等于 `width · height · 4` 时返回 `PerceptionError::BufferSize`。
pub fn rgba_to_mono(rgba: &[u8], width: u32, height: u32) -> Result<MonoImage, PerceptionError> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(PerceptionError::BufferSize {
            buffer: "rgba",
            expected,
            actual: rgba.len(),
        });
    }

    let data = rgba.chunks_exact(4).map(|px| luminance(px[0], px[1], px[2])).collect();
    Ok(MonoImage {
        width,
        height,
        data,
    })
}
