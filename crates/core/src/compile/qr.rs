//! QR element compilation.
//!
//! The symbol model is fixed to 2. Sizing works in whole modules: the
//! printer picks the version from the data, so the compiler estimates the
//! module count from the byte-mode capacity table (conservative: the
//! smallest version whose capacity at the configured error correction level
//! holds the data). `size_mode = max` then searches magnifications downward
//! for the largest that fits the quiet-zone-inset box.

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::compile::EmitCtx;
use crate::compile::align_offset;
use crate::layout::units::{Rect, mm_to_dots};
use crate::template::model::{EcLevel, QrElement, QrInputMode, SizeMode};
use crate::zpl::writer::FieldBuf;

/// Byte-mode data capacity per QR version, indexed `[version - 1]`, for
/// error correction levels `[L, M, Q, H]`.
const QR_BYTE_CAPACITY: [[u16; 4]; 40] = [
    [17, 14, 11, 7],
    [32, 26, 20, 14],
    [53, 42, 32, 24],
    [78, 62, 46, 34],
    [106, 84, 60, 44],
    [134, 106, 74, 58],
    [154, 122, 86, 64],
    [192, 152, 108, 84],
    [230, 180, 130, 98],
    [271, 213, 151, 119],
    [321, 251, 177, 137],
    [367, 287, 203, 155],
    [425, 331, 241, 177],
    [458, 362, 258, 194],
    [520, 412, 292, 220],
    [586, 450, 322, 250],
    [644, 504, 364, 280],
    [718, 560, 394, 310],
    [792, 624, 442, 338],
    [858, 666, 482, 382],
    [929, 711, 509, 403],
    [1003, 779, 565, 439],
    [1091, 857, 611, 461],
    [1171, 911, 661, 511],
    [1273, 997, 715, 535],
    [1367, 1059, 751, 593],
    [1465, 1125, 805, 625],
    [1528, 1190, 868, 658],
    [1628, 1264, 908, 698],
    [1732, 1370, 982, 742],
    [1840, 1452, 1030, 790],
    [1952, 1538, 1112, 842],
    [2068, 1628, 1168, 898],
    [2188, 1722, 1228, 958],
    [2303, 1809, 1283, 983],
    [2431, 1911, 1351, 1051],
    [2563, 1989, 1423, 1093],
    [2699, 2099, 1499, 1139],
    [2809, 2213, 1579, 1219],
    [2953, 2331, 1663, 1273],
];

/// Module count of the smallest version that can hold `data_len` bytes at
/// the given error correction level. `None` when no version fits.
fn estimate_modules(data_len: usize, ec: EcLevel) -> Option<i32> {
    let col = match ec {
        EcLevel::L => 0,
        EcLevel::M => 1,
        EcLevel::Q => 2,
        EcLevel::H => 3,
    };
    QR_BYTE_CAPACITY
        .iter()
        .position(|caps| usize::from(caps[col]) >= data_len)
        .map(|idx| 17 + 4 * (idx as i32 + 1))
}

/// DPI-based default magnification for `size_mode = fixed` without an
/// explicit value.
fn default_magnification(dpi: u32) -> i32 {
    if dpi >= 600 {
        6
    } else if dpi >= 300 {
        4
    } else {
        3
    }
}

/// Compile a QR element into its field command string.
pub(crate) fn compile_qr(
    element: &QrElement,
    box_rect: Rect,
    ctx: &EmitCtx<'_>,
    path: &NodePath,
) -> Result<String, CompileError> {
    let quiet = mm_to_dots(element.quiet_zone_mm(), ctx.dpi);
    let inner = box_rect.inset([quiet; 4]);
    let side_limit = inner.w.min(inner.h);
    if side_limit <= 0 {
        return Err(CompileError::layout(
            path.clone(),
            format!(
                "quiet zone leaves no room for the QR symbol ({side_limit} dots)"
            ),
        ));
    }

    let ec = element.error_correction();
    let modules = estimate_modules(element.data.len(), ec).ok_or_else(|| {
        CompileError::layout(
            path.clone(),
            format!(
                "data ({} bytes) exceeds QR capacity at error correction {}",
                element.data.len(),
                ec.code()
            ),
        )
    })?;

    let magnification = match element.size_mode() {
        SizeMode::Max => (1..=10)
            .rev()
            .find(|m| modules * m <= side_limit)
            .ok_or_else(|| {
                CompileError::layout(
                    path.clone(),
                    format!(
                        "QR symbol ({modules} modules) does not fit in {side_limit} dots \
                         at any magnification"
                    ),
                )
            })?,
        SizeMode::Fixed => element
            .magnification
            .map_or_else(|| default_magnification(ctx.dpi), |m| m as i32),
    };

    let side = modules * magnification;
    let x = inner.x + align_offset(element.align_h(), inner.w, side);
    let y = inner.y + v_align_offset(element, inner.h, side);

    // The field data carries the error correction level and input mode; in
    // manual mode the character mode letter follows the comma.
    let data = match element.input_mode() {
        QrInputMode::A => format!("{}A,{}", ec.code(), element.data),
        QrInputMode::M => {
            let cm = element
                .character_mode
                .ok_or_else(|| {
                    CompileError::invariant(
                        path.clone(),
                        "QR input_mode `M` requires character_mode",
                    )
                })?
                .code();
            format!("{}M,{}{}", ec.code(), cm, element.data)
        }
    };

    Ok(FieldBuf::at(x + ctx.origin.0, y + ctx.origin.1)
        .qr(magnification)
        .data(&data)
        .finish())
}

fn v_align_offset(element: &QrElement, inner_h: i32, side: i32) -> i32 {
    use crate::template::model::AlignV;
    match element.align_v() {
        AlignV::Top => 0,
        AlignV::Center => (inner_h - side) / 2,
        AlignV::Bottom => inner_h - side,
    }
}
