/*
 * Layout arithmetic for the soft input dialog.
 *
 * The dialog is described in dialog units (DLUs) derived from the owner
 * window's client size and the system dialog base units. Horizontal DLUs are a
 * quarter of the base unit, vertical DLUs an eighth. Conversions back to
 * pixels use the same `MulDiv` rounding as the native dialog manager, so the
 * pixel rectangles computed here match what the controls actually occupy.
 */

/// Dialog base units in pixels (average character width and height of the dialog font).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogBaseUnits {
    pub x: u16,
    pub y: u16,
}

impl DialogBaseUnits {
    pub fn new(x: u16, y: u16) -> Self {
        DialogBaseUnits {
            x: x.max(1),
            y: y.max(1),
        }
    }

    /// Unpacks the value returned by `GetDialogBaseUnits` (low word X, high word Y).
    pub fn from_packed(units: u32) -> Self {
        Self::new((units & 0xFFFF) as u16, (units >> 16) as u16)
    }

    pub fn dlu_to_pixels_x(self, dlu: i32) -> i32 {
        mul_div(dlu, self.x as i32, 4)
    }

    pub fn dlu_to_pixels_y(self, dlu: i32) -> i32 {
        mul_div(dlu, self.y as i32, 8)
    }
}

impl Default for DialogBaseUnits {
    fn default() -> Self {
        DialogBaseUnits { x: 8, y: 16 }
    }
}

/// Multiplies two 32-bit values and divides by a third, rounding half away from zero.
///
/// Mirrors the Win32 `MulDiv` contract, including `-1` on a zero divisor or overflow.
pub fn mul_div(number: i32, numerator: i32, denominator: i32) -> i32 {
    if denominator == 0 {
        return -1;
    }
    let product = number as i64 * numerator as i64;
    let denominator = denominator as i64;
    let quotient = (product.abs() + denominator.abs() / 2) / denominator.abs();
    let rounded = if (product < 0) != (denominator < 0) {
        -quotient
    } else {
        quotient
    };
    i32::try_from(rounded).unwrap_or(-1)
}

// A rectangle in dialog template units, as stored in DLGTEMPLATE/DLGITEMTEMPLATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DluRect {
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
}

impl DluRect {
    fn from_i32(x: i32, y: i32, cx: i32, cy: i32) -> Self {
        DluRect {
            x: saturate_i16(x),
            y: saturate_i16(y),
            cx: saturate_i16(cx),
            cy: saturate_i16(cy),
        }
    }

    pub fn to_pixels(self, units: DialogBaseUnits) -> PixelRect {
        PixelRect {
            x: units.dlu_to_pixels_x(self.x as i32),
            y: units.dlu_to_pixels_y(self.y as i32),
            width: units.dlu_to_pixels_x(self.cx as i32),
            height: units.dlu_to_pixels_y(self.cy as i32),
        }
    }
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

// A rectangle in pixels, relative to whatever the caller documents (client area, dialog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const ZERO: PixelRect = PixelRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

// A window rectangle in screen coordinates (left/top inclusive, right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// What the dialog needs to know about the owner window: its client size and
/// where the client origin lies on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerMetrics {
    pub client_width: i32,
    pub client_height: i32,
    pub origin_x: i32,
    pub origin_y: i32,
}

/// Fixed layout constants in dialog units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub dialog_height: i32,
    pub margin_x: i32,
    pub margin_y: i32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        LayoutMetrics {
            dialog_height: 100,
            margin_x: 10,
            margin_y: 20,
        }
    }
}

/*
 * The complete dialog layout in dialog units. The dialog rectangle is
 * relative to the owner's client area; control rectangles are relative to the
 * dialog's client area.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialogLayout {
    pub dialog: DluRect,
    pub edit: DluRect,
    pub ok: DluRect,
    pub cancel: DluRect,
}

impl DialogLayout {
    /*
     * Lays the dialog out along the bottom of the owner's client area.
     *
     * The owner extent is converted to dialog units rounding down, so that the
     * dialog's right and bottom edges, converted back to pixels, never leave
     * the owner's client area. Owners too small for the margins produce a
     * collapsed (zero-sized) dialog rather than a negative one.
     */
    pub fn compute(
        owner_width: i32,
        owner_height: i32,
        units: DialogBaseUnits,
        metrics: LayoutMetrics,
    ) -> Self {
        let owner_cx = owner_width.max(0) * 4 / units.x as i32;
        let owner_cy = owner_height.max(0) * 8 / units.y as i32;

        let margin_x = metrics.margin_x.max(0);
        let margin_y = metrics.margin_y.max(0);

        let field_width = (owner_cx - margin_x * 2).max(0);
        let dialog_x = margin_x.min(owner_cx);
        let dialog_y = (owner_cy - metrics.dialog_height - margin_y).max(0);
        let field_height = metrics
            .dialog_height
            .max(0)
            .min((owner_cy - dialog_y).max(0));

        let button_y = 3 * field_height / 4;
        let button_cx = field_width / 4;
        let button_cy = field_height / 6;

        DialogLayout {
            dialog: DluRect::from_i32(dialog_x, dialog_y, field_width, field_height),
            ok: DluRect::from_i32(field_width / 16, button_y, button_cx, button_cy),
            cancel: DluRect::from_i32(11 * field_width / 16, button_y, button_cx, button_cy),
            edit: DluRect::from_i32(
                field_width / 16,
                field_height / 8,
                7 * field_width / 8,
                3 * field_height / 8,
            ),
        }
    }

    /// The edit control's rectangle in pixels, relative to the dialog client area.
    pub fn edit_pixels(&self, units: DialogBaseUnits) -> PixelRect {
        self.edit.to_pixels(units)
    }

    /// The dialog's rectangle in pixels, relative to the owner's client area.
    pub fn dialog_pixels(&self, units: DialogBaseUnits) -> PixelRect {
        self.dialog.to_pixels(units)
    }
}

/// The dialog area reported to the host: owner-client coordinates with Y
/// measured upward from the bottom of the owner's client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputArea {
    pub visible: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl InputArea {
    pub const HIDDEN: InputArea = InputArea {
        visible: false,
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn from_dialog_rect(owner: &OwnerMetrics, dialog: &ScreenRect) -> Self {
        InputArea {
            visible: true,
            x: dialog.left - owner.origin_x,
            y: owner.client_height - (dialog.bottom - owner.origin_y),
            width: dialog.right - dialog.left,
            height: dialog.bottom - dialog.top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[cfg(target_os = "windows")]
    #[test]
    fn test_mul_div_matches_native_muldiv() {
        use windows::Win32::System::WindowsProgramming::MulDiv;

        let mut rng = rand::rng();
        let mut cases = vec![(10, 3, 4), (9, 1, 2), (-9, 1, 2), (7, 0, 5), (5, 3, 0)];
        for _ in 0..500 {
            cases.push((
                rng.random_range(-4000..=4000),
                rng.random_range(1..=64),
                rng.random_range(1..=64),
            ));
        }
        for (number, numerator, denominator) in cases {
            let native = unsafe { MulDiv(number, numerator, denominator) };
            assert_eq!(
                mul_div(number, numerator, denominator),
                native,
                "MulDiv({number}, {numerator}, {denominator})"
            );
        }
    }

    #[test]
    fn test_mul_div_rounds_half_away_from_zero() {
        assert_eq!(mul_div(10, 3, 4), 8); // 7.5
        assert_eq!(mul_div(9, 1, 2), 5); // 4.5
        assert_eq!(mul_div(-9, 1, 2), -5);
        assert_eq!(mul_div(9, -1, 2), -5);
        assert_eq!(mul_div(7, 1, 4), 2); // 1.75
        assert_eq!(mul_div(5, 1, 4), 1); // 1.25
        assert_eq!(mul_div(1, 1, 0), -1);
    }

    #[test]
    fn test_base_units_from_packed() {
        let units = DialogBaseUnits::from_packed((16 << 16) | 8);
        assert_eq!(units, DialogBaseUnits { x: 8, y: 16 });
        assert_eq!(DialogBaseUnits::from_packed(0), DialogBaseUnits { x: 1, y: 1 });
    }

    #[test]
    fn test_layout_for_typical_owner() {
        // 800x600 client with 8x16 base units: 400x300 DLUs.
        let layout =
            DialogLayout::compute(800, 600, DialogBaseUnits::new(8, 16), LayoutMetrics::default());

        assert_eq!(
            layout.dialog,
            DluRect {
                x: 10,
                y: 180,
                cx: 380,
                cy: 100
            }
        );
        assert_eq!(
            layout.edit,
            DluRect {
                x: 23,
                y: 12,
                cx: 332,
                cy: 37
            }
        );
        assert_eq!(
            layout.ok,
            DluRect {
                x: 23,
                y: 75,
                cx: 95,
                cy: 16
            }
        );
        assert_eq!(
            layout.cancel,
            DluRect {
                x: 261,
                y: 75,
                cx: 95,
                cy: 16
            }
        );
    }

    #[test]
    fn test_edit_pixels_use_dialog_unit_rounding() {
        let units = DialogBaseUnits::new(7, 15);
        let layout = DialogLayout::compute(1024, 768, units, LayoutMetrics::default());
        let px = layout.edit_pixels(units);
        assert_eq!(px.x, mul_div(layout.edit.x as i32, 7, 4));
        assert_eq!(px.y, mul_div(layout.edit.y as i32, 15, 8));
        assert_eq!(px.width, mul_div(layout.edit.cx as i32, 7, 4));
        assert_eq!(px.height, mul_div(layout.edit.cy as i32, 15, 8));
        // Recomputing yields identical geometry.
        let again = DialogLayout::compute(1024, 768, units, LayoutMetrics::default());
        assert_eq!(px, again.edit_pixels(units));
    }

    #[test]
    fn test_small_owner_collapses_dialog() {
        let units = DialogBaseUnits::new(8, 16);
        let layout = DialogLayout::compute(30, 20, units, LayoutMetrics::default());
        let px = layout.dialog_pixels(units);
        assert!(px.right() <= 30);
        assert!(px.bottom() <= 20);
        assert_eq!(layout.dialog.cx, 0);
    }

    #[test]
    fn test_dialog_always_fits_owner() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let width = rng.random_range(0..4000);
            let height = rng.random_range(0..3000);
            let units = DialogBaseUnits::new(rng.random_range(1..24), rng.random_range(1..40));
            let layout = DialogLayout::compute(width, height, units, LayoutMetrics::default());
            let px = layout.dialog_pixels(units);
            assert!(
                px.right() <= width,
                "right edge {} exceeds owner width {width} ({units:?})",
                px.right()
            );
            assert!(
                px.bottom() <= height,
                "bottom edge {} exceeds owner height {height} ({units:?})",
                px.bottom()
            );
            assert!(px.x >= 0 && px.y >= 0);
        }
    }

    #[test]
    fn test_input_area_measures_y_from_owner_bottom() {
        let owner = OwnerMetrics {
            client_width: 800,
            client_height: 600,
            origin_x: 100,
            origin_y: 50,
        };
        let dialog = ScreenRect {
            left: 120,
            top: 410,
            right: 880,
            bottom: 610,
        };
        let area = InputArea::from_dialog_rect(&owner, &dialog);
        assert_eq!(
            area,
            InputArea {
                visible: true,
                x: 20,
                y: 40,
                width: 760,
                height: 200
            }
        );
    }
}
