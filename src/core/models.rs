/*
 * Plain data types shared by the soft input session and the dialog backends:
 * the per-session field flags, the selection range over the UTF-16 text, and
 * the owner window reference handed in by the host.
 */

/// Host input type value for the number pad keyboard. It is the only input
/// type that changes the behavior of the edit field.
pub const NUMBER_PAD_INPUT_TYPE: i32 = 4;

/// An opaque reference to the host's owner window (an `HWND` on Windows).
///
/// The value is carried as an integer so it can cross thread boundaries; the
/// platform backend turns it back into a native handle where needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OwnerWindow(pub isize);

impl OwnerWindow {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

// Flags fixed for the lifetime of one dialog instance. Set at show time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    pub multiline: bool,
    pub secure: bool,
    pub hidden: bool,
    pub numeric: bool,
}

impl FieldFlags {
    pub fn from_input_type(input_type: i32, multiline: bool, secure: bool, hidden: bool) -> Self {
        FieldFlags {
            multiline,
            secure,
            hidden,
            numeric: input_type == NUMBER_PAD_INPUT_TYPE,
        }
    }
}

/*
 * A selection over the session text, stored as `[start, end)` in UTF-16 code
 * units. Constructors clamp so that `0 <= start <= end <= len` always holds
 * for the text length they were given.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRange {
    pub start: u32,
    pub end: u32,
}

impl SelectionRange {
    pub fn new(start: u32, end: u32) -> Self {
        if end < start {
            SelectionRange { start: end, end: start }
        } else {
            SelectionRange { start, end }
        }
    }

    /// Builds a range from the host's `(start, length)` pair, clamped to `text_len`.
    pub fn from_start_length(start: i32, length: i32, text_len: usize) -> Self {
        let text_len = u32::try_from(text_len).unwrap_or(u32::MAX);
        let start = (start.max(0) as u32).min(text_len);
        let end = start.saturating_add(length.max(0) as u32).min(text_len);
        SelectionRange { start, end }
    }

    /// Builds a range from the host's `(start, length)` pair without a text to clamp against.
    pub fn from_host(start: i32, length: i32) -> Self {
        let start = start.max(0) as u32;
        SelectionRange {
            start,
            end: start.saturating_add(length.max(0) as u32),
        }
    }

    pub fn clamped_to(self, text_len: usize) -> Self {
        let text_len = u32::try_from(text_len).unwrap_or(u32::MAX);
        let start = self.start.min(text_len);
        SelectionRange {
            start,
            end: self.end.clamp(start, text_len),
        }
    }

    pub fn length(self) -> u32 {
        self.end - self.start
    }

    /// The `(start, length)` pair reported back to the host.
    pub fn as_start_length(self) -> (i32, i32) {
        let start = i32::try_from(self.start).unwrap_or(i32::MAX);
        let length = i32::try_from(self.length()).unwrap_or(i32::MAX);
        (start, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_start_length_clamps_to_text() {
        assert_eq!(
            SelectionRange::from_start_length(2, 3, 10),
            SelectionRange { start: 2, end: 5 }
        );
        assert_eq!(
            SelectionRange::from_start_length(8, 5, 10),
            SelectionRange { start: 8, end: 10 }
        );
        assert_eq!(
            SelectionRange::from_start_length(-4, 2, 10),
            SelectionRange { start: 0, end: 2 }
        );
        assert_eq!(
            SelectionRange::from_start_length(12, 1, 10),
            SelectionRange { start: 10, end: 10 }
        );
    }

    #[test]
    fn test_new_orders_reversed_bounds() {
        assert_eq!(SelectionRange::new(7, 3), SelectionRange { start: 3, end: 7 });
    }

    #[test]
    fn test_as_start_length_reports_length() {
        let range = SelectionRange::new(4, 9);
        assert_eq!(range.as_start_length(), (4, 5));
    }

    #[test]
    fn test_numeric_flag_only_for_number_pad() {
        assert!(FieldFlags::from_input_type(NUMBER_PAD_INPUT_TYPE, false, false, false).numeric);
        for other in [0, 1, 2, 3, 5, 7] {
            assert!(!FieldFlags::from_input_type(other, true, true, true).numeric);
        }
    }
}
