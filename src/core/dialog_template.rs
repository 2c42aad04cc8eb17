/*
 * Encodes the in-memory dialog template for the soft input dialog.
 *
 * The layout is the classic DLGTEMPLATE format: a fixed header followed by
 * menu, class and title, an optional font block, then one DLGITEMTEMPLATE per
 * control. Every item starts on a DWORD boundary and all strings are
 * null-terminated UTF-16. Offsets are relative to the start of the buffer, so
 * the buffer itself must be DWORD aligned when handed to the dialog manager
 * (see `DialogTemplate::to_aligned_words`).
 *
 * This module has no platform dependency; the style bits are the documented
 * Win32 values so the encoder can be tested byte-for-byte on any host.
 */

use crate::core::geometry::{DialogLayout, DluRect};
use crate::core::models::FieldFlags;
use crate::error::{Result, SoftInputError};

pub const WS_POPUP: u32 = 0x8000_0000;
pub const WS_CHILD: u32 = 0x4000_0000;
pub const WS_VISIBLE: u32 = 0x1000_0000;
pub const WS_CAPTION: u32 = 0x00C0_0000;
pub const WS_BORDER: u32 = 0x0080_0000;
pub const WS_SYSMENU: u32 = 0x0008_0000;
pub const DS_SETFONT: u32 = 0x0040;
pub const DS_MODALFRAME: u32 = 0x0080;

pub const BS_PUSHBUTTON: u32 = 0x0000;
pub const BS_DEFPUSHBUTTON: u32 = 0x0001;

pub const ES_LEFT: u32 = 0x0000;
pub const ES_MULTILINE: u32 = 0x0004;
pub const ES_PASSWORD: u32 = 0x0020;
pub const ES_AUTOVSCROLL: u32 = 0x0040;
pub const ES_WANTRETURN: u32 = 0x1000;
pub const ES_NUMBER: u32 = 0x2000;

pub const IDOK: u16 = 1;
pub const IDCANCEL: u16 = 2;
/// Control ID of the edit field inside the dialog.
pub const ID_EDITTEXT: u16 = 200;

const BUTTON_CLASS_ATOM: u16 = 0x0080;
const EDIT_CLASS_ATOM: u16 = 0x0081;

/// Size of DLGTEMPLATE and DLGITEMTEMPLATE (both packed to 2-byte alignment).
const HEADER_SIZE: usize = 18;
const ITEM_HEADER_SIZE: usize = 18;

/// Style of the dialog window itself.
pub const DIALOG_STYLE: u32 = WS_POPUP | WS_BORDER | WS_SYSMENU | DS_MODALFRAME | WS_CAPTION;

/// Computes the edit control style for the given field flags.
pub fn edit_style(flags: FieldFlags) -> u32 {
    let mut style = WS_CHILD | WS_VISIBLE | ES_LEFT;
    if flags.multiline {
        style |= ES_MULTILINE | ES_WANTRETURN | ES_AUTOVSCROLL;
    }
    if flags.secure {
        style |= ES_PASSWORD;
    }
    if flags.numeric {
        style |= ES_NUMBER;
    }
    style
}

/// Optional DS_SETFONT block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFont {
    pub point_size: u16,
    pub face_name: String,
}

/// Everything the encoder needs to produce the soft input dialog.
#[derive(Debug, Clone)]
pub struct TemplateSpec<'a> {
    pub layout: DialogLayout,
    pub title: &'a str,
    pub ok_caption: &'a str,
    pub cancel_caption: &'a str,
    pub font: Option<&'a TemplateFont>,
    pub flags: FieldFlags,
    pub initial_text: &'a [u16],
}

/// An encoded dialog template plus the facts backends need without reparsing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogTemplate {
    bytes: Vec<u8>,
    layout: DialogLayout,
    edit_style: u32,
    initial_text: Vec<u16>,
}

impl DialogTemplate {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn layout(&self) -> &DialogLayout {
        &self.layout
    }

    pub fn edit_style(&self) -> u32 {
        self.edit_style
    }

    /// The edit control's initial content (up to the first embedded null).
    pub fn initial_text(&self) -> &[u16] {
        &self.initial_text
    }

    /// Copies the template into a DWORD-aligned buffer for the dialog manager.
    pub fn to_aligned_words(&self) -> Vec<u32> {
        self.bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(word)
            })
            .collect()
    }
}

// Helper to push a u16 word (little-endian) to a byte vector.
fn push_word(vec: &mut Vec<u8>, word: u16) {
    vec.extend_from_slice(&word.to_le_bytes());
}

fn push_dword(vec: &mut Vec<u8>, dword: u32) {
    vec.extend_from_slice(&dword.to_le_bytes());
}

// Helper to push a null-terminated UTF-16 string to a byte vector.
fn push_str_utf16(vec: &mut Vec<u8>, s: &str) {
    for c in s.encode_utf16() {
        push_word(vec, c);
    }
    push_word(vec, 0);
}

fn push_wide(vec: &mut Vec<u8>, s: &[u16]) {
    for &c in s {
        push_word(vec, c);
    }
    push_word(vec, 0);
}

// Helper to align a byte vector to a DWORD (4-byte) boundary.
fn align_to_dword(vec: &mut Vec<u8>) {
    while vec.len() % 4 != 0 {
        vec.push(0);
    }
}

fn push_rect(vec: &mut Vec<u8>, rect: DluRect) {
    for value in [rect.x, rect.y, rect.cx, rect.cy] {
        vec.extend_from_slice(&value.to_le_bytes());
    }
}

fn wide_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn align_up(len: usize) -> usize {
    (len + 3) & !3
}

fn item_size(caption_units: usize) -> usize {
    // header + class (0xFFFF, atom) + caption + null + creation data
    ITEM_HEADER_SIZE + 4 + (caption_units + 1) * 2 + 2
}

/// Exact number of bytes `encode_dialog_template` will produce for `spec`.
pub fn encoded_size(spec: &TemplateSpec<'_>, text: &[u16]) -> usize {
    let mut size = HEADER_SIZE + 4 + (wide_len(spec.title) + 1) * 2;
    if let Some(font) = spec.font {
        size += 2 + (wide_len(&font.face_name) + 1) * 2;
    }
    for caption_units in [wide_len(spec.ok_caption), wide_len(spec.cancel_caption), text.len()] {
        size = align_up(size) + item_size(caption_units);
    }
    size
}

fn push_item(
    vec: &mut Vec<u8>,
    rect: DluRect,
    id: u16,
    style: u32,
    class_atom: u16,
    caption: impl FnOnce(&mut Vec<u8>),
) {
    align_to_dword(vec);
    push_dword(vec, style);
    push_dword(vec, 0); // dwExtendedStyle
    push_rect(vec, rect);
    push_word(vec, id);
    push_word(vec, 0xFFFF);
    push_word(vec, class_atom);
    caption(vec);
    push_word(vec, 0); // No creation data
}

/*
 * Builds the soft input dialog template: the dialog header followed by the
 * OK button, the Cancel button and the edit control, in that order. The
 * current text becomes the edit control's caption, i.e. its initial content.
 *
 * The buffer is reserved up front with a fallible allocation; running out of
 * memory yields `SoftInputError::TemplateAllocation` instead of aborting.
 */
pub fn encode_dialog_template(spec: &TemplateSpec<'_>) -> Result<DialogTemplate> {
    let text_end = spec
        .initial_text
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(spec.initial_text.len());
    let text = &spec.initial_text[..text_end];

    let size = encoded_size(spec, text);
    if size > u32::MAX as usize {
        return Err(SoftInputError::TemplateTooLarge(size));
    }
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(size)
        .map_err(|_| SoftInputError::TemplateAllocation(size))?;

    let mut style = DIALOG_STYLE;
    if spec.font.is_some() {
        style |= DS_SETFONT;
    }

    // --- DLGTEMPLATE ---
    push_dword(&mut bytes, style);
    push_dword(&mut bytes, 0); // dwExtendedStyle
    push_word(&mut bytes, 3); // cdit: OK, Cancel, Edit
    push_rect(&mut bytes, spec.layout.dialog);

    push_word(&mut bytes, 0); // No menu
    push_word(&mut bytes, 0); // Predefined dialog box class
    push_str_utf16(&mut bytes, spec.title);

    if let Some(font) = spec.font {
        push_word(&mut bytes, font.point_size);
        push_str_utf16(&mut bytes, &font.face_name);
    }

    push_item(
        &mut bytes,
        spec.layout.ok,
        IDOK,
        WS_CHILD | WS_VISIBLE | BS_DEFPUSHBUTTON,
        BUTTON_CLASS_ATOM,
        |v| push_str_utf16(v, spec.ok_caption),
    );
    push_item(
        &mut bytes,
        spec.layout.cancel,
        IDCANCEL,
        WS_CHILD | WS_VISIBLE | BS_PUSHBUTTON,
        BUTTON_CLASS_ATOM,
        |v| push_str_utf16(v, spec.cancel_caption),
    );
    let edit_style = edit_style(spec.flags);
    push_item(
        &mut bytes,
        spec.layout.edit,
        ID_EDITTEXT,
        edit_style,
        EDIT_CLASS_ATOM,
        |v| push_wide(v, text),
    );

    debug_assert_eq!(bytes.len(), size);
    log::trace!(
        "DialogTemplate: Encoded {} bytes (edit style {:#010x}, {} text units).",
        bytes.len(),
        edit_style,
        text.len()
    );

    Ok(DialogTemplate {
        bytes,
        layout: spec.layout,
        edit_style,
        initial_text: text.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::DluRect;

    fn sample_layout() -> DialogLayout {
        DialogLayout {
            dialog: DluRect {
                x: 10,
                y: 180,
                cx: 380,
                cy: 100,
            },
            edit: DluRect {
                x: 23,
                y: 12,
                cx: 332,
                cy: 37,
            },
            ok: DluRect {
                x: 23,
                y: 75,
                cx: 95,
                cy: 16,
            },
            cancel: DluRect {
                x: 261,
                y: 75,
                cx: 95,
                cy: 16,
            },
        }
    }

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn spec<'a>(text: &'a [u16], flags: FieldFlags) -> TemplateSpec<'a> {
        TemplateSpec {
            layout: sample_layout(),
            title: "Edit text",
            ok_caption: "OK",
            cancel_caption: "Cancel",
            font: None,
            flags,
            initial_text: text,
        }
    }

    #[test]
    fn test_template_matches_known_good_layout() {
        let text = wide("hi");
        let template = encode_dialog_template(&spec(&text, FieldFlags::default())).unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            // DLGTEMPLATE: style 0x80C80080, exstyle 0, cdit 3, x 10, y 180, cx 380, cy 100
            0x80, 0x00, 0xC8, 0x80, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00,
            0x0A, 0x00, 0xB4, 0x00, 0x7C, 0x01, 0x64, 0x00,
            // menu, class
            0x00, 0x00, 0x00, 0x00,
            // "Edit text\0"
            b'E', 0, b'd', 0, b'i', 0, b't', 0, b' ', 0, b't', 0, b'e', 0, b'x', 0, b't', 0, 0, 0,
            // pad to 44
            0x00, 0x00,
            // OK: style 0x50000001, exstyle 0, x 23, y 75, cx 95, cy 16, id 1
            0x01, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x00,
            0x17, 0x00, 0x4B, 0x00, 0x5F, 0x00, 0x10, 0x00, 0x01, 0x00,
            0xFF, 0xFF, 0x80, 0x00,
            b'O', 0, b'K', 0, 0, 0,
            0x00, 0x00,
            // pad to 76
            0x00, 0x00,
            // Cancel: style 0x50000000, x 261, y 75, cx 95, cy 16, id 2
            0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x01, 0x4B, 0x00, 0x5F, 0x00, 0x10, 0x00, 0x02, 0x00,
            0xFF, 0xFF, 0x80, 0x00,
            b'C', 0, b'a', 0, b'n', 0, b'c', 0, b'e', 0, b'l', 0, 0, 0,
            0x00, 0x00,
            // pad to 116
            0x00, 0x00,
            // Edit: style 0x50000000, x 23, y 12, cx 332, cy 37, id 200
            0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x00,
            0x17, 0x00, 0x0C, 0x00, 0x4C, 0x01, 0x25, 0x00, 0xC8, 0x00,
            0xFF, 0xFF, 0x81, 0x00,
            b'h', 0, b'i', 0, 0, 0,
            0x00, 0x00,
        ];
        assert_eq!(template.as_bytes(), expected.as_slice());
        assert_eq!(template.len(), 146);
    }

    #[test]
    fn test_items_start_on_dword_boundaries() {
        // Odd-length captions force padding before every item.
        let text = wide("abc");
        let mut s = spec(&text, FieldFlags::default());
        s.title = "T";
        s.ok_caption = "Yes";
        s.cancel_caption = "No!";
        let template = encode_dialog_template(&s).unwrap();
        let bytes = template.as_bytes();

        // Header (18) + menu/class (4) + "T\0" (4) = 26 -> OK item at 28.
        let ok_at = 28;
        assert_eq!(&bytes[26..28], &[0, 0]);
        assert_eq!(u16::from_le_bytes([bytes[ok_at + 16], bytes[ok_at + 17]]), IDOK);
        // OK item: 18 + 4 + 8 + 2 = 32 bytes -> 60, already aligned.
        let cancel_at = 60;
        assert_eq!(
            u16::from_le_bytes([bytes[cancel_at + 16], bytes[cancel_at + 17]]),
            IDCANCEL
        );
        // Cancel item: 32 bytes -> 92, aligned. Edit: 18 + 4 + 8 + 2 = 32 -> 124.
        let edit_at = 92;
        assert_eq!(
            u16::from_le_bytes([bytes[edit_at + 16], bytes[edit_at + 17]]),
            ID_EDITTEXT
        );
        assert_eq!(template.len(), 124);
        assert_eq!(template.len(), encoded_size(&s, &text));
    }

    #[test]
    fn test_edit_style_reflects_flags() {
        let base = WS_CHILD | WS_VISIBLE | ES_LEFT;
        assert_eq!(edit_style(FieldFlags::default()), base);
        let multiline = FieldFlags {
            multiline: true,
            ..Default::default()
        };
        assert_eq!(
            edit_style(multiline),
            base | ES_MULTILINE | ES_WANTRETURN | ES_AUTOVSCROLL
        );
        let secure_numeric = FieldFlags {
            secure: true,
            numeric: true,
            ..Default::default()
        };
        assert_eq!(edit_style(secure_numeric), base | ES_PASSWORD | ES_NUMBER);
        // Hidden does not change the style; the control is moved instead.
        let hidden = FieldFlags {
            hidden: true,
            ..Default::default()
        };
        assert_eq!(edit_style(hidden), base);
    }

    #[test]
    fn test_text_is_cut_at_embedded_null() {
        let mut text = wide("ab");
        text.push(0);
        text.extend(wide("zz"));
        let template = encode_dialog_template(&spec(&text, FieldFlags::default())).unwrap();
        assert_eq!(template.initial_text(), wide("ab").as_slice());
    }

    #[test]
    fn test_font_block_sets_ds_setfont() {
        let text = wide("");
        let font = TemplateFont {
            point_size: 9,
            face_name: "Segoe UI".to_string(),
        };
        let mut s = spec(&text, FieldFlags::default());
        s.font = Some(&font);
        let template = encode_dialog_template(&s).unwrap();
        let bytes = template.as_bytes();
        let style = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(style & DS_SETFONT, DS_SETFONT);
        // Point size directly follows "Edit text\0" (ends at 42).
        assert_eq!(u16::from_le_bytes([bytes[42], bytes[43]]), 9);
        assert_eq!(template.len(), encoded_size(&s, &text));
    }

    #[test]
    fn test_aligned_words_preserve_bytes() {
        let text = wide("hello");
        let template = encode_dialog_template(&spec(&text, FieldFlags::default())).unwrap();
        let words = template.to_aligned_words();
        let round: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(&round[..template.len()], template.as_bytes());
        assert!(round[template.len()..].iter().all(|&b| b == 0));
    }
}
