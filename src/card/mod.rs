//! Drawing the card: covers, text and the row layout.

pub(crate) mod cover;
pub(crate) mod layout;
pub(crate) mod pixels;
pub(crate) mod text;

#[cfg(test)]
#[path = "../../tests/unit/card/fonts.rs"]
pub(crate) mod test_fonts;
