/// Byte-to-text decoding applied to windowed reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8; invalid sequences decode to U+FFFD.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}
