use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a workspace file: its absolute, `/`-separated path.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        let mut path: String = path.into().replace('\\', "/");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory containing the file, without a trailing slash (`/` for root files).
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.0[..idx],
        }
    }

    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// A sibling file in the same directory.
    pub fn sibling(&self, file_name: &str) -> FileId {
        let dir = self.dir();
        if dir == "/" {
            FileId::new(format!("/{file_name}"))
        } else {
            FileId::new(format!("{dir}/{file_name}"))
        }
    }

    pub fn is_go_file(&self) -> bool {
        self.0.ends_with(".go")
    }

    pub fn is_test_file(&self) -> bool {
        self.0.ends_with("_test.go")
    }

    /// The `file://` URI for this path.
    pub fn to_uri(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 7);
        out.push_str("file://");
        for b in self.0.bytes() {
            if is_uri_unreserved(b) || b == b'/' || b == b':' {
                out.push(b as char);
            } else {
                push_pct_encoded(&mut out, b);
            }
        }
        out
    }

    /// Parse a `file://` URI. Other schemes are rejected.
    pub fn from_uri(uri: &str) -> Option<FileId> {
        let path = uri.strip_prefix("file://")?;
        let bytes = path.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' && i + 2 < bytes.len() {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            } else {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(decoded).ok().map(FileId::new)
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_uri_unreserved(b: u8) -> bool {
    matches!(
        b,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~'
    )
}

fn push_pct_encoded(out: &mut String, b: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('%');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0F) as usize] as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trips_reserved_characters() {
        let file = FileId::new("/work space/p#1/a.go");
        let uri = file.to_uri();
        assert_eq!(uri, "file:///work%20space/p%231/a.go");
        assert_eq!(FileId::from_uri(&uri), Some(file));
    }

    #[test]
    fn dir_and_sibling() {
        let file = FileId::new("/ws/p/a.go");
        assert_eq!(file.dir(), "/ws/p");
        assert_eq!(file.file_name(), "a.go");
        assert_eq!(file.sibling("a_test.go"), FileId::new("/ws/p/a_test.go"));
        assert_eq!(FileId::new("/a.go").dir(), "/");
    }
}
