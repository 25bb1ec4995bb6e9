//! Entry naming inside exported archives.

use std::collections::HashSet;

/// Make a folder or file name safe to use as one archive path segment.
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" => "untitled".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

/// Hands out unique names within one archive directory.
///
/// The first use of a name keeps it; later ones become `name (1)`,
/// `name (2)` and so on. Comparison ignores case so the archive extracts
/// cleanly on case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique directory name.
    pub fn allocate_dir(&mut self, name: &str) -> String {
        self.allocate(name, "")
    }

    /// Reserve a unique file name, numbering before the extension.
    pub fn allocate_file(&mut self, name: &str) -> String {
        let (stem, ext) = split_extension(name);
        self.allocate(stem, ext)
    }

    fn allocate(&mut self, stem: &str, ext: &str) -> String {
        let name = format!("{stem}{ext}");
        if self.taken.insert(name.to_lowercase()) {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{stem} ({n}){ext}");
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Split `report.pdf` into `("report", ".pdf")`. Leading-dot names have
/// no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_segment("  Docs "), "Docs");
        assert_eq!(sanitize_segment(""), "untitled");
        assert_eq!(sanitize_segment(".."), "__");
        assert_eq!(sanitize_segment("tab\there"), "tab_here");
    }

    #[test]
    fn test_allocator_disambiguates() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate_dir("Docs"), "Docs");
        assert_eq!(names.allocate_dir("Docs"), "Docs (1)");
        assert_eq!(names.allocate_dir("docs"), "docs (2)");
        assert_eq!(names.allocate_dir("v1.2"), "v1.2");
        assert_eq!(names.allocate_dir("v1.2"), "v1.2 (1)");
        assert_eq!(names.allocate_file("a.txt"), "a.txt");
        assert_eq!(names.allocate_file("a.txt"), "a (1).txt");
        assert_eq!(names.allocate_file(".env"), ".env");
        assert_eq!(names.allocate_file(".env"), ".env (1)");
    }
}
