//! Collision-free naming for uploads into an existing namespace

use crate::error::Result;
use crate::providers::ObjectStore;

/// Split `name` into stem and extension at the last dot
///
/// Leading dots belong to the stem, so `.env` has no extension while
/// `archive.tar.gz` splits into `archive.tar` and `.gz`.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}

/// `name` with `(n)` inserted before its extension
pub fn versioned_name(name: &str, n: u32) -> String {
    let (stem, ext) = split_extension(name);
    format!("{}({}){}", stem, n, ext)
}

/// First name in `desired, stem(1)ext, stem(2)ext, ...` absent from the namespace
pub async fn next_available_name(
    store: &dyn ObjectStore,
    namespace: &str,
    desired: &str,
) -> Result<String> {
    if !store.exists(namespace, desired).await? {
        return Ok(desired.to_string());
    }

    let mut n = 1;
    loop {
        let candidate = versioned_name(desired, n);
        if !store.exists(namespace, &candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryObjectStore;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("doc.pdf"), ("doc", ".pdf"));
        assert_eq!(split_extension("a.b.pdf"), ("a.b", ".pdf"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("..pdf"), ("..pdf", ""));
        assert_eq!(split_extension("..a.pdf"), ("..a", ".pdf"));
        assert_eq!(split_extension("doc."), ("doc", "."));
    }

    #[test]
    fn test_versioned_name() {
        assert_eq!(versioned_name("doc.pdf", 3), "doc(3).pdf");
        assert_eq!(versioned_name("README", 1), "README(1)");
    }

    #[tokio::test]
    async fn test_next_available_name() {
        let store = MemoryObjectStore::new();
        let ns = "acme-requirements";

        assert_eq!(
            next_available_name(&store, ns, "doc.pdf").await.unwrap(),
            "doc.pdf"
        );

        store.write(ns, "doc.pdf", b"1", "application/pdf").await.unwrap();
        store.write(ns, "doc(1).pdf", b"2", "application/pdf").await.unwrap();

        assert_eq!(
            next_available_name(&store, ns, "doc.pdf").await.unwrap(),
            "doc(2).pdf"
        );
    }
}
