//! Hashing helpers

use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of `text`, e.g. for cache keys derived from URLs
pub fn get_md5(text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        assert_eq!(get_md5(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(get_md5("hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
