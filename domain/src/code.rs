//! Short code generation strategies.

use md5::{Digest, Md5};

use crate::{CodeGenerator, ShortCode, CODE_LEN};

/// Content-addressed generator: the first six hex characters of the MD5
/// digest of the URL bytes. Equal URLs always map to the same code; distinct
/// URLs may collide since only 24 bits of the digest are kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5CodeGenerator;

impl Md5CodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for Md5CodeGenerator {
    fn code_for(&self, url: &str) -> ShortCode {
        let hex = format!("{:x}", Md5::digest(url.as_bytes()));
        ShortCode(hex[..CODE_LEN].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        let g = Md5CodeGenerator::new();
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(g.code_for("").as_str(), "d41d8c");
        // md5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(g.code_for("abc").as_str(), "900150");
    }

    #[test]
    fn deterministic() {
        let g = Md5CodeGenerator::new();
        let a = g.code_for("https://openai.com");
        let b = g.code_for("https://openai.com");
        assert_eq!(a, b);
        assert_ne!(a, g.code_for("https://openai.com/"));
    }

    #[test]
    fn code_shape_is_six_lower_hex() {
        let g = Md5CodeGenerator::new();
        for i in 0..200 {
            let code = g.code_for(&format!("https://example.com/page/{i}"));
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }
}
