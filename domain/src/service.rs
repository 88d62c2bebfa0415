use tracing::debug;

use crate::{CodeGenerator, CoreError, MappingRepository, ShortCode, UrlMapping};

/// Application service orchestrating shortening and resolution of URLs.
///
/// Generic over repository and code generator so the store is injected once
/// at startup rather than reopened per call. The service adds no locking or
/// caching of its own; write isolation is left to the repository.
pub struct LinkService<R: MappingRepository, G: CodeGenerator> {
    repo: R,
    generator: G,
}

impl<R: MappingRepository, G: CodeGenerator> LinkService<R, G> {
    pub fn new(repo: R, generator: G) -> Self {
        Self { repo, generator }
    }

    /// Shorten an already validated URL and return its code.
    ///
    /// The URL is not re-validated here. If another URL already owns the
    /// computed code it is overwritten (last write wins).
    pub fn shorten(&self, url: &str) -> Result<ShortCode, CoreError> {
        let code = self.generator.code_for(url);
        self.repo.upsert(&UrlMapping::new(code.clone(), url))?;
        debug!(code = %code, "shortened");
        Ok(code)
    }

    /// Resolve a code to its original URL. `Ok(None)` means the code is unknown.
    pub fn resolve(&self, code: &ShortCode) -> Result<Option<String>, CoreError> {
        Ok(self.repo.get(code)?.map(|m| m.original_url))
    }

    /// Like `resolve`, but first rejects codes of the wrong length without
    /// touching the repository.
    pub fn resolve_str(&self, code: &str) -> Result<Option<String>, CoreError> {
        let code = ShortCode::parse(code)?;
        self.resolve(&code)
    }

    /// Number of stored mappings.
    pub fn count(&self) -> Result<usize, CoreError> {
        self.repo.count()
    }

    pub fn into_repo(self) -> R {
        self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repo::InMemoryRepo;
    use crate::code::Md5CodeGenerator;

    /// Sends every URL to the same code to force collisions.
    struct FixedCode(&'static str);
    impl CodeGenerator for FixedCode {
        fn code_for(&self, _url: &str) -> ShortCode {
            ShortCode::parse(self.0).unwrap()
        }
    }

    /// Repository that fails every call.
    struct BrokenRepo;
    impl MappingRepository for BrokenRepo {
        fn get(&self, _code: &ShortCode) -> Result<Option<UrlMapping>, CoreError> {
            Err(CoreError::StorageUnavailable("disk gone".into()))
        }
        fn upsert(&self, _mapping: &UrlMapping) -> Result<(), CoreError> {
            Err(CoreError::StorageUnavailable("disk gone".into()))
        }
        fn count(&self) -> Result<usize, CoreError> {
            Err(CoreError::StorageUnavailable("disk gone".into()))
        }
    }

    fn svc() -> LinkService<InMemoryRepo, Md5CodeGenerator> {
        LinkService::new(InMemoryRepo::new(), Md5CodeGenerator::new())
    }

    #[test]
    fn shorten_then_resolve_round_trips() {
        let svc = svc();
        let code = svc.shorten("https://openai.com").expect("shortened");
        assert_eq!(code.as_str().len(), 6);
        assert_eq!(
            svc.resolve(&code).unwrap().as_deref(),
            Some("https://openai.com")
        );
    }

    #[test]
    fn shorten_is_deterministic_and_idempotent() {
        let svc = svc();
        let a = svc.shorten("https://example.com/x").unwrap();
        let b = svc.shorten("https://example.com/x").unwrap();
        assert_eq!(a, b);
        assert_eq!(svc.count().unwrap(), 1);
        assert_eq!(
            svc.resolve(&a).unwrap().as_deref(),
            Some("https://example.com/x")
        );
    }

    #[test]
    fn collision_is_last_write_wins() {
        let svc = LinkService::new(InMemoryRepo::new(), FixedCode("abcdef"));
        let c1 = svc.shorten("https://one.com").unwrap();
        let c2 = svc.shorten("https://two.com").unwrap();
        assert_eq!(c1, c2);
        assert_eq!(svc.count().unwrap(), 1);
        assert_eq!(svc.resolve(&c1).unwrap().as_deref(), Some("https://two.com"));

        svc.shorten("https://one.com").unwrap();
        assert_eq!(svc.resolve(&c1).unwrap().as_deref(), Some("https://one.com"));
    }

    #[test]
    fn unknown_code_is_none() {
        let svc = svc();
        assert_eq!(svc.resolve_str("abcdef").unwrap(), None);
        assert_eq!(svc.resolve_str("000000").unwrap(), None);
    }

    #[test]
    fn resolve_str_guards_length() {
        let svc = LinkService::new(BrokenRepo, Md5CodeGenerator::new());
        // rejected before the repository is consulted
        assert!(matches!(
            svc.resolve_str("abc"),
            Err(CoreError::InvalidCode(_))
        ));
        assert!(matches!(
            svc.resolve_str("abcdef"),
            Err(CoreError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn storage_errors_propagate() {
        let svc = LinkService::new(BrokenRepo, Md5CodeGenerator::new());
        assert!(matches!(
            svc.shorten("https://example.com"),
            Err(CoreError::StorageUnavailable(m)) if m == "disk gone"
        ));
    }

    #[test]
    fn end_to_end_scenario() {
        let svc = svc();
        let c = svc.shorten("https://openai.com").unwrap();
        assert_eq!(
            svc.resolve(&c).unwrap(),
            Some("https://openai.com".to_string())
        );
        if c.as_str() != "000000" {
            assert_eq!(svc.resolve_str("000000").unwrap(), None);
        }
    }
}
