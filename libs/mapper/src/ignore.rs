//! Predicates that exclude catalog repositories from matching.

use imgmap_catalog::{CatalogTier, RepoRecord};

/// Excludes catalog repositories from consideration by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnorePredicate {
    /// Ignore repositories in any of these tiers.
    Tiers(Vec<CatalogTier>),

    /// Ignore `-iamguarded` repositories.
    Iamguarded,
}

impl IgnorePredicate {
    /// Ignore repositories in the named tiers (case-insensitive).
    pub fn tiers<I, S>(tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Tiers(
            tiers
                .into_iter()
                .map(|tier| CatalogTier::from(tier.as_ref().trim().to_string()))
                .collect(),
        )
    }

    /// Returns true if `record` must not be offered as a candidate.
    pub fn ignores(&self, record: &RepoRecord) -> bool {
        match self {
            Self::Tiers(tiers) => tiers.contains(&record.catalog_tier),
            Self::Iamguarded => record.name.contains("-iamguarded"),
        }
    }
}

/// The defaults for rewriting documents: iamguarded images are rarely what a
/// Dockerfile or chart wants, and FIPS variants must be opted into.
pub fn document_defaults() -> Vec<IgnorePredicate> {
    vec![
        IgnorePredicate::Iamguarded,
        IgnorePredicate::Tiers(vec![CatalogTier::Fips]),
    ]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IgnorePredicate::tiers(["fips"]), "nginx-fips", CatalogTier::Fips, true)]
    #[case(IgnorePredicate::tiers(["FIPS", "AI"]), "pytorch", CatalogTier::Ai, true)]
    #[case(IgnorePredicate::tiers(["fips"]), "nginx", CatalogTier::Application, false)]
    #[case(IgnorePredicate::Iamguarded, "cert-manager-webhook-iamguarded", CatalogTier::Application, true)]
    #[case(IgnorePredicate::Iamguarded, "cert-manager-webhook", CatalogTier::Application, false)]
    fn test_ignores(
        #[case] predicate: IgnorePredicate,
        #[case] name: &str,
        #[case] tier: CatalogTier,
        #[case] expected: bool,
    ) {
        let record = RepoRecord::new(name, tier);
        assert_eq!(predicate.ignores(&record), expected);
    }

    #[test]
    fn test_document_defaults() {
        let defaults = document_defaults();
        let fips = RepoRecord::new("go-fips", CatalogTier::Fips);
        let plain = RepoRecord::new("go", CatalogTier::Base);

        assert!(defaults.iter().any(|p| p.ignores(&fips)));
        assert!(!defaults.iter().any(|p| p.ignores(&plain)));
    }
}
