//! Asset filter predicates
//!
//! Decides whether an asset takes part in an export run. The criteria are
//! parsed once per run; evaluating them never mutates anything.

use std::collections::HashSet;

use crate::asset::{Asset, Tag};

/// Filter criteria for one export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Only assets of this asset source (None = all sources)
    asset_source: Option<String>,
    /// Only assets carrying at least one of these tag labels (None = any)
    tags: Option<HashSet<String>>,
    /// Only assets with a usage count of zero
    only_unused: bool,
}

impl FilterCriteria {
    /// Create criteria from raw command-line values
    ///
    /// # Arguments
    /// * `asset_source` - Asset source identifier, empty for all sources
    /// * `only_tags` - Comma-separated tag labels, empty for any tags
    /// * `only_unused` - Restrict to assets nothing references
    pub fn new(asset_source: &str, only_tags: &str, only_unused: bool) -> Self {
        let asset_source = (!asset_source.is_empty()).then(|| asset_source.to_string());
        // A non-empty filter without any label matches nothing
        let tags = (!only_tags.is_empty()).then(|| parse_tag_filter(only_tags));

        Self {
            asset_source,
            tags,
            only_unused,
        }
    }

    /// Criteria matching every asset
    pub fn all() -> Self {
        Self::default()
    }

    pub fn asset_source(&self) -> Option<&str> {
        self.asset_source.as_deref()
    }

    pub fn only_unused(&self) -> bool {
        self.only_unused
    }

    pub fn tags(&self) -> Option<&HashSet<String>> {
        self.tags.as_ref()
    }

    /// Whether the asset should be exported
    ///
    /// Source and usage are checked before tags.
    pub fn should_include(&self, asset: &Asset) -> bool {
        matches_asset_source(asset, self.asset_source.as_deref())
            && matches_usage(asset, self.only_unused)
            && matches_tags(&asset.tags, self.tags.as_ref())
    }
}

/// Split a comma-separated tag filter into a set of trimmed labels
///
/// Empty tokens are dropped, so `"a,,b, "` yields `{a, b}`.
pub fn parse_tag_filter(only_tags: &str) -> HashSet<String> {
    only_tags
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Exact, case-sensitive asset source match
pub fn matches_asset_source(asset: &Asset, asset_source: Option<&str>) -> bool {
    match asset_source {
        Some(source) => asset.asset_source_identifier == source,
        None => true,
    }
}

pub fn matches_usage(asset: &Asset, only_unused: bool) -> bool {
    !only_unused || asset.is_unused()
}

/// Whether any of the asset's tag labels is wanted
pub fn matches_tags(tags: &[Tag], wanted: Option<&HashSet<String>>) -> bool {
    match wanted {
        Some(wanted) => tags.iter().any(|tag| wanted.contains(&tag.label)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRecord, Resource};

    fn asset(source: &str, tags: &[&str], usage_count: u64) -> Asset {
        AssetRecord {
            identifier: "a1".to_string(),
            asset_source_identifier: Some(source.to_string()),
            usage_count,
            tags: tags.iter().map(|label| Tag::new(*label)).collect(),
            resource: Some(Resource {
                filename: "a1.jpg".to_string(),
                file_size: 10,
                locator: "l".to_string(),
            }),
            ..Default::default()
        }
        .into_exportable()
        .unwrap()
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let criteria = FilterCriteria::new("", "", false);
        assert_eq!(criteria, FilterCriteria::all());
        assert!(criteria.should_include(&asset("neos", &[], 3)));
    }

    #[test]
    fn test_parse_tag_filter_trims_and_drops_empty_tokens() {
        let tags = parse_tag_filter(" B , C,, ");
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("B"));
        assert!(tags.contains("C"));
        assert!(parse_tag_filter("").is_empty());
        assert!(parse_tag_filter(" , ").is_empty());
    }

    #[test]
    fn test_tag_filter_without_labels_matches_nothing() {
        for only_tags in [" ", ",", " , "] {
            let criteria = FilterCriteria::new("", only_tags, false);
            assert_eq!(criteria.tags(), Some(&HashSet::new()), "{only_tags:?}");
            assert!(!criteria.should_include(&asset("neos", &[], 0)));
            assert!(!criteria.should_include(&asset("neos", &["A"], 0)));
        }
    }

    #[test]
    fn test_tag_intersection() {
        let criteria = FilterCriteria::new("", "B,C", false);
        assert!(criteria.should_include(&asset("neos", &["A", "B"], 0)));
        assert!(!criteria.should_include(&asset("neos", &["X"], 0)));
    }

    #[test]
    fn test_untagged_asset_never_matches_tag_filter() {
        let criteria = FilterCriteria::new("", "A", false);
        assert!(!criteria.should_include(&asset("neos", &[], 0)));
    }

    #[test]
    fn test_asset_source_is_exact_and_case_sensitive() {
        let criteria = FilterCriteria::new("neos", "", false);
        assert!(criteria.should_include(&asset("neos", &[], 0)));
        assert!(!criteria.should_include(&asset("Neos", &[], 0)));
        assert!(!criteria.should_include(&asset("neos-dam", &[], 0)));
    }

    #[test]
    fn test_only_unused() {
        let criteria = FilterCriteria::new("", "", true);
        assert!(criteria.should_include(&asset("neos", &[], 0)));
        assert!(!criteria.should_include(&asset("neos", &[], 1)));
    }

    #[test]
    fn test_should_include_is_conjunction_of_sub_predicates() {
        let sources = ["neos", "dam", "Neos"];
        let tag_sets: [&[&str]; 4] = [&[], &["A"], &["B", "C"], &["X", "A"]];
        let usages = [0u64, 1, 7];
        let source_filters = ["", "neos", "dam"];
        let tag_filters = ["", "A", "C, X", "Z", " , "];

        for source in sources {
            for tags in tag_sets {
                for usage in usages {
                    let a = asset(source, tags, usage);
                    for source_filter in source_filters {
                        for tag_filter in tag_filters {
                            for only_unused in [false, true] {
                                let criteria =
                                    FilterCriteria::new(source_filter, tag_filter, only_unused);

                                let wanted = parse_tag_filter(tag_filter);
                                let expected = (source_filter.is_empty()
                                    || source == source_filter)
                                    && (tag_filter.is_empty()
                                        || tags.iter().any(|t| wanted.contains(*t)))
                                    && (!only_unused || usage == 0);

                                assert_eq!(
                                    criteria.should_include(&a),
                                    expected,
                                    "source={source} tags={tags:?} usage={usage} \
                                     filter=({source_filter:?}, {tag_filter:?}, {only_unused})"
                                );
                                // Evaluating again gives the same answer
                                assert_eq!(criteria.should_include(&a), expected);
                            }
                        }
                    }
                }
            }
        }
    }
}
