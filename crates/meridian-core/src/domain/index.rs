//! Subdivision index: country -> subdivisions, country -> subdivision-type label.
//!
//! Design:
//! - Keys are `Option<Country>`; `None` is the unresolved-owner bucket.
//! - Both maps are filled from the same subset. A country with a list always
//!   has a label; a first subset with no entries sets the label only.
//! - The index is built off to the side and installed whole; readers never
//!   observe a half-built index.

use std::collections::HashMap;

use super::country::{Country, CountryCode, Subdivision};
use super::records::RawSubdivisionGroup;

/// Lookup structures produced by one successful subdivision load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdivisionIndex {
    /// Owner -> subdivisions in source order.
    subdivisions: HashMap<Option<Country>, Vec<Subdivision>>,

    /// Owner -> subdivision-type label (last group for an owner wins).
    labels: HashMap<Option<Country>, String>,
}

impl SubdivisionIndex {
    /// Subdivisions of `country`, or an empty slice if it has none.
    pub fn subdivisions_of(&self, country: &Country) -> &[Subdivision] {
        self.subdivisions
            .get(&Some(country.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Subdivision-type label of `country` (e.g. "State").
    pub fn label_of(&self, country: &Country) -> Option<&str> {
        self.labels.get(&Some(country.clone())).map(String::as_str)
    }

    /// Subdivisions whose owner could not be resolved.
    pub fn unresolved(&self) -> &[Subdivision] {
        self.subdivisions
            .get(&None)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of owners with an entry (the unresolved bucket counts as one).
    pub fn owner_count(&self) -> usize {
        self.subdivisions.len()
    }

    /// Total number of subdivisions across all owners.
    pub fn subdivision_count(&self) -> usize {
        self.subdivisions.values().map(Vec::len).sum()
    }

    /// Iterate resolved owners (no particular order).
    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.subdivisions.keys().filter_map(Option::as_ref)
    }

    fn append(&mut self, owner: Option<Country>, subdivision: Subdivision) {
        self.subdivisions.entry(owner).or_default().push(subdivision);
    }

    fn set_label(&mut self, owner: Option<Country>, label: String) {
        self.labels.insert(owner, label);
    }
}

/// Output of [`build_index`]: the index plus what was left out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBuild {
    pub index: SubdivisionIndex,

    /// Groups processed (had at least one subset).
    pub groups: usize,

    /// Groups skipped because they carried no subset.
    pub empty_groups: usize,

    /// Subdivisions added to the index (unresolved bucket included).
    pub subdivisions: usize,

    /// Subsets ignored because only the first subset of a group is used.
    pub ignored_subsets: usize,

    /// Country codes that matched no known country, in source order.
    pub unresolved_codes: Vec<CountryCode>,
}

/// Resolve a country by code (first match).
///
/// Linear scan: national datasets are a few hundred entries.
pub fn find_country_by_code<'a>(countries: &'a [Country], code: &str) -> Option<&'a Country> {
    countries.iter().find(|c| c.code().as_str() == code)
}

/// Fold raw subdivision groups into a [`SubdivisionIndex`].
///
/// Per group with at least one subset:
/// 1. resolve the owner by code (unresolved -> `None` owner)
/// 2. append every entry of the **first** subset, in source order
/// 3. record that subset's type as the owner's label (overwrites)
///
/// Later subsets of a group are never read.
pub fn build_index(groups: &[RawSubdivisionGroup], countries: &[Country]) -> IndexBuild {
    let mut build = IndexBuild::default();

    for group in groups {
        let Some(subset) = group.primary_subset() else {
            build.empty_groups += 1;
            continue;
        };
        build.groups += 1;
        build.ignored_subsets += group.subsets.len() - 1;

        let owner = find_country_by_code(countries, &group.code).cloned();
        if owner.is_none() {
            build.unresolved_codes.push(CountryCode::new(group.code.clone()));
        }

        for entry in &subset.entries {
            let subdivision = Subdivision::new(&entry.name, &entry.code, owner.clone());
            build.index.append(owner.clone(), subdivision);
            build.subdivisions += 1;
        }
        build
            .index
            .set_label(owner, subset.subdivision_type.clone());
    }

    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{RawSubdivisionEntry, RawSubdivisionSubset};

    fn subset(label: &str, entries: &[(&str, &str)]) -> RawSubdivisionSubset {
        RawSubdivisionSubset {
            subdivision_type: label.to_string(),
            entries: entries
                .iter()
                .map(|(code, name)| RawSubdivisionEntry {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn group(code: &str, subsets: Vec<RawSubdivisionSubset>) -> RawSubdivisionGroup {
        RawSubdivisionGroup {
            code: code.to_string(),
            subsets,
        }
    }

    fn countries() -> Vec<Country> {
        vec![
            Country::new("US", "United States"),
            Country::new("DE", "Germany"),
            Country::new("MC", "Monaco"),
        ]
    }

    #[test]
    fn single_group_builds_list_and_label() {
        let countries = countries();
        let groups = vec![group("US", vec![subset("State", &[("US-CA", "California")])])];

        let build = build_index(&groups, &countries);
        let us = &countries[0];

        assert_eq!(build.index.label_of(us), Some("State"));
        assert_eq!(
            build.index.subdivisions_of(us),
            &[Subdivision::new("California", "US-CA", Some(us.clone()))]
        );
        assert_eq!(build.groups, 1);
        assert!(build.unresolved_codes.is_empty());
    }

    #[test]
    fn entries_keep_source_order() {
        let countries = countries();
        let groups = vec![group(
            "DE",
            vec![subset(
                "Land",
                &[("DE-BY", "Bayern"), ("DE-BE", "Berlin"), ("DE-HH", "Hamburg")],
            )],
        )];

        let build = build_index(&groups, &countries);
        let names: Vec<&str> = build
            .index
            .subdivisions_of(&countries[1])
            .iter()
            .map(Subdivision::name)
            .collect();
        assert_eq!(names, vec!["Bayern", "Berlin", "Hamburg"]);
    }

    #[test]
    fn only_first_subset_is_used() {
        let countries = countries();
        let groups = vec![group(
            "US",
            vec![
                subset("State", &[("US-CA", "California")]),
                subset("Outlying area", &[("US-GU", "Guam"), ("US-PR", "Puerto Rico")]),
            ],
        )];

        let build = build_index(&groups, &countries);
        let us = &countries[0];

        assert_eq!(build.index.label_of(us), Some("State"));
        assert_eq!(build.index.subdivisions_of(us).len(), 1);
        assert_eq!(build.ignored_subsets, 1);
    }

    #[test]
    fn repeated_group_appends_and_overwrites_label() {
        let countries = countries();
        let groups = vec![
            group("US", vec![subset("State", &[("US-CA", "California")])]),
            group("US", vec![subset("District", &[("US-DC", "District of Columbia")])]),
        ];

        let build = build_index(&groups, &countries);
        let us = &countries[0];

        assert_eq!(build.index.subdivisions_of(us).len(), 2);
        assert_eq!(build.index.label_of(us), Some("District"));
    }

    #[test]
    fn unknown_code_goes_to_unresolved_bucket() {
        let countries = countries();
        let groups = vec![group("ZZ", vec![subset("Zone", &[("ZZ-01", "Nowhere")])])];

        let build = build_index(&groups, &countries);

        assert_eq!(build.unresolved_codes, vec![CountryCode::new("ZZ")]);
        assert_eq!(build.index.unresolved().len(), 1);
        assert!(build.index.unresolved()[0].country().is_none());
        for country in &countries {
            assert!(build.index.subdivisions_of(country).is_empty());
            assert_eq!(build.index.label_of(country), None);
        }
    }

    #[test]
    fn group_without_subsets_is_skipped() {
        let countries = countries();
        let groups = vec![group("MC", vec![])];

        let build = build_index(&groups, &countries);

        assert_eq!(build.empty_groups, 1);
        assert_eq!(build.index.owner_count(), 0);
        assert_eq!(build.index.label_of(&countries[2]), None);
    }

    #[test]
    fn every_resolved_subdivision_belongs_to_a_known_country() {
        let countries = countries();
        let groups = vec![
            group("US", vec![subset("State", &[("US-CA", "California"), ("US-NY", "New York")])]),
            group("DE", vec![subset("Land", &[("DE-BY", "Bayern")])]),
            group("ZZ", vec![subset("Zone", &[("ZZ-01", "Nowhere")])]),
        ];

        let build = build_index(&groups, &countries);

        for owner in build.index.countries() {
            assert!(countries.contains(owner));
            for sub in build.index.subdivisions_of(owner) {
                assert_eq!(sub.country(), Some(owner));
            }
        }
        assert_eq!(build.index.subdivision_count(), 4);
        assert_eq!(build.subdivisions, 4);
    }

    #[test]
    fn empty_first_subset_sets_label_without_entries() {
        let countries = countries();
        let groups = vec![group(
            "MC",
            vec![subset("Quarter", &[]), subset("Ward", &[("MC-MO", "Monaco-Ville")])],
        )];

        let build = build_index(&groups, &countries);
        let mc = &countries[2];

        assert_eq!(build.index.label_of(mc), Some("Quarter"));
        assert!(build.index.subdivisions_of(mc).is_empty());
        assert_eq!(build.subdivisions, 0);
        assert_eq!(build.groups, 1);
    }
}
