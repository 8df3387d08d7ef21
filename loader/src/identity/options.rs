use crate::bail;
use crate::error::{ErrorKind, LoaderResult};
use crate::types::{Package, SearchOptions, SynonymTable};

/// Reads the identifying fields of `package` into a [`SearchOptions`].
///
/// Values are looked up at the top level first and then in `extras`. Fields without a value are
/// kept as empty strings; it is only an error when none of the fields has a value.
pub fn build_search_options(
    package: &Package,
    identity_fields: &[String],
) -> LoaderResult<SearchOptions> {
    let options: SearchOptions = identity_fields
        .iter()
        .map(|field| {
            let value = package
                .identity_value(field)
                .map(|value| value.into_owned())
                .unwrap_or_default();
            (field.clone(), value)
        })
        .collect();

    if options.values().all(String::is_empty) {
        bail!(
            ErrorKind::InvalidInput,
            "Package has blank values for all identifying fields",
            format!(
                "package '{}', identifying fields: {identity_fields:?}",
                package.name
            )
        );
    }

    Ok(options)
}

/// Expands `options` into one alternative per combination of synonymous values.
///
/// The first element is always `options` itself. For every field with synonyms whose value
/// belongs to an equivalence class, each alternative built so far is copied once per other
/// value of that class, so the result is the cartesian product across fields.
pub fn expand_synonyms(options: &SearchOptions, synonyms: &SynonymTable) -> Vec<SearchOptions> {
    let mut alternatives = vec![options.clone()];

    for (field, value) in options {
        let Some(classes) = synonyms.get(field) else {
            continue;
        };

        for class in classes.iter().filter(|class| class.contains(value)) {
            let existing = alternatives.len();
            for index in 0..existing {
                for synonym in class.iter().filter(|synonym| *synonym != value) {
                    let mut alternative = alternatives[index].clone();
                    alternative.insert(field.clone(), synonym.clone());
                    alternatives.push(alternative);
                }
            }
        }
    }

    alternatives
}

/// Returns `true` if `package` has exactly the values in `options`.
///
/// Values are read as text the same way [`build_search_options`] reads them, so a numeric
/// field matches the option built from it. A missing value and an empty one are equal.
pub fn package_matches_options(package: &Package, options: &SearchOptions) -> bool {
    options.iter().all(|(key, wanted)| {
        package.identity_value(key).as_deref().unwrap_or_default() == wanted.as_str()
    })
}

/// Returns `true` if `package` matches any of the alternative option sets.
pub fn package_matches_any(package: &Package, alternatives: &[SearchOptions]) -> bool {
    alternatives
        .iter()
        .any(|options| package_matches_options(package, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> SearchOptions {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_build_search_options_reads_top_level_then_extras() {
        let package = Package::new("census")
            .with_field("title", "Census")
            .with_extra("department", "ONS");

        let built =
            build_search_options(&package, &fields(&["title", "department", "geo"])).unwrap();

        assert_eq!(
            built,
            options(&[("title", "Census"), ("department", "ONS"), ("geo", "")])
        );
    }

    #[test]
    fn test_build_search_options_rejects_all_blank() {
        let package = Package::new("census").with_extra("department", "");

        let err = build_search_options(&package, &fields(&["department", "geo"])).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_expand_synonyms_without_matching_class() {
        let synonyms = SynonymTable::from([(
            "department".to_owned(),
            vec![vec!["DfE".to_owned(), "DCSF".to_owned()]],
        )]);
        let base = options(&[("department", "ONS")]);

        assert_eq!(expand_synonyms(&base, &synonyms), vec![base]);
    }

    #[test]
    fn test_expand_synonyms_is_cartesian() {
        let synonyms = SynonymTable::from([
            (
                "department".to_owned(),
                vec![
                    vec!["DfE".to_owned(), "DCSF".to_owned()],
                    vec!["DCLG".to_owned(), "CLG".to_owned()],
                ],
            ),
            (
                "geo".to_owned(),
                vec![vec!["UK".to_owned(), "GB".to_owned(), "United Kingdom".to_owned()]],
            ),
        ]);
        let base = options(&[("department", "DfE"), ("geo", "UK")]);

        let expanded = expand_synonyms(&base, &synonyms);

        assert_eq!(
            expanded,
            vec![
                options(&[("department", "DfE"), ("geo", "UK")]),
                options(&[("department", "DCSF"), ("geo", "UK")]),
                options(&[("department", "DfE"), ("geo", "GB")]),
                options(&[("department", "DfE"), ("geo", "United Kingdom")]),
                options(&[("department", "DCSF"), ("geo", "GB")]),
                options(&[("department", "DCSF"), ("geo", "United Kingdom")]),
            ]
        );
    }

    #[test]
    fn test_matches_options_checks_extras_and_blank_values() {
        let package = Package::new("census")
            .with_field("title", "")
            .with_extra("title", "Census")
            .with_extra("department", "ONS");

        assert!(package_matches_options(
            &package,
            &options(&[("title", "Census"), ("department", "ONS"), ("geo", "")])
        ));
        assert!(!package_matches_options(
            &package,
            &options(&[("department", "ONS Wales")])
        ));
        assert!(!package_matches_options(&package, &options(&[("geo", "UK")])));
    }

    #[test]
    fn test_matches_options_built_from_non_string_values() {
        let package = Package::new("census")
            .with_field("year", serde_json::json!(2011))
            .with_field("national", serde_json::json!(true));

        let built = build_search_options(&package, &fields(&["year", "national"])).unwrap();

        assert_eq!(built, options(&[("year", "2011"), ("national", "true")]));
        assert!(package_matches_options(&package, &built));
        assert!(!package_matches_options(&package, &options(&[("year", "2012")])));
    }

    #[test]
    fn test_matches_any_alternative() {
        let package = Package::new("schools").with_extra("department", "DCSF");
        let alternatives = vec![
            options(&[("department", "DfE")]),
            options(&[("department", "DCSF")]),
        ];

        assert!(package_matches_any(&package, &alternatives));
        assert!(!package_matches_any(&package, &alternatives[..1]));
    }
}
