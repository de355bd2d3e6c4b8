use gantry_core::artifact::Artifact;
use gantry_core::dependency::{Dependency, Exclusion};

#[test]
fn four_part_coordinates_round_trip_through_display() {
    let coordinates = "org.example:lib:pom:2.1";
    let artifact = Artifact::parse(coordinates).unwrap();
    assert_eq!(artifact.to_string(), coordinates);
}

#[test]
fn coordinate_key_includes_classifier_and_extension() {
    let artifact = Artifact::parse("org.example:lib:jar:sources:1.0").unwrap();
    assert_eq!(artifact.coordinate_key(), "org.example:lib:sources:jar");
}

#[test]
fn coordinate_key_is_stable_across_versions() {
    let one = Artifact::parse("org.example:lib:1.0").unwrap();
    let two = Artifact::parse("org.example:lib:2.0").unwrap();
    assert_eq!(one.coordinate_key(), two.coordinate_key());
}

#[test]
fn dependency_display_mentions_scope_and_optionality() {
    let dependency = Dependency::new(Artifact::parse("g:a:1").unwrap(), "runtime");
    assert_eq!(dependency.to_string(), "g:a:jar:1 (runtime)");

    let optional = dependency.with_optional(Some(true));
    assert_eq!(optional.to_string(), "g:a:jar:1 (runtime, optional)");
}

#[test]
fn wildcard_exclusions_match_whole_groups() {
    let exclusion = Exclusion::new("org.example", "*");
    assert!(exclusion.matches(&Artifact::parse("org.example:anything:1").unwrap()));
    assert!(!exclusion.matches(&Artifact::parse("org.other:anything:1").unwrap()));
}

#[test]
fn properties_do_not_affect_coordinate_equality() {
    let plain = Artifact::parse("g:a:1").unwrap();
    let enriched = plain.with_property("packaging", "bundle");
    assert!(plain.same_coordinates(&enriched));
    // full equality does consider properties
    assert_ne!(plain, enriched);
}
