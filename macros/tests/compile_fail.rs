#[test]
fn duplicate_tags_are_rejected() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/duplicate_tag.rs");
}

#[test]
fn open_unions_need_an_unknown_variant() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/missing_unknown_variant.rs");
}

#[test]
fn closed_unions_cannot_hold_unknowns() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/unknown_in_closed_union.rs");
}

#[test]
fn tagged_variants_need_a_tag() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/untagged_variant.rs");
}

#[test]
fn nullable_fields_must_be_options() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/nullable_without_option.rs");
}
