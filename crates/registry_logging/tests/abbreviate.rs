use registry_logging::abbreviate;

#[test]
fn short_values_are_left_alone() {
    assert_eq!(abbreviate("abc", 10), "abc");
    assert_eq!(abbreviate("", 0), "");
}

#[test]
fn long_values_keep_prefix_and_length() {
    let blob = "x".repeat(40);
    assert_eq!(abbreviate(&blob, 4), "xxxx...(40 chars)");
}

#[test]
fn counts_characters_not_bytes() {
    assert_eq!(abbreviate("ééé", 3), "ééé");
    assert_eq!(abbreviate("éééé", 2), "éé...(4 chars)");
}
