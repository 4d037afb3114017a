//! §4.1 "Builder contracts" double-quoted string literal normalization:
//! escape expansion followed by multi-line re-indentation, driven straight
//! against `util::normalize_dquote_string` the way a lexer would call it
//! once it knows the argument's opening-quote column.

use yang_schema::util::{is_valid_identifier, normalize_dquote_string, split_prefixed};

mod escapes {
    use super::*;

    #[test]
    fn expands_newline_tab_backslash_and_quote() {
        assert_eq!(normalize_dquote_string(r#"a\nb"#, 0), "a\nb");
        assert_eq!(normalize_dquote_string(r#"a\tb"#, 0), "a\tb");
        assert_eq!(normalize_dquote_string(r#"a\\b"#, 0), "a\\b");
        assert_eq!(normalize_dquote_string(r#"a\"b"#, 0), "a\"b");
    }

    #[test]
    fn an_unrecognized_escape_is_passed_through_verbatim() {
        assert_eq!(normalize_dquote_string(r#"a\qb"#, 0), "a\\qb");
    }

    #[test]
    fn a_trailing_lone_backslash_is_kept_as_is() {
        assert_eq!(normalize_dquote_string(r#"a\"#, 0), "a\\");
    }

    #[test]
    fn a_string_with_no_escapes_passes_through_unchanged() {
        assert_eq!(normalize_dquote_string("plain text", 4), "plain text");
    }
}

mod reindent {
    use super::*;

    #[test]
    fn the_worked_example_expands_an_overshooting_tab_to_literal_spaces() {
        // §8 scenario 6: opening column 4, `line2` indented two spaces,
        // `line3` indented with one tab.
        let raw = r#"line1\n  line2\n\tline3"#;
        let got = normalize_dquote_string(raw, 4);
        assert_eq!(got, "line1\nline2\n        line3");
    }

    #[test]
    fn indentation_up_to_the_opening_column_is_stripped_from_every_continuation_line() {
        let raw = "first\n    second\n    third";
        assert_eq!(normalize_dquote_string(raw, 4), "first\nsecond\nthird");
    }

    #[test]
    fn indentation_short_of_the_opening_column_is_stripped_in_full() {
        let raw = "first\n  second";
        assert_eq!(normalize_dquote_string(raw, 4), "first\nsecond");
    }

    #[test]
    fn text_past_the_indent_column_on_a_continuation_line_is_preserved() {
        let raw = "first\n    deeper text";
        assert_eq!(normalize_dquote_string(raw, 4), "first\ndeeper text");
    }

    #[test]
    fn the_first_line_is_never_reindented() {
        let raw = "    first\nsecond";
        assert_eq!(normalize_dquote_string(raw, 4), "    first\nsecond");
    }

    #[test]
    fn a_zero_opening_column_strips_nothing() {
        let raw = "first\n  second";
        assert_eq!(normalize_dquote_string(raw, 0), "first\n  second");
    }

    #[test]
    fn a_tab_that_lands_exactly_on_the_indent_column_is_fully_consumed() {
        let raw = "first\n\tsecond";
        assert_eq!(normalize_dquote_string(raw, 8), "first\nsecond");
    }

    #[test]
    fn a_blank_continuation_line_stays_blank() {
        let raw = "first\n\nsecond";
        assert_eq!(normalize_dquote_string(raw, 4), "first\n\nsecond");
    }
}

mod identifiers {
    use super::*;

    #[test]
    fn accepts_ordinary_identifiers() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("foo-bar"));
        assert!(is_valid_identifier("foo.bar"));
        assert!(is_valid_identifier("_leading"));
        assert!(is_valid_identifier("foo123"));
    }

    #[test]
    fn rejects_an_empty_identifier() {
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn rejects_a_leading_digit() {
        assert!(!is_valid_identifier("1foo"));
    }

    #[test]
    fn rejects_an_internal_space_or_colon() {
        assert!(!is_valid_identifier("foo bar"));
        assert!(!is_valid_identifier("foo:bar"));
    }

    #[test]
    fn rejects_the_reserved_xml_prefix_case_insensitively() {
        assert!(!is_valid_identifier("xml"));
        assert!(!is_valid_identifier("XMLSchema"));
        assert!(!is_valid_identifier("XmlFoo"));
    }

    #[test]
    fn xml_as_a_non_prefix_substring_is_still_allowed() {
        assert!(is_valid_identifier("foo-xml-bar"));
    }
}

mod prefixed_names {
    use super::*;

    #[test]
    fn splits_a_prefixed_name_on_the_first_colon() {
        assert_eq!(split_prefixed("ns:name"), (Some("ns"), "name"));
    }

    #[test]
    fn a_name_with_no_colon_has_no_prefix() {
        assert_eq!(split_prefixed("name"), (None, "name"));
    }
}
