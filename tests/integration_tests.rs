// Integration tests for jsonnet-codec using test fixtures
use jsonnet_codec::api::{format, manifest, parse, parse_with, ParseOptions};
use jsonnet_codec::error::JsonnetError;
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

// Valid snippets: parse, survive the document round trip and format stably
mod ok_tests {
    use super::*;

    fn check(filename: &str) {
        let source = read_test_file("ok", filename);
        let document = parse(&source)
            .unwrap_or_else(|e| panic!("{filename} should parse: {e}"));
        let manifested = manifest(&document)
            .unwrap_or_else(|e| panic!("{filename} should manifest: {e}"));
        let formatted = format(&source).unwrap();
        assert_eq!(manifested, formatted, "{filename}: manifest and format disagree");
        assert_eq!(format(&formatted).unwrap(), formatted, "{filename}: format is not stable");
    }

    #[test]
    fn test_service() {
        check("service.jsonnet");
    }

    #[test]
    fn test_comprehensions() {
        check("comprehensions.jsonnet");
    }

    #[test]
    fn test_functions() {
        check("functions.jsonnet");
    }

    #[test]
    fn test_comments() {
        check("comments.jsonnet");
        let formatted = format(&read_test_file("ok", "comments.jsonnet")).unwrap();
        assert!(formatted.starts_with("// Deployment settings.\n"));
        assert!(formatted.contains("name: 'api',  // inline note"));
        assert!(formatted.contains("8080,  // http"));
        assert!(formatted.contains("    first line\n      indented line\n  |||,"));
    }

    #[test]
    fn test_inheritance() {
        check("inheritance.jsonnet");
    }

    #[test]
    fn test_service_is_already_canonical() {
        let source = read_test_file("ok", "service.jsonnet");
        assert_eq!(format(&source).unwrap(), source);
    }

    #[test]
    fn test_document_serializes_to_yaml() {
        let source = read_test_file("ok", "inheritance.jsonnet");
        let result = parse_with(&source, &ParseOptions::default()).unwrap();
        let yaml = result.to_yaml().unwrap();
        assert!(yaml.contains("__kind__: Local"));
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json, parse(&source).unwrap());
    }
}

// Invalid snippets: every one is a syntax error
mod bad_tests {
    use super::*;

    fn check(filename: &str) -> String {
        let source = read_test_file("bad", filename);
        match parse(&source) {
            Err(JsonnetError::Syntax(err)) => err.to_string(),
            other => panic!("{filename} should fail to parse, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string() {
        assert!(check("unterminated_string.jsonnet").contains("unterminated string"));
    }

    #[test]
    fn test_missing_comma() {
        assert!(check("missing_comma.jsonnet").starts_with("3:3"));
    }

    #[test]
    fn test_duplicate_field() {
        assert!(check("duplicate_field.jsonnet").contains("duplicate field: a"));
    }

    #[test]
    fn test_computed_import() {
        assert!(check("computed_import.jsonnet").contains("computed imports are not allowed"));
    }

    #[test]
    fn test_missing_expression() {
        assert!(check("missing_expression.jsonnet").starts_with("1:11"));
    }

    #[test]
    fn test_format_reports_the_same_error() {
        let source = read_test_file("bad", "missing_comma.jsonnet");
        assert!(matches!(format(&source), Err(JsonnetError::Syntax(_))));
    }
}
