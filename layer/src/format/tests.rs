use super::*;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
struct TestData {
    name: String,
    value: i32,
}

impl Formattable for TestData {
    fn format_pretty(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Id")]
    id: u32,
    #[tabled(rename = "Name")]
    name: &'static str,
}

fn data() -> TestData {
    TestData {
        name: "test".to_string(),
        value: 42,
    }
}

#[test]
fn test_output_format_from_string() {
    assert_eq!(OutputFormat::from("pretty"), OutputFormat::Pretty);
    assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
    assert_eq!(OutputFormat::from("YAML"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from("yml"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from("invalid"), OutputFormat::Pretty);
}

#[test]
fn test_format_pretty() {
    let result = format_output(&data(), OutputFormat::Pretty).unwrap();
    assert_eq!(result, "test: 42");
}

#[test]
fn test_format_json() {
    let result = format_output(&data(), OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(json["name"], "test");
    assert_eq!(json["value"], 42);
}

#[test]
fn test_format_yaml() {
    let result = format_output(&data(), OutputFormat::Yaml).unwrap();
    assert!(result.contains("name: test"));
    assert!(result.contains("value: 42"));
}

#[test]
fn test_table_has_no_borders() {
    let rendered = table(vec![
        Row { id: 1, name: "one" },
        Row {
            id: 10,
            name: "ten",
        },
    ]);

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines, ["Id  Name", "1   one", "10  ten"]);
}

#[test]
fn test_table_header_only() {
    let rendered = table(Vec::<Row>::new());
    assert_eq!(rendered, "Id  Name");
}

#[test]
fn test_spinner_hidden_when_disabled() {
    let spinner = spinner("resolving", false);
    assert!(spinner.is_hidden());
}
