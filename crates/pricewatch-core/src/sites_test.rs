use std::io::Write;

use super::*;

const VALID: &str = r#"
sites:
  - id: iusa
    url: https://www.tiendaiusa.com/tubo-rigido-tipo-l-tramo-de-61-m-1-2-308761
    currency: mxn
    unit_divisor: 6.1
    unit_label: m
    navigation_timeout_ms: 60000
    strategies:
      - kind: css
        selector: "span[class*='sellingPriceValue']"
        timeout_ms: 15000
  - id: sodimac
    url: https://www.sodimac.com.mx/sodimac-mx/product/265926/
    currency: MXN
    unit_divisor: "6.0"
    navigation_timeout_ms: 60000
    strategies:
      - kind: attribute_prefix
        attribute: data-testid
        prefix: price-
        timeout_ms: 10000
      - kind: text_contains
        scope: div
        text: "$"
        timeout_ms: 5000
"#;

fn with_site_field(field: &str, value: &str) -> String {
    format!(
        r#"
sites:
  - id: a
    url: https://a.example.com/p
    currency: USD
    unit_divisor: 2
    navigation_timeout_ms: 1000
    strategies:
      - kind: css
        selector: span.price
        timeout_ms: 500
    {field}: {value}
"#
    )
}

fn validation_message(result: Result<SitesFile, ConfigError>) -> String {
    match result {
        Err(ConfigError::Validation(msg)) => msg,
        other => panic!("expected validation error, got: {other:?}"),
    }
}

#[test]
fn parses_valid_sites_in_file_order() {
    let sites = parse_sites(VALID).unwrap();
    let queries = sites.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].site_id, "iusa");
    assert_eq!(queries[1].site_id, "sodimac");
}

#[test]
fn converts_site_to_query() {
    let sites = parse_sites(VALID).unwrap();
    let iusa = &sites.queries()[0];
    assert_eq!(iusa.currency, "MXN");
    assert_eq!(iusa.unit_divisor, Decimal::new(61, 1));
    assert_eq!(iusa.unit_label.as_deref(), Some("m"));
    assert_eq!(iusa.navigation_timeout, Duration::from_secs(60));
    assert_eq!(
        iusa.strategies,
        vec![SelectorStrategy::CssSelector {
            selector: "span[class*='sellingPriceValue']".to_owned(),
            timeout: Duration::from_secs(15),
        }]
    );
}

#[test]
fn accepts_divisor_as_string() {
    let sites = parse_sites(VALID).unwrap();
    assert_eq!(sites.sites[1].unit_divisor, Decimal::new(6, 0));
    assert!(sites.sites[1].unit_label.is_none());
}

#[test]
fn keeps_fallback_order() {
    let sites = parse_sites(VALID).unwrap();
    let sodimac = &sites.queries()[1];
    assert_eq!(
        sodimac.strategies[0].locator().to_string(),
        "[data-testid^='price-']"
    );
    assert_eq!(
        sodimac.strategies[1].locator().to_string(),
        "div:has-text('$')"
    );
}

#[test]
fn rejects_duplicate_ids_case_insensitively() {
    let yaml = VALID.replace("id: sodimac", "id: IUSA");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("duplicate site id"), "{msg}");
}

#[test]
fn rejects_non_http_url() {
    let yaml = VALID.replace(
        "https://www.sodimac.com.mx/sodimac-mx/product/265926/",
        "ftp://example.com",
    );
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("invalid url"), "{msg}");
}

#[test]
fn rejects_bad_currency() {
    let yaml = VALID.replace("currency: mxn", "currency: pesos");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("invalid currency"), "{msg}");
}

#[test]
fn rejects_zero_divisor() {
    let yaml = VALID.replace("unit_divisor: 6.1", "unit_divisor: 0");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("non-positive unit_divisor"), "{msg}");
}

#[test]
fn rejects_negative_divisor() {
    let yaml = VALID.replace("unit_divisor: 6.1", "unit_divisor: -6.1");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("non-positive unit_divisor"), "{msg}");
}

#[test]
fn rejects_unparseable_divisor() {
    let yaml = VALID.replace("unit_divisor: 6.1", "unit_divisor: six");
    let result = parse_sites(&yaml);
    assert!(
        matches!(result, Err(ConfigError::SitesFileParse(_))),
        "got: {result:?}"
    );
}

#[test]
fn rejects_zero_navigation_timeout() {
    let yaml = VALID.replacen("navigation_timeout_ms: 60000", "navigation_timeout_ms: 0", 1);
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("zero navigation_timeout_ms"), "{msg}");
}

#[test]
fn rejects_zero_strategy_timeout() {
    let yaml = VALID.replace("timeout_ms: 15000", "timeout_ms: 0");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("strategy #0 has zero timeout_ms"), "{msg}");
}

#[test]
fn rejects_empty_strategy_list() {
    let yaml = r"
sites:
  - id: a
    url: https://a.example.com
    currency: USD
    unit_divisor: 1
    navigation_timeout_ms: 1000
    strategies: []
";
    let msg = validation_message(parse_sites(yaml));
    assert!(msg.contains("no strategies"), "{msg}");
}

#[test]
fn rejects_blank_selector() {
    let yaml = VALID.replace("selector: \"span[class*='sellingPriceValue']\"", "selector: \"  \"");
    let msg = validation_message(parse_sites(&yaml));
    assert!(msg.contains("empty selector"), "{msg}");
}

#[test]
fn rejects_selector_after_text_fallback() {
    let yaml = r#"
sites:
  - id: a
    url: https://a.example.com
    currency: USD
    unit_divisor: 1
    navigation_timeout_ms: 1000
    strategies:
      - kind: text_contains
        scope: div
        text: "$"
        timeout_ms: 100
      - kind: css
        selector: span.price
        timeout_ms: 100
"#;
    let msg = validation_message(parse_sites(yaml));
    assert!(msg.contains("text_contains must come last"), "{msg}");
}

#[test]
fn rejects_unknown_site_field() {
    let yaml = with_site_field("retries", "3");
    assert!(matches!(
        parse_sites(&yaml),
        Err(ConfigError::SitesFileParse(_))
    ));
}

#[test]
fn blank_unit_label_becomes_none() {
    let yaml = with_site_field("unit_label", "\"  \"");
    let sites = parse_sites(&yaml).unwrap();
    assert!(sites.queries()[0].unit_label.is_none());
}

#[test]
fn rejects_unknown_strategy_kind() {
    let yaml = VALID.replace("kind: css", "kind: xpath");
    assert!(matches!(
        parse_sites(&yaml),
        Err(ConfigError::SitesFileParse(_))
    ));
}

#[test]
fn load_sites_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VALID.as_bytes()).unwrap();
    let sites = load_sites(file.path()).unwrap();
    assert_eq!(sites.sites.len(), 2);
}

#[test]
fn load_sites_reports_missing_file() {
    let err = load_sites(Path::new("/nonexistent/pricewatch/sites.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::SitesFileIo { .. }));
}
