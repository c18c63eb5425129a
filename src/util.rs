//! Small helpers shared by the client, the DTOs and the CLI.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{MatrixError, Result};

/// Domain appended to bare instance names.
pub const DEFAULT_DOMAIN: &str = "matrixreq.com";

pub const MIME_BINARY: &str = "application/octet-stream";

const LABEL_START: &str = "(";
const LABEL_END: &str = ")";
const LABEL_SEPARATOR: char = ',';

/// Turns an instance name into its base URL.
///
/// `"myorg"` → `"https://myorg.matrixreq.com"`. Anything starting with
/// `http` is returned unchanged.
pub fn fix_instance(instance: &str) -> String {
    fix_instance_with_domain(instance, DEFAULT_DOMAIN)
}

/// Same as [`fix_instance`] with a custom domain.
pub fn fix_instance_with_domain(instance: &str, domain: &str) -> String {
    if instance.starts_with("http") {
        return instance.to_owned();
    }
    let mut url = format!("https://{instance}");
    if !url.ends_with(&format!(".{domain}")) {
        url.push('.');
        url.push_str(domain);
    }
    url
}

/// Form-style percent encoding (space becomes `+`), for path segments and
/// hand-built query strings.
pub fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// `2014-09-05T09:05:08.986Z`.
pub fn format_iso8601_utc(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// MIME type from a file name's extension, `application/octet-stream` when
/// unknown.
pub fn mime_type_of_file(file_name: impl AsRef<Path>) -> &'static str {
    let extension = file_name
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xsl" | "xslt" => "text/xml+xsl",
        "bmp" => "image/bmp",
        "css" => "text/css",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "gif" => "image/gif",
        "html" | "htm" => "text/html",
        "jpg" | "jpeg" => "image/jpeg",
        "js" => "application/javascript",
        "json" => "application/json",
        "odt" => "application/vnd.oasis.opendocument.text",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xml" => "text/xml",
        "zip" => "application/zip",
        _ => MIME_BINARY,
    }
}

/// Decodes a label field such as `"(red),(blue)"` into its labels.
///
/// Empty `()` entries are skipped. Any entry not wrapped in parentheses is
/// an error.
pub fn decode_label_field(field: &str) -> Result<Vec<String>> {
    let mut labels = Vec::new();
    if field.is_empty() {
        return Ok(labels);
    }
    for entry in field.split(LABEL_SEPARATOR) {
        let label = entry
            .strip_prefix(LABEL_START)
            .and_then(|rest| rest.strip_suffix(LABEL_END))
            .ok_or_else(|| {
                MatrixError::InvalidArgument(format!("error decoding field for labels: {field}"))
            })?;
        if !label.is_empty() {
            labels.push(label.to_owned());
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn fix_instance_expands_bare_names() {
        assert_eq!(fix_instance("myorg"), "https://myorg.matrixreq.com");
    }

    #[test]
    fn fix_instance_keeps_full_urls() {
        assert_eq!(
            fix_instance("https://custom.example.com"),
            "https://custom.example.com"
        );
        assert_eq!(fix_instance("http://localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn fix_instance_does_not_double_the_domain() {
        assert_eq!(
            fix_instance("myorg.matrixreq.com"),
            "https://myorg.matrixreq.com"
        );
        assert_eq!(
            fix_instance_with_domain("acme", "example.org"),
            "https://acme.example.org"
        );
    }

    #[test]
    fn url_encode_is_form_style() {
        assert_eq!(url_encode("a b&c/d"), "a+b%26c%2Fd");
        assert_eq!(url_encode("plain"), "plain");
    }

    #[test]
    fn iso8601_has_millis_and_z() {
        let at = Utc.with_ymd_and_hms(2014, 9, 5, 9, 5, 8).unwrap()
            + chrono::Duration::milliseconds(986);
        assert_eq!(format_iso8601_utc(at), "2014-09-05T09:05:08.986Z");
    }

    #[test]
    fn mime_lookup_by_extension() {
        assert_eq!(mime_type_of_file("report.PDF"), "application/pdf");
        assert_eq!(mime_type_of_file("dir/image2015-9-6 16:14:58.png"), "image/png");
        assert_eq!(mime_type_of_file("style.xslt"), "text/xml+xsl");
        assert_eq!(mime_type_of_file("no_extension"), MIME_BINARY);
        assert_eq!(mime_type_of_file("archive.unknown"), MIME_BINARY);
    }

    #[test]
    fn decode_label_field_variants() {
        assert_eq!(
            decode_label_field("(red),(blue)").unwrap(),
            vec!["red".to_owned(), "blue".to_owned()]
        );
        assert!(decode_label_field("").unwrap().is_empty());
        assert!(decode_label_field("()").unwrap().is_empty());
        assert!(decode_label_field("(red),blue").is_err());
    }
}
