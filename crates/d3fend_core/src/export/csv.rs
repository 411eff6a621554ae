//! Delimited-text export of filtered techniques.
//!
//! # Invariants
//! - First line is the header `ID,Name,Tactic,Description`.
//! - Every field is enclosed in double quotes; embedded quotes are doubled.
//! - Every record, header included, ends with `\n`.

use crate::model::taxonomy::Technique;
use crate::store::TaxonomyStore;
use log::info;

/// Suggested download file name for hosts.
pub const EXPORT_FILE_NAME: &str = "d3fend_matrix_export.csv";

const EXPORT_HEADER: &str = "ID,Name,Tactic,Description";

/// Renders `techniques` as quoted CSV, in input order.
///
/// The Tactic column carries the category name, or the raw category id when
/// the category is unknown.
pub fn export_csv(store: &TaxonomyStore, techniques: &[Technique]) -> String {
    let mut out = String::with_capacity(64 * (techniques.len() + 1));
    out.push_str(EXPORT_HEADER);
    out.push('\n');

    for technique in techniques {
        let fields = [
            technique.id.as_str(),
            technique.name.as_str(),
            store.category_name_or_id(&technique.category_id),
            technique.description.as_str(),
        ];
        let record = fields
            .iter()
            .map(|field| quote_field(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&record);
        out.push('\n');
    }

    info!(
        "event=export_csv module=export status=ok rows={}",
        techniques.len()
    );
    out
}

fn quote_field(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::quote_field;

    #[test]
    fn quote_field_doubles_embedded_quotes() {
        assert_eq!(quote_field(r#"say "hi""#), r#""say ""hi""""#);
        assert_eq!(quote_field(""), r#""""#);
        assert_eq!(quote_field("a,b"), r#""a,b""#);
    }
}
