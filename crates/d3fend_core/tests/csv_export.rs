use d3fend_core::{
    apply_filter, export_csv, Category, TaxonomyDataset, TaxonomyStore, Technique, TechniqueFilter,
};

/// Minimal RFC 4180 reader: quoted fields, doubled quotes, `\n` records.
fn parse_quoted_csv(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) => in_quotes = true,
            (',', false) => record.push(std::mem::take(&mut field)),
            ('\n', false) => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            (other, _) => field.push(other),
        }
    }
    records
}

fn store_with(techniques: Vec<Technique>) -> TaxonomyStore {
    TaxonomyStore::try_new(TaxonomyDataset {
        categories: vec![Category {
            id: "harden".to_string(),
            name: "Harden".to_string(),
            description: String::new(),
        }],
        techniques,
        ..TaxonomyDataset::default()
    })
    .expect("dataset should validate")
}

fn technique(id: &str, name: &str, category_id: &str, description: &str) -> Technique {
    Technique {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
        description: description.to_string(),
        artifact_names: Vec::new(),
    }
}

#[test]
fn export_has_header_and_one_quoted_record_per_technique() {
    let store = TaxonomyStore::builtin().expect("builtin dataset should load");
    let filtered = apply_filter(store.techniques(), &TechniqueFilter::new("harden", ""));
    let csv = export_csv(&store, &filtered);

    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "ID,Name,Tactic,Description");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with(r#""D3-CH","Credential Hardening","Harden","#));
    assert!(csv.ends_with('\n'));
}

#[test]
fn quotes_round_trip_through_standard_csv_parsing() {
    let name = r#"The "Quoted", Technique"#;
    let description = "Line with \"quotes\" and, commas";
    let store = store_with(vec![technique("D3-Q", name, "harden", description)]);

    let csv = export_csv(&store, store.techniques());
    assert!(csv.contains(r#""The ""Quoted"", Technique""#));

    let records = parse_quoted_csv(&csv);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], vec!["ID", "Name", "Tactic", "Description"]);
    assert_eq!(records[1], vec!["D3-Q", name, "Harden", description]);
}

#[test]
fn unknown_category_falls_back_to_raw_id() {
    let store = store_with(vec![technique("D3-O", "Orphan", "ghost", "")]);
    let records = parse_quoted_csv(&export_csv(&store, store.techniques()));
    assert_eq!(records[1][2], "ghost");
}
