//! Column-aligned listing of the collections in a file.

use std::fmt::Write;

use crate::reader::ColumnReader;

/// Render the data and relation collection tables of an open file.
pub fn collection_table(reader: &ColumnReader) -> String {
    let mut out = String::new();
    out.push_str("Available Collections\n\n");
    out.push_str(&render_table(
        ("Collection Name", "Data Type"),
        &reader.data_collections(),
    ));
    out.push('\n');
    out.push_str(&render_table(
        ("ObjID Name", "Data Type"),
        &reader.relation_collections(),
    ));
    out
}

/// Two left-aligned columns, each as wide as its longest cell.
pub fn render_table(headers: (&str, &str), rows: &[(&str, &str)]) -> String {
    let name_width = rows
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once(headers.0.len()))
        .max()
        .unwrap_or_default();
    let type_width = rows
        .iter()
        .map(|(_, ty)| ty.len())
        .chain(std::iter::once(headers.1.len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {}", headers.0, headers.1);
    let _ = writeln!(out, "{}  {}", "-".repeat(name_width), "-".repeat(type_width));
    for (name, ty) in rows {
        let _ = writeln!(out, "{name:<name_width$}  {ty}");
    }
    out
}
