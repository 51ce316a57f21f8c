//! Fold a results payload by `id`, collecting publications per person.

use rowfoldlib::{serialize_by, CompositeField, ResultSet};
use std::env;

fn main() -> rowfoldlib::Result<()> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "results.json".to_string());
    let key = env::args().nth(2).unwrap_or_else(|| "id".to_string());

    let result_set = ResultSet::from_path(&path)?;
    let publication = CompositeField::new("publication")
        .attribute("title", "pubtitle")
        .attribute("year", "pubyear");
    let merged = serialize_by(&result_set, &key, &[publication]);

    println!("{} rows folded into {} records", result_set.len(), merged.len());
    println!("==========================================");
    for record in &merged.records {
        println!();
        for (column, field) in record.iter() {
            let values: Vec<String> = field.items().iter().map(|i| i.to_string()).collect();
            println!("{:<14}| {}", column, values.join(" / "));
        }
    }
    Ok(())
}
