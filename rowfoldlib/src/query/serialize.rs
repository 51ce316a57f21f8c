//! Join serialization: fold each group of joined rows into one record.
//!
//! A join query repeats the parent columns once per child row. Folding a
//! group walks its rows in order and, column by column:
//!
//! 1. stores the first value seen as a single value;
//! 2. leaves a single value alone when the next value is equal;
//! 3. promotes a single value to a two-element list when a different value
//!    arrives;
//! 4. appends to an existing list, skipping values already present.
//!
//! Composite fields are lists from their first row on and never skip
//! entries. The legacy mode drops the key column and never skips list
//! entries either.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::group::group_by;
use super::options::{CompositeField, JoinMode, JoinOptions};
use crate::data::{Record, ResultSet, Scalar, Source};
use crate::error::RowfoldError;
use crate::Result;

/// One member of a merged field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Scalar(Scalar),
    /// Object projected for a composite field
    Object(Record),
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Scalar(value) => write!(f, "{}", value),
            Item::Object(record) => {
                let parts: Vec<String> = record
                    .iter()
                    .map(|(attribute, value)| format!("{}: {}", attribute, value))
                    .collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

impl From<Scalar> for Item {
    fn from(value: Scalar) -> Self {
        Item::Scalar(value)
    }
}

/// A merged field: one value, or an ordered list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Single(Item),
    List(Vec<Item>),
}

impl Field {
    pub fn is_list(&self) -> bool {
        matches!(self, Field::List(_))
    }

    /// The members of this field, a single value counting as one
    pub fn items(&self) -> &[Item] {
        match self {
            Field::Single(item) => std::slice::from_ref(item),
            Field::List(items) => items,
        }
    }
}

/// How an incoming value is folded into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoldRule {
    /// Promote on difference, list members unique
    Distinct,
    /// Promote on difference, list members always appended
    Append,
    /// Always a list, members always appended
    Collect,
}

/// One denormalized record per group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRecord {
    fields: Vec<(String, Field)>,
}

impl MergedRecord {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, field)| field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn fold(&mut self, column: &str, item: Item, rule: FoldRule) {
        let Some(index) = self.fields.iter().position(|(name, _)| name == column) else {
            let field = match rule {
                FoldRule::Collect => Field::List(vec![item]),
                FoldRule::Distinct | FoldRule::Append => Field::Single(item),
            };
            self.fields.push((column.to_string(), field));
            return;
        };

        let field = &mut self.fields[index].1;
        let promoted = match &mut *field {
            Field::List(items) => {
                if rule != FoldRule::Distinct || !items.contains(&item) {
                    items.push(item);
                }
                None
            }
            Field::Single(existing) if *existing != item => {
                tracing::trace!(column, "promoting field to list");
                Some(Field::List(vec![existing.clone(), item]))
            }
            Field::Single(_) => None,
        };
        if let Some(promoted) = promoted {
            *field = promoted;
        }
    }
}

impl From<&Record> for MergedRecord {
    fn from(record: &Record) -> Self {
        MergedRecord {
            fields: record
                .iter()
                .map(|(column, value)| {
                    (column.to_string(), Field::Single(value.clone().into()))
                })
                .collect(),
        }
    }
}

impl Serialize for MergedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, field) in &self.fields {
            map.serialize_entry(column, field)?;
        }
        map.end()
    }
}

/// Output of a serialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedResultSet {
    #[serde(skip_serializing_if = "Source::is_empty")]
    pub source: Source,
    /// Columns of the merged records, composite fields last
    pub columns: Vec<String>,
    pub records: Vec<MergedRecord>,
}

impl MergedResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Unmerged view of a result set: every row as-is, every field single.
impl From<&ResultSet> for MergedResultSet {
    fn from(result_set: &ResultSet) -> Self {
        MergedResultSet {
            source: result_set.source.clone(),
            columns: result_set.columns.clone(),
            records: result_set.results.iter().map(MergedRecord::from).collect(),
        }
    }
}

/// Fold rows sharing a `key_column` value into one record each.
///
/// Columns whose values differ within a group become lists of distinct
/// values in first-seen order. Each composite field adds one object per row,
/// collected into a list under the field's name. A composite field sharing a
/// name with a result column replaces that column; when two composite fields
/// share a name, the later declaration is used.
pub fn serialize_by(
    result_set: &ResultSet,
    key_column: &str,
    composites: &[CompositeField],
) -> MergedResultSet {
    let mut columns: Vec<String> = result_set
        .columns
        .iter()
        .filter(|column| !composites.iter().any(|c| &c.name == *column))
        .cloned()
        .collect();
    for composite in composites {
        if columns.contains(&composite.name) {
            tracing::debug!(name = %composite.name, "composite field declared again; last wins");
        } else {
            columns.push(composite.name.clone());
        }
    }

    let records = group_by(&result_set.results, key_column)
        .into_iter()
        .map(|group| {
            let mut merged = MergedRecord::default();
            for row in group.records {
                for column in &columns {
                    match composites.iter().rev().find(|c| &c.name == column) {
                        Some(composite) => {
                            let object = Item::Object(project(row, composite));
                            merged.fold(column, object, FoldRule::Collect);
                        }
                        None => {
                            if let Some(value) = row.get(column) {
                                let value = Item::Scalar(value.clone());
                                merged.fold(column, value, FoldRule::Distinct);
                            }
                        }
                    }
                }
            }
            merged
        })
        .collect();

    MergedResultSet {
        source: result_set.source.clone(),
        columns,
        records,
    }
}

/// Fold rows the way older callers expect.
///
/// The key column is left out of the output, no composite fields are built,
/// and once a column holds a list every further value is appended, repeats
/// included.
pub fn serialize_legacy(result_set: &ResultSet, key_column: &str) -> MergedResultSet {
    let columns: Vec<String> = result_set
        .columns
        .iter()
        .filter(|column| *column != key_column)
        .cloned()
        .collect();

    let records = group_by(&result_set.results, key_column)
        .into_iter()
        .map(|group| {
            let mut merged = MergedRecord::default();
            for row in group.records {
                for column in &columns {
                    if let Some(value) = row.get(column) {
                        merged.fold(column, Item::Scalar(value.clone()), FoldRule::Append);
                    }
                }
            }
            merged
        })
        .collect();

    MergedResultSet {
        source: result_set.source.clone(),
        columns,
        records,
    }
}

/// Serialize according to `options`.
///
/// With `strict` set, a key column missing from the schema is an error;
/// otherwise such rows all share the "absent" key and fold into one record.
pub fn serialize(result_set: &ResultSet, options: &JoinOptions) -> Result<MergedResultSet> {
    if options.strict && !result_set.has_column(&options.key) {
        return Err(RowfoldError::UnknownKeyColumn(options.key.clone()));
    }

    match options.mode {
        JoinMode::Rich => Ok(serialize_by(result_set, &options.key, &options.composites)),
        JoinMode::Legacy => {
            if let Some(field) = options.composites.first() {
                return Err(RowfoldError::InvalidComposite {
                    spec: field.to_string(),
                    message: "composite fields are not available in legacy mode".to_string(),
                });
            }
            Ok(serialize_legacy(result_set, &options.key))
        }
    }
}

/// Object holding `composite`'s attributes projected from `row`.
///
/// Columns the row does not have project as `null`.
fn project(row: &Record, composite: &CompositeField) -> Record {
    composite
        .attributes
        .iter()
        .map(|(attribute, column)| {
            let value = row.get(column).cloned().unwrap_or_default();
            (attribute.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publications() -> ResultSet {
        let rows = [
            ("2", "Bob", "Jump Up", "2006"),
            ("2", "Bob", "Sit Down", "2008"),
            ("2", "Doug", "Fly Fishing", "2010"),
            ("3", "Sue", "Old Times", "2009"),
        ];
        ResultSet::new(
            ["id", "friend", "pubtitle", "pubyear"],
            rows.iter()
                .map(|(id, friend, title, year)| {
                    Record::new()
                        .with("id", *id)
                        .with("friend", *friend)
                        .with("pubtitle", *title)
                        .with("pubyear", *year)
                })
                .collect(),
        )
    }

    fn publication_field() -> CompositeField {
        CompositeField::new("publication")
            .attribute("title", "pubtitle")
            .attribute("year", "pubyear")
    }

    fn single(value: &str) -> Field {
        Field::Single(Item::Scalar(value.into()))
    }

    fn list(values: &[&str]) -> Field {
        Field::List(values.iter().map(|v| Item::Scalar((*v).into())).collect())
    }

    fn texts(field: Option<&Field>) -> Vec<String> {
        field
            .map(|f| f.items().iter().map(|i| i.to_string()).collect())
            .unwrap_or_default()
    }

    fn publication(title: &str, year: &str) -> Item {
        Item::Object(Record::new().with("title", title).with("year", year))
    }

    #[test]
    fn test_publications_example() {
        let merged = serialize_by(&publications(), "id", &[publication_field()]);

        assert_eq!(
            merged.columns,
            vec!["id", "friend", "pubtitle", "pubyear", "publication"]
        );
        assert_eq!(merged.len(), 2);

        let first = &merged.records[0];
        assert_eq!(first.get("id"), Some(&single("2")));
        assert_eq!(first.get("friend"), Some(&list(&["Bob", "Doug"])));
        assert_eq!(
            first.get("pubtitle"),
            Some(&list(&["Jump Up", "Sit Down", "Fly Fishing"]))
        );
        assert_eq!(first.get("pubyear"), Some(&list(&["2006", "2008", "2010"])));
        assert_eq!(
            first.get("publication"),
            Some(&Field::List(vec![
                publication("Jump Up", "2006"),
                publication("Sit Down", "2008"),
                publication("Fly Fishing", "2010"),
            ]))
        );

        let second = &merged.records[1];
        assert_eq!(second.get("id"), Some(&single("3")));
        assert_eq!(second.get("friend"), Some(&single("Sue")));
        assert_eq!(second.get("pubtitle"), Some(&single("Old Times")));
        assert_eq!(second.get("pubyear"), Some(&single("2009")));
        assert_eq!(
            second.get("publication"),
            Some(&Field::List(vec![publication("Old Times", "2009")]))
        );
    }

    #[test]
    fn test_json_shape() {
        let merged = serialize_by(&publications(), "id", &[publication_field()]);
        let json = serde_json::to_value(&merged.records[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "3",
                "friend": "Sue",
                "pubtitle": "Old Times",
                "pubyear": "2009",
                "publication": [{"title": "Old Times", "year": "2009"}]
            })
        );
    }

    #[test]
    fn test_constant_columns_stay_single() {
        let merged = serialize_by(&publications(), "id", &[]);
        for record in &merged.records {
            assert!(!record.get("id").unwrap().is_list());
        }
        assert!(merged.columns.iter().all(|c| c != "publication"));
    }

    #[test]
    fn test_list_members_are_deduplicated() {
        let rs = ResultSet::new(
            ["id", "tag"],
            vec![
                Record::new().with("id", 1).with("tag", "a"),
                Record::new().with("id", 1).with("tag", "b"),
                Record::new().with("id", 1).with("tag", "a"),
                Record::new().with("id", 1).with("tag", "b"),
                Record::new().with("id", 1).with("tag", "c"),
            ],
        );
        let merged = serialize_by(&rs, "id", &[]);
        assert_eq!(merged.records[0].get("tag"), Some(&list(&["a", "b", "c"])));
    }

    #[test]
    fn test_identical_composites_are_kept() {
        let rs = ResultSet::new(
            ["id", "pubtitle", "pubyear"],
            vec![
                Record::new()
                    .with("id", 1)
                    .with("pubtitle", "Same")
                    .with("pubyear", "2001"),
                Record::new()
                    .with("id", 1)
                    .with("pubtitle", "Same")
                    .with("pubyear", "2001"),
            ],
        );
        let merged = serialize_by(&rs, "id", &[publication_field()]);
        let record = &merged.records[0];

        assert_eq!(record.get("pubtitle"), Some(&single("Same")));
        assert_eq!(
            record.get("publication"),
            Some(&Field::List(vec![
                publication("Same", "2001"),
                publication("Same", "2001"),
            ]))
        );
    }

    #[test]
    fn test_composite_projects_missing_columns_as_null() {
        let rs = ResultSet::new(["id"], vec![Record::new().with("id", 1)]);
        let merged = serialize_by(&rs, "id", &[publication_field()]);

        let expected = Record::new()
            .with("title", Scalar::Null)
            .with("year", Scalar::Null);
        assert_eq!(
            merged.records[0].get("publication"),
            Some(&Field::List(vec![Item::Object(expected)]))
        );
    }

    #[test]
    fn test_composite_replaces_same_named_column() {
        let rs = ResultSet::new(
            ["id", "title"],
            vec![Record::new().with("id", 1).with("title", "Jump Up")],
        );
        let field = CompositeField::new("title").attribute("text", "title");
        let merged = serialize_by(&rs, "id", &[field]);

        assert_eq!(merged.columns, vec!["id", "title"]);
        assert_eq!(
            merged.records[0].get("title"),
            Some(&Field::List(vec![Item::Object(
                Record::new().with("text", "Jump Up")
            )]))
        );
    }

    #[test]
    fn test_repeated_composite_name_uses_last_declaration() {
        let rs = ResultSet::new(
            ["id", "a", "b"],
            vec![
                Record::new().with("id", 1).with("a", "x").with("b", "y"),
                Record::new().with("id", 1).with("a", "x2").with("b", "y2"),
            ],
        );
        let first = CompositeField::new("p").attribute("t", "a");
        let second = CompositeField::new("p").attribute("t", "b");
        let merged = serialize_by(&rs, "id", &[first, second]);

        assert_eq!(merged.columns, vec!["id", "a", "b", "p"]);
        assert_eq!(
            merged.records[0].get("p"),
            Some(&Field::List(vec![
                Item::Object(Record::new().with("t", "y")),
                Item::Object(Record::new().with("t", "y2")),
            ]))
        );
    }

    #[test]
    fn test_numbers_fold_by_value() {
        let rs = ResultSet::from_json_str(
            r#"{"columns": ["id", "n"], "results": [[2, 5], [2.0, 5.0], [1e0, 1], [1, 1.5]]}"#,
        )
        .unwrap();
        let merged = serialize_by(&rs, "id", &[]);

        assert_eq!(merged.len(), 2);
        // Equal numbers stay single; the first spelling is kept
        assert_eq!(texts(merged.records[0].get("n")), vec!["5"]);
        assert_eq!(texts(merged.records[1].get("n")), vec!["1", "1.5"]);
    }

    #[test]
    fn test_input_rows_untouched() {
        let rs = publications();
        let before = rs.clone();
        let _ = serialize_by(&rs, "id", &[publication_field()]);
        assert_eq!(rs, before);
        assert!(!rs.results[0].contains("publication"));
    }

    #[test]
    fn test_empty_result_set() {
        let rs = ResultSet::new(["id", "friend"], vec![]);
        assert!(serialize_by(&rs, "id", &[publication_field()]).is_empty());
        assert!(serialize_legacy(&rs, "id").is_empty());
    }

    #[test]
    fn test_absent_cells_contribute_nothing() {
        let rs = ResultSet::new(
            ["id", "nick"],
            vec![
                Record::new().with("id", 1),
                Record::new().with("id", 1).with("nick", "bo"),
                Record::new().with("id", 1),
            ],
        );
        let merged = serialize_by(&rs, "id", &[]);
        assert_eq!(merged.records[0].get("nick"), Some(&single("bo")));

        let rs = ResultSet::new(["id", "nick"], vec![Record::new().with("id", 1)]);
        assert_eq!(serialize_by(&rs, "id", &[]).records[0].get("nick"), None);
    }

    #[test]
    fn test_null_is_a_value() {
        let rs = ResultSet::new(
            ["id", "nick"],
            vec![
                Record::new().with("id", 1).with("nick", Scalar::Null),
                Record::new().with("id", 1).with("nick", "bo"),
            ],
        );
        let merged = serialize_by(&rs, "id", &[]);
        assert_eq!(
            merged.records[0].get("nick"),
            Some(&Field::List(vec![
                Item::Scalar(Scalar::Null),
                Item::Scalar("bo".into())
            ]))
        );
    }

    #[test]
    fn test_legacy_drops_key_and_keeps_repeats() {
        let rs = ResultSet::new(
            ["id", "tag"],
            vec![
                Record::new().with("id", 1).with("tag", "a"),
                Record::new().with("id", 1).with("tag", "a"),
                Record::new().with("id", 1).with("tag", "b"),
                Record::new().with("id", 1).with("tag", "a"),
                Record::new().with("id", 2).with("tag", "z"),
            ],
        );
        let merged = serialize_legacy(&rs, "id");

        assert_eq!(merged.columns, vec!["tag"]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.records[0].get("id"), None);
        assert_eq!(merged.records[0].get("tag"), Some(&list(&["a", "b", "a"])));
        assert_eq!(merged.records[1].get("tag"), Some(&single("z")));
    }

    #[test]
    fn test_serialize_with_options() {
        let rs = publications();
        let options = JoinOptions::new("id").composite(publication_field());
        let rich = serialize(&rs, &options).unwrap();
        assert_eq!(rich, serialize_by(&rs, "id", &[publication_field()]));

        let legacy = serialize(&rs, &JoinOptions::new("id").mode(JoinMode::Legacy)).unwrap();
        assert_eq!(legacy, serialize_legacy(&rs, "id"));
    }

    #[test]
    fn test_serialize_legacy_rejects_composites() {
        let options = JoinOptions::new("id")
            .mode(JoinMode::Legacy)
            .composite(publication_field());
        let err = serialize(&publications(), &options).unwrap_err();
        assert!(matches!(err, RowfoldError::InvalidComposite { .. }));
    }

    #[test]
    fn test_unknown_key_column() {
        let rs = publications();

        // Permissive: every row shares the absent key
        let merged = serialize(&rs, &JoinOptions::new("person_id")).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged.records[0].get("friend"),
            Some(&list(&["Bob", "Doug", "Sue"]))
        );

        let err = serialize(&rs, &JoinOptions::new("person_id").strict(true)).unwrap_err();
        assert!(matches!(err, RowfoldError::UnknownKeyColumn(ref k) if k == "person_id"));
    }

    #[test]
    fn test_unmerged_view() {
        let rs = publications();
        let view = MergedResultSet::from(&rs);
        assert_eq!(view.len(), 4);
        assert_eq!(view.columns, rs.columns);
        assert_eq!(view.records[2].get("friend"), Some(&single("Doug")));
    }

    #[test]
    fn test_item_display() {
        assert_eq!(
            publication("Jump Up", "2006").to_string(),
            "title: Jump Up, year: 2006"
        );
        assert_eq!(Item::Scalar(3.into()).to_string(), "3");
        assert_eq!(list(&["a", "b"]).items().len(), 2);
        assert_eq!(single("a").items().len(), 1);
    }
}
