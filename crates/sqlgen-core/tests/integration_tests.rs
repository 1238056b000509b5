//! Integration tests for query documents

use pretty_assertions::assert_eq;
use sqlgen_core::{parse_file, parse_str, ErrorKind, Position, QueryType};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn read_users_fixture() {
    let queries = parse_file(fixture("users.yaml")).unwrap();

    assert_eq!(
        queries.names().collect::<Vec<_>>(),
        vec!["select_user", "list_users", "insert_user", "rename_user", "user_exists", "delete_user"]
    );

    let kinds: Vec<_> = queries.iter().map(|q| q.kind).collect();
    assert_eq!(
        kinds,
        vec![
            QueryType::One,
            QueryType::Many,
            QueryType::RowId,
            QueryType::Affected,
            QueryType::Exist,
            QueryType::Exec,
        ]
    );

    let select = queries.get("select_user").unwrap();
    assert_eq!(select.comment.lines(), ["Find a user by id"]);
    assert_eq!(select.position, Position::new(2, 1));
    assert_eq!(select.out.anchor.as_deref(), Some("User"));
    assert_eq!(select.out.comment.lines(), ["user row"]);
    assert_eq!(select.out.get("name").unwrap().comment.lines(), ["display name"]);

    let list = queries.get("list_users").unwrap();
    assert_eq!(list.comment.lines(), ["Every user, oldest first"]);
    assert_eq!(list.sql.as_str(), "select id, name, created_at\nfrom users\norder by created_at\n");
    assert_eq!(list.out.alias.as_deref(), Some("User"));
    assert_eq!(list.out.as_slice(), select.out.as_slice());

    let delete = queries.get("delete_user").unwrap();
    assert_eq!(delete.params.get("id").unwrap().comment.lines(), ["primary key"]);
}

#[test]
fn canonical_form_is_stable() {
    let queries = parse_file(fixture("users.yaml")).unwrap();
    let once = queries.to_yaml();
    let twice = parse_str(&once).unwrap().to_yaml();

    assert_eq!(once, twice);
}

#[test]
fn canonical_form_preserves_model() {
    let queries = parse_file(fixture("users.yaml")).unwrap();
    let reread = parse_str(&queries.to_yaml()).unwrap();

    for (a, b) in queries.iter().zip(reread.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.comment, b.comment);
        assert_eq!(a.sql.text, b.sql.text);
        assert_eq!(a.params.as_slice().len(), b.params.len());
        assert_eq!(a.out.anchor, b.out.anchor);
        assert_eq!(a.out.alias, b.out.alias);
        assert_eq!(a.out.comment, b.out.comment);

        let types = |fields: &sqlgen_core::Fields| {
            fields
                .iter()
                .map(|f| (f.name.clone(), f.type_name.clone(), f.comment.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(types(&a.params), types(&b.params));
        assert_eq!(types(&a.out), types(&b.out));
    }
}

#[test]
fn first_error_aborts_document() {
    let source = "\
good:
  type: exec
  sql: delete from t
bad:
  type: exec
  sql: delete from t
  out:
    n: int
worse:
  type: nope
  sql: select 1
";
    let err = parse_str(source).unwrap_err();

    assert_eq!(err.kind, ErrorKind::ShapeMismatch);
    assert_eq!(err.query, "bad");
}

#[test]
fn diagnostics_render_located() {
    let err = parse_str("q:\n  type: exec\n  sql: x\n  bogus: 1\n").unwrap_err();
    assert_eq!(err.to_string(), "[4:3] \"q\" unknown property \"bogus\"");
}

#[test]
fn model_serializes_to_json() {
    let queries = parse_str("q:\n  type: id\n  sql: insert into t default values\n").unwrap();
    let json = serde_json::to_value(&queries).unwrap();

    assert_eq!(json[0]["name"], "q");
    assert_eq!(json[0]["type"], "id");
    assert_eq!(json[0]["sql"]["text"], "insert into t default values");
}
