use diskmap::{Builder, Codec, Error, Getter, Json, Map, MockGetter, Raw, StreamBuilder};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

/// A documentation record of the kind the maps are built to serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocEntity {
    ident: String,
    kind: String,
    docstring: String,
    score: f64,
    children: Vec<String>,
}

fn entity(i: usize) -> DocEntity {
    DocEntity {
        ident: format!("pkg.module.fn_{i}"),
        kind: if i % 2 == 0 { "function" } else { "type" }.to_string(),
        docstring: format!("Documentation for symbol {i}. ").repeat(i % 7 + 1),
        score: i as f64 / 10.0,
        children: (0..i % 4).map(|c| format!("child_{c}")).collect(),
    }
}

/// Compares two decoded entities field by field so a mismatch names the field.
fn assert_same_entity(actual: &DocEntity, expected: &DocEntity) {
    assert_eq!(actual.ident, expected.ident, "ident");
    assert_eq!(actual.kind, expected.kind, "kind of {}", expected.ident);
    assert_eq!(actual.docstring, expected.docstring, "docstring of {}", expected.ident);
    assert_eq!(actual.score, expected.score, "score of {}", expected.ident);
    assert_eq!(actual.children, expected.children, "children of {}", expected.ident);
}

#[test]
fn test_json_entities_through_batch_builder() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("docs.diskmap");

    let mut builder = Builder::new();
    for i in (0..64).rev() {
        Json.add(&mut builder, &i.to_string(), &entity(i))?;
    }
    builder.write_to_file(&path)?;

    let map = Map::open(&path)?;
    assert_eq!(map.len(), 64);

    for i in 0..64 {
        let decoded: DocEntity = Json.get(&map, &i.to_string())?;
        assert_same_entity(&decoded, &entity(i));
    }

    let missing: diskmap::Result<DocEntity> = Json.get(&map, "64");
    assert!(missing.unwrap_err().is_not_found());

    Ok(())
}

#[test]
fn test_json_entities_through_stream_builder() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("docs-stream.diskmap");

    let mut keys: Vec<String> = (0..40).map(|i| format!("{i:03}")).collect();
    keys.sort();

    let mut stream = StreamBuilder::create(&path)?;
    for (i, key) in keys.iter().enumerate() {
        Json.add(&mut stream, key, &entity(i))?;
    }
    stream.close()?;

    let map = Map::open(&path)?;
    assert_eq!(map.keys()?, keys);
    for (i, key) in keys.iter().enumerate() {
        let decoded: DocEntity = Json.get(&map, key)?;
        assert_same_entity(&decoded, &entity(i));
    }

    Ok(())
}

#[test]
fn test_disk_and_mock_getters_agree() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("agree.diskmap");

    let mut builder = Builder::new();
    let mut mock = MockGetter::new();
    for i in 0..25 {
        let bytes = Json.marshal(&entity(i))?;
        builder.add(entity(i).ident, bytes.clone());
        mock.insert(entity(i).ident, bytes);
    }
    builder.write_to_file(&path)?;
    let map = Map::open(&path)?;

    fn lookup(getter: &dyn Getter, ident: &str) -> Option<DocEntity> {
        match getter.get(ident) {
            Ok(bytes) => Some(Json.unmarshal(&bytes).expect("valid entity")),
            Err(Error::NotFound) => None,
            Err(e) => panic!("lookup of {ident} failed: {e}"),
        }
    }

    for i in 0..30 {
        let ident = format!("pkg.module.fn_{i}");
        match (lookup(&map, &ident), lookup(&mock, &ident)) {
            (Some(from_disk), Some(from_memory)) => assert_same_entity(&from_disk, &from_memory),
            (None, None) => assert!(i >= 25),
            (disk, memory) => panic!("{ident}: disk={disk:?} memory={memory:?}"),
        }
    }

    Ok(())
}

#[test]
fn test_raw_strings_round_trip() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("raw.diskmap");

    let mut builder = Builder::with_block_size(3);
    for word in ["zeta", "alpha", "mu", "beta", "omega", "kappa", "delta"] {
        Raw.add(&mut builder, word, &word.to_uppercase())?;
    }
    builder.write_to_file(&path)?;

    let map = Map::open(&path)?;
    assert_eq!(
        map.keys()?,
        vec!["alpha", "beta", "delta", "kappa", "mu", "omega", "zeta"]
    );

    let kappa: String = Raw.get(&map, "kappa")?;
    assert_eq!(kappa, "KAPPA");
    let raw: Vec<u8> = Raw.get(&map, "zeta")?;
    assert_eq!(raw, b"ZETA");

    Ok(())
}

#[test]
fn test_rewrite_replaces_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("rewrite.diskmap");

    let mut first = Builder::new();
    for i in 0..50 {
        first.add(format!("old{i}"), "old");
    }
    first.write_to_file(&path)?;

    let mut second = Builder::new();
    second.add("new", "value");
    second.write_to_file(&path)?;

    let map = Map::open(&path)?;
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("new")?, b"value");
    assert!(map.get("old0").unwrap_err().is_not_found());

    Ok(())
}
