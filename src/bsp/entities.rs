//! Entity lump text.
//!
//! Flat, one level deep and repeated across many blocks, distinct from the
//! nested KeyValues format:
//!
//! ```text
//! {
//! "classname" "info_player_start"
//! "origin" "0 0 0"
//! }
//! ```

/// One entity record: quoted key/value pairs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pairs: Vec<(String, String)>,
}

impl Entity {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn class_name(&self) -> Option<&str> {
        self.get("classname")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses the entity lump. Lenient: lines without a quoted pair are skipped,
/// a NUL line terminates the list.
pub fn parse_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<Entity> = None;

    for line in text.lines() {
        let line = line.trim();
        if line == "\0" {
            break;
        }
        match line {
            "{" => current = Some(Entity::default()),
            "}" => entities.extend(current.take()),
            _ => {
                // quoted segments sit at the odd positions of a quote split
                let mut quoted = line.split('"').skip(1).step_by(2);
                let (Some(key), Some(value)) = (quoted.next(), quoted.next()) else {
                    continue;
                };
                if let Some(entity) = current.as_mut() {
                    entity.pairs.push((key.to_string(), value.to_string()));
                } else {
                    log::warn!("entity pair outside a block: {line}");
                }
            }
        }
    }
    entities
}

#[cfg(test)]
mod entity_tests {
    use super::parse_entities;

    const LUMP: &str = "{\n\"classname\" \"worldspawn\"\n\"skyname\" \"sky_day01_01\"\n}\n{\n\"classname\" \"info_player_start\"\n\"origin\" \"0 16 -32\"\n}\n\0";

    #[test]
    fn parses_blocks_in_order() {
        let entities = parse_entities(LUMP);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].class_name(), Some("worldspawn"));
        assert_eq!(entities[1].get("origin"), Some("0 16 -32"));
    }

    #[test]
    fn values_keep_spaces() {
        let entities = parse_entities("{\n\"message\" \"a b  c\"\n}\n");
        assert_eq!(entities[0].get("message"), Some("a b  c"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let entities = parse_entities("{\nnot a pair\n\"k\" \"v\"\n}\n");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].iter().count(), 1);
        assert_eq!(entities[0].get("k"), Some("v"));
    }
}
