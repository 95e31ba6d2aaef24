use serde::{Deserialize, Serialize};

/// A single qemu argument value: either a bare flag (`-enable-kvm`) or a
/// flag with a value (`-m 4G`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Flag(bool),
    Value(String),
}

/// An insertion-ordered container that allows duplicate keys.
///
/// Qemu's command line takes the same flag many times (`-device ... -device
/// ...`), so every hardware/topology descriptor is one of these rather than
/// a unique-keyed map. There is deliberately no `get(key)`: with duplicate
/// keys a single-value lookup is ill-defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgMap {
    entries: Vec<(String, ArgValue)>,
}

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `key value` pair. Never overwrites an earlier entry with the
    /// same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((key.into(), ArgValue::Value(value.into())));
    }

    /// Append a bare flag with no value.
    pub fn append_flag(&mut self, key: impl Into<String>) {
        self.entries.push((key.into(), ArgValue::Flag(true)));
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into argv form: `-key value` per entry, `-key` for flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in self.iter() {
            args.push(format!("-{}", key));
            if let ArgValue::Value(v) = value {
                args.push(v.clone());
            }
        }
        args
    }
}

impl<'a> IntoIterator for &'a ArgMap {
    type Item = &'a (String, ArgValue);
    type IntoIter = std::slice::Iter<'a, (String, ArgValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_are_kept_in_order() {
        let mut map = ArgMap::new();
        map.append("device", "a");
        map.append("drive", "b");
        map.append("device", "c");

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, "device");
        assert_eq!(entries[1].0, "drive");
        assert_eq!(entries[2], ("device", &ArgValue::Value("c".to_string())));
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut map = ArgMap::new();
        map.append("m", "4G");
        assert_eq!(map.iter().count(), 1);
        assert_eq!(map.iter().count(), 1);
    }

    #[test]
    fn test_to_args_flags_and_values() {
        let mut map = ArgMap::new();
        map.append_flag("enable-kvm");
        map.append("m", "4G");
        assert_eq!(map.to_args(), vec!["-enable-kvm", "-m", "4G"]);
    }

    #[test]
    fn test_serde_round_trip_preserves_duplicates() {
        let mut map = ArgMap::new();
        map.append("device", "a");
        map.append("device", "b");

        let json = serde_json::to_string(&map).unwrap();
        let back: ArgMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
