//! # Common Types

/// Opaque client identifier.
pub type ClientId = Vec<u8>;

/// Render a client id for logs and error messages.
pub fn client_id_display(id: &[u8]) -> String {
    String::from_utf8_lossy(id).into_owned()
}

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type FSHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> FSHashMap<K, V> {
            FSHashMap::with_capacity(capacity)
        }
    } else {
        /// Type Alias for hash maps in this crate.
        pub type FSHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> FSHashMap<K, V> {
            FSHashMap::with_capacity(capacity)
        }
    }
}

#[cfg(test)]
pub(crate) fn check_is_send<S: Send>(_: &S) {}

#[cfg(test)]
pub(crate) fn check_is_sync<S: Sync>(_: &S) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_display() {
        assert_eq!(client_id_display(b"00001"), "00001");
        assert_eq!(client_id_display(&[0xff, b'a']), "\u{fffd}a");
    }

    #[test]
    fn test_hash_map_alias() {
        let mut map: FSHashMap<Vec<u8>, u32> = hash_map_with_capacity(2);
        map.insert(b"a".to_vec(), 0);
        assert_eq!(map.get(b"a".as_slice()), Some(&0));
    }
}
