//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// A small set of paths, so generated edits collide often.
pub const PATH_POOL: &[&str] = &["a.md", "notes/b.md", "notes/deep/c.txt"];

/// A valid relative filepath of one to three segments.
pub fn filepath() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,7}(/[a-z][a-z0-9_-]{0,7}){0,2}\\.(md|txt)".prop_map(String::from)
}

/// File content of at most `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A path from [`PATH_POOL`].
pub fn pooled_path() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PATH_POOL)
}

/// One step of a multi-client scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Write {
        client: usize,
        path: &'static str,
        content: Vec<u8>,
    },
    Delete {
        client: usize,
        path: &'static str,
    },
    Sync {
        client: usize,
    },
}

pub fn edit(clients: usize) -> impl Strategy<Value = Edit> {
    let client = 0..clients;
    prop_oneof![
        3 => (client.clone(), pooled_path(), content(16))
            .prop_map(|(client, path, content)| Edit::Write { client, path, content }),
        1 => (client.clone(), pooled_path()).prop_map(|(client, path)| Edit::Delete { client, path }),
        2 => client.prop_map(|client| Edit::Sync { client }),
    ]
}

/// A sequence of up to `max_len` edits across `clients` clients.
pub fn edit_script(clients: usize, max_len: usize) -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit(clients), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inksync_core::validate_path;

    proptest! {
        #[test]
        fn prop_generated_paths_are_valid(path in filepath()) {
            prop_assert!(validate_path(&path).is_ok());
        }

        #[test]
        fn prop_edits_target_known_clients(script in edit_script(3, 10)) {
            for edit in script {
                let client = match edit {
                    Edit::Write { client, .. } | Edit::Delete { client, .. } | Edit::Sync { client } => client,
                };
                prop_assert!(client < 3);
            }
        }
    }
}
