//! Repeated struct groups addressed by index: `SERVERS_0_HOST`,
//! `SERVERS_0_PORT`, `SERVERS_1_HOST`, ...
//!
//! The number of instances is the first index with no variable under
//! `<prefix><i>_`, so numbering must be contiguous from zero. Elements the
//! target already holds are kept and re-bound; the slice never shrinks.

use tracing::{debug, trace};

use crate::env::Environment;
use crate::error::EnvError;
use crate::options::Options;
use crate::resolve::BindState;
use crate::value::Bindable;
use crate::walk::{FieldAction, walk};

/// Count the index-qualified instances under `prefix`.
///
/// `None` when no variable starts with `prefix` at all, in which case the
/// slice is left untouched.
pub fn count_instances(env: &Environment, prefix: &str) -> Option<usize> {
    let candidates: Vec<&str> = env.keys().filter(|k| k.starts_with(prefix)).collect();
    if candidates.is_empty() {
        return None;
    }

    let mut count = 0;
    loop {
        let indexed = format!("{prefix}{count}_");
        if !candidates.iter().any(|k| k.starts_with(&indexed)) {
            return Some(count);
        }
        count += 1;
    }
}

/// Normalise a slice prefix so it ends with `_`.
fn slice_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('_') {
        prefix.to_string()
    } else {
        format!("{prefix}_")
    }
}

pub(crate) fn bind_slice<T: Bindable>(
    slot: &mut T,
    opts: &Options,
    state: &mut BindState,
    action: &mut dyn FieldAction,
) -> Result<(), EnvError> {
    let prefix = slice_prefix(&opts.prefix);
    let Some(count) = count_instances(state.environment(), &prefix) else {
        trace!(prefix = %prefix, "no variables for struct slice");
        return Ok(());
    };

    let len = slot.assemble(count, &mut |i, element| {
        let element_opts = opts.with_prefix(format!("{prefix}{i}_"));
        walk(element, &element_opts, state, action)
    })?;
    debug!(prefix = %prefix, count, len, "bound struct slice");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Fleet, Server};

    fn env(keys: &[&str]) -> Environment {
        Environment::from_pairs(keys.iter().map(|k| (*k, "x")))
    }

    fn fleet(pairs: &[(&str, &str)]) -> Options {
        Options::new().environment(Environment::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn counts_contiguous_indices() {
        let e = env(&["S_0_HOST", "S_1_HOST", "S_1_PORT", "S_2_PORT"]);
        assert_eq!(count_instances(&e, "S_"), Some(3));
    }

    #[test]
    fn stops_at_first_gap() {
        let e = env(&["S_0_HOST", "S_2_HOST"]);
        assert_eq!(count_instances(&e, "S_"), Some(1));
    }

    #[test]
    fn prefix_present_but_no_index() {
        let e = env(&["S_HOST"]);
        assert_eq!(count_instances(&e, "S_"), Some(0));
    }

    #[test]
    fn nothing_under_prefix() {
        let e = env(&["OTHER_0_HOST"]);
        assert_eq!(count_instances(&e, "S_"), None);
    }

    #[test]
    fn prefix_normalisation() {
        assert_eq!(slice_prefix(""), "");
        assert_eq!(slice_prefix("SERVERS"), "SERVERS_");
        assert_eq!(slice_prefix("SERVERS_"), "SERVERS_");
    }

    #[test]
    fn binds_each_element() {
        let cfg: Fleet = fleet(&[
            ("SERVERS_0_HOST", "a"),
            ("SERVERS_0_PORT", "1"),
            ("SERVERS_1_HOST", "b"),
        ])
        .parse_as()
        .unwrap();
        assert_eq!(
            cfg.servers,
            vec![
                Server {
                    host: "a".into(),
                    port: 1
                },
                Server {
                    host: "b".into(),
                    port: 80
                },
            ]
        );
    }

    #[test]
    fn untouched_without_variables() {
        let mut cfg = Fleet {
            servers: vec![Server {
                host: "keep".into(),
                port: 1,
            }],
            ..Fleet::default()
        };
        fleet(&[]).parse(&mut cfg).unwrap();
        assert_eq!(cfg.servers[0].host, "keep");
        assert_eq!(cfg.servers[0].port, 1);
        assert!(cfg.backups.is_none());
    }

    #[test]
    fn existing_elements_are_reused() {
        let mut cfg = Fleet {
            servers: vec![
                Server {
                    host: "first".into(),
                    port: 1,
                },
                Server {
                    host: "second".into(),
                    port: 2,
                },
            ],
            ..Fleet::default()
        };
        fleet(&[("SERVERS_0_PORT", "10")]).parse(&mut cfg).unwrap();
        assert_eq!(cfg.servers.len(), 2);
        assert_eq!(cfg.servers[0].host, "first");
        assert_eq!(cfg.servers[0].port, 10);
        assert_eq!(cfg.servers[1].host, "second");
    }

    #[test]
    fn pointer_elements_are_allocated() {
        let cfg: Fleet = fleet(&[("STANDBY_0_HOST", "s0"), ("STANDBY_1_HOST", "s1")])
            .parse_as()
            .unwrap();
        let hosts: Vec<String> = cfg
            .standby
            .into_iter()
            .map(|s| s.map(|s| s.host).unwrap_or_default())
            .collect();
        assert_eq!(hosts, vec!["s0", "s1"]);
    }

    #[test]
    fn pointer_to_slice() {
        let cfg: Fleet = fleet(&[("BACKUPS_0_HOST", "b0")]).parse_as().unwrap();
        let backups = cfg.backups.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].host, "b0");

        let cfg: Fleet = fleet(&[("BACKUPS_HOST", "no index")]).parse_as().unwrap();
        assert!(cfg.backups.is_none());
    }

    #[test]
    fn element_errors_are_collected() {
        let err = fleet(&[("SERVERS_0_PORT", "x"), ("SERVERS_1_PORT", "y")])
            .parse_as::<Fleet>()
            .unwrap_err();
        assert_eq!(err.errors().count(), 2);
    }

    #[test]
    fn nested_prefix_carries_into_slices() {
        let cfg: Fleet = fleet(&[("EU_SERVERS_0_HOST", "eu")])
            .prefix("EU_")
            .parse_as()
            .unwrap();
        assert_eq!(cfg.servers[0].host, "eu");
    }
}
