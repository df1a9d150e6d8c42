//! Built-in three-process scenario.
//!
//! Processes `a`, `b` and `c` talk over two pipes, `ab` and `bc`; `a` and
//! `c` never exchange a message directly, so everything `c` learns about
//! `a` travels through `b`.

use vclock_core::Action;
use vclock_runtime::{ChannelSpec, TopologySpec};

/// Returns the scenario that runs when the configuration names none.
pub fn builtin() -> TopologySpec {
    let scripts = [
        (
            "a",
            vec![
                Action::send("ab"),
                Action::send("ab"),
                Action::Event,
                Action::receive("ab"),
                Action::Event,
                Action::Event,
                Action::receive("ab"),
            ],
        ),
        (
            "b",
            vec![
                Action::receive("ab"),
                Action::receive("ab"),
                Action::send("ab"),
                Action::receive("bc"),
                Action::Event,
                Action::send("ab"),
                Action::send("bc"),
                Action::send("bc"),
            ],
        ),
        (
            "c",
            vec![
                Action::send("bc"),
                Action::receive("bc"),
                Action::Event,
                Action::receive("bc"),
            ],
        ),
    ];

    TopologySpec {
        processes: vec!["a".into(), "b".into(), "c".into()],
        channels: vec![
            ChannelSpec::new("ab", "a", "b"),
            ChannelSpec::new("bc", "b", "c"),
        ],
        scripts: scripts
            .into_iter()
            .map(|(process, actions)| (process.into(), actions))
            .collect(),
    }
}
