#![no_main]

use libfuzzer_sys::fuzz_target;
use dango_parser::{Action, Parser, State};

fuzz_target!(|data: &[u8]| {
    let mut parser = Parser::new();
    let mut actions = Vec::new();

    // Feed the data to the parser - it should never panic
    parser.parse(data, |action| {
        actions.push(action);
    });

    // Verify invariants:
    // 1. The since-ground log is empty exactly in ground state
    // 2. Actions are well-formed
    assert_eq!(parser.pending().is_empty(), parser.state() == State::Ground);
    for action in &actions {
        match action {
            Action::CsiDispatch { params, .. } => {
                assert!(params.len() <= dango_parser::params::MAX_PARAMS);
            }
            Action::OscDispatch { data, .. } => {
                assert!(data.len() <= 1024 * 1024);
            }
            _ => {}
        }
    }
});
