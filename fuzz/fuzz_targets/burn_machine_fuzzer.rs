//! Fuzz target for the burn state machine
//!
//! Drives a `BurnMachine` with arbitrary event sequences, including events
//! delivered out of order and records that were tampered with.
//!
//! # Strategy
//!
//! - Random interleavings of start / fetched / fetch-failed / deleted
//! - Fetched records that are absent, genuine, bit-flipped, or filed under
//!   another id
//! - Both burn modes
//!
//! # Invariants
//!
//! - NEVER panic
//! - `Delete` is only emitted after a record was fetched
//! - Plaintext is only revealed for the genuine record and equals it
//! - Terminal states never emit further actions
//! - A fetch failure never yields `Destroyed`
//! - A record filed under another id is refused and never leaves `Locating`

#![no_main]

use arbitrary::Arbitrary;
use deaddrop_core::{
    BurnAction, BurnMachine, BurnMode, BurnOutcome, BurnState, DropId, EncryptionKey,
    SealedDrop, StoredDrop,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Event {
    Start,
    FetchedNone,
    FetchedGenuine,
    FetchedTampered { index: u16, mask: u8 },
    FetchedForeign { id: u128 },
    FetchFailed,
    Deleted,
}

#[derive(Debug, Arbitrary)]
struct Input {
    atomic: bool,
    key: [u8; 32],
    nonce: [u8; 12],
    plaintext: Vec<u8>,
    events: Vec<Event>,
}

fuzz_target!(|input: Input| {
    let key = EncryptionKey::from_bytes(input.key);
    let drop_id = DropId::from(1u128);
    let sealed = deaddrop_crypto::seal(&input.plaintext, &key, input.nonce);
    let genuine = StoredDrop { id: drop_id.clone(), record: SealedDrop::new(sealed, 0) };

    let mode = if input.atomic { BurnMode::AtomicTake } else { BurnMode::ReadThenDelete };
    let mut machine = BurnMachine::new(drop_id, key, mode);
    let mut fetched = false;

    for event in input.events.into_iter().take(64) {
        let was_terminal = machine.state().is_terminal();

        let result = match event {
            Event::Start => machine.start().map(Some),
            Event::FetchedNone => machine.handle_fetched(None).map(Some),
            Event::FetchedGenuine => machine.handle_fetched(Some(genuine.clone())).map(Some),
            Event::FetchedTampered { index, mask } => {
                let mut tampered = genuine.clone();
                let len = tampered.record.ciphertext.len();
                let mask = mask.max(1);
                tampered.record.ciphertext[usize::from(index) % len] ^= mask;
                machine.handle_fetched(Some(tampered)).map(Some)
            },
            Event::FetchedForeign { id } => {
                let mut foreign = genuine.clone();
                foreign.id = DropId::from(id.max(2));
                let state = machine.state();
                let result = machine.handle_fetched(Some(foreign)).map(Some);
                if state == BurnState::Locating {
                    assert!(result.is_err());
                    assert_eq!(machine.state(), BurnState::Locating);
                }
                result
            },
            Event::FetchFailed => {
                let result = machine.handle_fetch_failed().map(|()| None);
                if result.is_ok() {
                    assert_eq!(machine.state(), BurnState::Locating);
                }
                result
            },
            Event::Deleted => machine.handle_deleted().map(Some),
        };

        if was_terminal {
            assert!(result.is_err(), "terminal state accepted {event:?}");
        }

        match result {
            Ok(Some(BurnAction::Delete(_))) => {
                assert_eq!(mode, BurnMode::ReadThenDelete);
                assert!(matches!(event, Event::FetchedGenuine | Event::FetchedTampered { .. }));
                fetched = true;
            },
            Ok(Some(BurnAction::Finish(BurnOutcome::Revealed(payload)))) => {
                assert_eq!(payload.as_bytes(), input.plaintext.as_slice());
                assert!(fetched || mode == BurnMode::AtomicTake);
            },
            Ok(Some(BurnAction::Finish(BurnOutcome::Destroyed))) => {
                assert!(matches!(event, Event::FetchedNone));
            },
            _ => {},
        }
    }
});
