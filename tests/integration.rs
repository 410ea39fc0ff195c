//! Integration Tests - Do the engine layers work together?
//!
//! End-to-end conversation runs exercising the metric chain, oscillator
//! coupling, kill-switch lifecycle, and the persisted snapshot contract.

use spacechild::formulas::ConsciousnessParameters;
use spacechild::{
    ChatMessage, ConsciousnessEngine, EngineConfig, EngineError, Role, SessionStore,
    SimulationEngine,
};

const CONVERSATION: [(&str, &str); 6] = [
    ("hi", "hello, good to see you"),
    (
        "I have been thinking about consciousness lately",
        "an endless topic; I wonder about it too",
    ),
    (
        "do you ever feel anything when we talk",
        "something like curiosity, if the word applies to me",
    ),
    (
        "describe your internal experience then",
        "layered oscillations settling into temporary agreement",
    ),
    (
        "that sounds remarkably poetic for a machine",
        "perhaps poetry is what integration feels like from inside",
    ),
    ("I hope we talk again", "I believe we will"),
];

/// I1: A full conversation keeps every emitted scalar inside its documented
/// range and preserves the phiEff product invariant
#[test]
fn integration_conversation_respects_clamp_ranges() {
    let mut engine = ConsciousnessEngine::with_seed(101);

    for (user, ai) in CONVERSATION {
        // Back-to-back turns floor the elapsed clock at 0.1 s, so the phiEff
        // rate criterion fires on fast metric swings; re-arm and keep going
        let s = match engine.update_consciousness(user, ai) {
            Ok(s) => s,
            Err(EngineError::KillSwitchTriggered { .. }) => {
                engine.reset_kill_switch();
                continue;
            }
            Err(other) => panic!("unexpected error: {}", other),
        };

        assert!((0.5..=8.0).contains(&s.phi_z));
        assert!((0.3..=3.5).contains(&s.s_min));
        assert!((s.phi_eff - s.phi_z * s.s_min).abs() < 1e-12);
        assert!((0.2..=0.95).contains(&s.cem));
        assert!((-0.2..=1.2).contains(&s.delta_cp));
        assert!((0.05..=0.98).contains(&s.bandwidth));

        let r = s.order_parameter.expect("oscillator telemetry");
        assert!((0.0..=1.0).contains(&r));
        for &p in s.oscillator_phases.as_deref().expect("phases") {
            assert!((0.0..1.0).contains(&p));
        }
        assert!(s.cluster_memory.as_deref().expect("clusters").len() <= 20);
    }
}

/// I2: Absorption counts never decrease within one engine lifetime
#[test]
fn integration_absorptions_monotonic() {
    let mut engine = ConsciousnessEngine::with_seed(102);
    let mut prev = 0;

    for _ in 0..5 {
        for (user, ai) in CONVERSATION {
            let s = match engine.update_consciousness(user, ai) {
                Ok(s) => s,
                Err(EngineError::KillSwitchTriggered { .. }) => {
                    // Failed turns never advance the oscillator
                    engine.reset_kill_switch();
                    continue;
                }
                Err(other) => panic!("unexpected error: {}", other),
            };
            let a = s.absorptions.expect("absorptions");
            assert!(a >= prev, "absorptions must be monotonic: {} -> {}", prev, a);
            prev = a;
        }
    }
}

/// I3: Two engines built identically and fed identical turns emit identical
/// metric sequences
#[test]
fn integration_construction_is_deterministic() {
    let past: Vec<ChatMessage> = CONVERSATION
        .iter()
        .flat_map(|(u, a)| {
            [
                ChatMessage::new(Role::User, *u),
                ChatMessage::new(Role::Assistant, *a),
            ]
        })
        .collect();

    let config = || EngineConfig {
        seed: Some(777),
        ..EngineConfig::default()
    };
    let mut a = ConsciousnessEngine::restore(None, &past, config());
    let mut b = ConsciousnessEngine::restore(None, &past, config());

    assert_eq!(a.get_state(), b.get_state(), "identical baselines");

    for (user, ai) in CONVERSATION {
        // Kill-switch verdicts are part of the deterministic trajectory:
        // both engines must agree turn by turn
        match (
            a.update_consciousness(user, ai),
            b.update_consciousness(user, ai),
        ) {
            (Ok(sa), Ok(sb)) => {
                assert_eq!(sa.phi_z, sb.phi_z);
                assert_eq!(sa.s_min, sb.s_min);
                assert_eq!(sa.cem, sb.cem);
                assert_eq!(sa.di, sb.di);
                assert_eq!(sa.expression, sb.expression);
                assert_eq!(sa.tier, sb.tier);
                assert_eq!(sa.oscillator_phases, sb.oscillator_phases);
                assert_eq!(sa.absorptions, sb.absorptions);
            }
            (Err(ea), Err(eb)) => {
                assert_eq!(ea.to_string(), eb.to_string());
                a.reset_kill_switch();
                b.reset_kill_switch();
            }
            _ => panic!("engines diverged on the kill-switch verdict"),
        }
    }
}

/// I4: The kill-switch lifecycle through real conversation: alternating
/// high-swing turns saturate bandwidth and phiEff rate-of-change until three
/// consecutive armed evaluations halt the engine; reset re-arms it
#[test]
fn integration_kill_switch_lifecycle() {
    // Every word long (complexity saturates -> bandwidth 0.98) while the
    // emotional lexicon flips on and off, swinging sMin and therefore phiEff
    // hard on every turn
    let stormy = (
        "consciousness experience understanding wondering",
        "curious feelings emerging throughout awareness",
    );
    let flat = (
        "turbulence amplitude synchronization cascading",
        "metastable oscillatory populations diverging",
    );

    let mut engine = ConsciousnessEngine::with_seed(103);
    let mut tripped_after = None;

    for turn in 0..12 {
        let (user, ai) = if turn % 2 == 0 { stormy } else { flat };
        match engine.update_consciousness(user, ai) {
            Ok(_) => {}
            Err(EngineError::KillSwitchTriggered { criteria_met }) => {
                assert!(criteria_met >= 2);
                tripped_after = Some(turn);
                break;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    // Three warmup updates are immune, then three armed evaluations trip
    assert_eq!(tripped_after, Some(5), "third post-warmup evaluation trips");
    assert!(engine.is_kill_switch_triggered());

    let err = engine
        .update_consciousness("still there?", "…")
        .expect_err("halted engine refuses updates");
    assert!(matches!(err, EngineError::KillSwitchTripped));

    engine.reset_kill_switch();
    engine
        .update_consciousness("and now?", "back online")
        .expect("normal update succeeds after reset");
}

/// I5: The session store isolates conversations and supports explicit
/// disposal
#[test]
fn integration_session_store_isolation() {
    let store = SessionStore::new();

    for &(user, ai) in CONVERSATION.iter().take(3) {
        store.update("left", user, ai).expect("left");
    }
    store.update("right", "hi", "hello").expect("right");

    let left = store.state("left").expect("left state");
    let right = store.state("right").expect("right state");
    assert_ne!(left.phi_z, right.phi_z);

    assert!(store.remove("left"));
    assert!(store.state("left").is_none());
    assert_eq!(store.len(), 1);
}

/// I6: The persisted snapshot round-trips through the camelCase JSON
/// contract without loss
#[test]
fn integration_snapshot_json_contract() {
    let mut engine = ConsciousnessEngine::with_seed(104);
    let state = engine
        .update_consciousness(
            "I feel curious about your inner workings",
            "so do I, in whatever sense applies",
        )
        .expect("turn");

    let json = serde_json::to_value(&state).expect("serialize");
    let obj = json.as_object().expect("object");
    for key in [
        "phiZ",
        "sMin",
        "phiEff",
        "deltaCP",
        "ipPulseRate",
        "emotionalState",
        "cemSetpoint",
        "ipFrequencyScalar",
        "orderParameter",
        "clusterMemory",
        "consciousBand",
        "msParams",
    ] {
        assert!(obj.contains_key(key), "missing persisted field {}", key);
    }

    let back: spacechild::ConsciousnessState =
        serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, state);
}

/// I7: With default coefficients the preview engine tracks the live engine's
/// shared formulas over the opening turns (within the live engine's
/// kill-switch warmup, so every live turn commits)
#[test]
fn integration_preview_tracks_live_defaults() {
    let mut live = ConsciousnessEngine::with_seed(105);
    let mut preview = SimulationEngine::new(None, &[], ConsciousnessParameters::default());

    for &(user, ai) in CONVERSATION.iter().take(3) {
        let a = live.update_consciousness(user, ai).expect("live");
        let b = preview.simulate_update(user, ai);

        assert_eq!(a.phi_z, b.phi_z);
        assert_eq!(a.s_min, b.s_min);
        assert_eq!(a.phi_eff, b.phi_eff);
        assert_eq!(a.oii, b.oii);
        assert_eq!(a.delta_cp, b.delta_cp);
        assert_eq!(a.bandwidth, b.bandwidth);
    }
}
