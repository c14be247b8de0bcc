//! Property-based tests for rust_log_layer using proptest

use proptest::prelude::*;
use rust_log_layer::prelude::*;
use rust_log_layer::LevelGate;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn small_object() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map("[a-e]", any::<i64>(), 0..5)
}

fn to_json(map: &BTreeMap<String, i64>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), json!(v))).collect())
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        let parsed: LogLevel = level.as_lowercase().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that LogLevel ordering matches its discriminant
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        prop_assert_eq!(level1 <= level2, (level1 as u8) <= (level2 as u8));
        prop_assert_eq!(level1 < level2, (level1 as u8) < (level2 as u8));
    }
}

// ============================================================================
// Level gate
// ============================================================================

proptest! {
    /// Without overrides a level passes exactly when it meets the minimum
    #[test]
    fn test_gate_threshold(min in any_level(), level in any_level(), enabled in any::<bool>()) {
        let mut gate = LevelGate::new(min);
        gate.set_enabled(enabled);
        prop_assert_eq!(gate.is_level_enabled(level), enabled && level >= min);
    }

    /// Individual overrides win over the threshold, never over the master switch
    #[test]
    fn test_gate_overrides(
        min in any_level(),
        level in any_level(),
        allow in any::<bool>(),
        enabled in any::<bool>(),
    ) {
        let mut gate = LevelGate::new(min);
        gate.set_enabled(enabled);
        if allow {
            gate.enable_individual_level(level);
        } else {
            gate.disable_individual_level(level);
        }
        prop_assert_eq!(gate.is_level_enabled(level), enabled && allow);

        gate.set_level(min);
        prop_assert_eq!(gate.is_level_enabled(level), enabled && level >= min);
    }

    /// The logger emits exactly the calls the gate lets through
    #[test]
    fn test_logger_emits_only_enabled_levels(
        min in any_level(),
        calls in prop::collection::vec(any_level(), 0..20),
    ) {
        let memory = MemoryTransport::new("memory");
        let logger = Logger::builder().level(min).transport(memory.clone()).build();

        for level in &calls {
            logger.log(*level, "message");
        }

        let expected: Vec<LogLevel> = calls.into_iter().filter(|l| *l >= min).collect();
        let emitted: Vec<LogLevel> = memory.records().iter().map(|r| r.level).collect();
        prop_assert_eq!(emitted, expected);
    }
}

// ============================================================================
// Context merge
// ============================================================================

proptest! {
    /// Sequential with_context calls equal a right-biased shallow merge
    #[test]
    fn test_context_merge_right_biased(
        updates in prop::collection::vec(small_object(), 1..6),
    ) {
        let memory = MemoryTransport::new("memory");
        let logger = Logger::builder().transport(memory.clone()).build();

        let mut expected = BTreeMap::new();
        for update in &updates {
            logger.with_context(to_json(update));
            expected.extend(update.clone());
        }
        logger.info("merged");

        let expected = to_json(&expected);
        let data = memory.data().pop().unwrap();
        if expected.as_object().is_some_and(Map::is_empty) {
            prop_assert_eq!(data, Value::Null);
        } else {
            prop_assert_eq!(data, expected);
        }
    }

    /// A child's context changes never reach the parent
    #[test]
    fn test_child_context_isolated(parent_ctx in small_object(), child_ctx in small_object()) {
        let parent = Logger::new();
        parent.with_context(to_json(&parent_ctx));
        let before = parent.get_context().to_map_lossy();

        let child = parent.child();
        child.with_context(to_json(&child_ctx));
        child.clear_context(None);

        prop_assert_eq!(parent.get_context().to_map_lossy(), before);
    }
}

// ============================================================================
// Group filter parsing
// ============================================================================

proptest! {
    /// Display output parses back to the same filter
    #[test]
    fn test_group_filter_display_roundtrip(
        entries in prop::collection::vec(("[a-z]{1,8}", prop::option::of(any_level())), 0..5),
    ) {
        let text = entries
            .iter()
            .map(|(name, level)| match level {
                Some(level) => format!("{}:{}", name, level.as_lowercase()),
                None => name.clone(),
            })
            .collect::<Vec<_>>()
            .join(",");

        let filter: GroupFilter = text.parse().unwrap();
        prop_assert_eq!(filter.to_string(), text.clone());
        prop_assert_eq!(GroupFilter::parse_lenient(&text), filter);
    }

    /// Lenient parsing never fails and keeps only well-formed entries
    #[test]
    fn test_group_filter_lenient_never_panics(input in ".{0,40}") {
        let filter = GroupFilter::parse_lenient(&input);
        for name in filter.names() {
            prop_assert!(!name.is_empty());
        }
    }
}
