//! 63-bit time-ordered unique identifiers.
//!
//! Snowflake layout: 41 bits of milliseconds since a custom epoch,
//! 10 bits of node id, 12 bits of per-millisecond sequence. The sign bit
//! stays zero, so every identifier is a positive `i64`.

use anyhow::{Result, bail};
use std::sync::Mutex;

use themis_common::constants::SNOWFLAKE_EPOCH_MS;

const NODE_BITS: u8 = 10;
const SEQUENCE_BITS: u8 = 12;
const MAX_NODE: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

/// Generator state guarded by one mutex; the critical section is a few
/// integer ops, so contention is not a concern at service scale.
struct Clock {
    last_ms: i64,
    sequence: u16,
}

/// Issues globally-unique, monotonically-increasing 63-bit identifiers.
pub struct SnowflakeGenerator {
    node_id: u16,
    clock: Mutex<Clock>,
}

impl SnowflakeGenerator {
    pub fn new(node_id: u16) -> Result<Self> {
        if node_id > MAX_NODE {
            bail!("node id {node_id} exceeds {MAX_NODE}");
        }
        Ok(Self {
            node_id,
            clock: Mutex::new(Clock {
                last_ms: 0,
                sequence: 0,
            }),
        })
    }

    /// Mint the next identifier. Never blocks for longer than one
    /// millisecond (sequence exhaustion within a single tick).
    pub fn next(&self) -> i64 {
        let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());

        let mut now = current_ms();
        // A backwards clock step must not reissue an old tick.
        if now < clock.last_ms {
            now = clock.last_ms;
        }

        if now == clock.last_ms {
            clock.sequence = (clock.sequence + 1) & MAX_SEQUENCE;
            if clock.sequence == 0 {
                // 4096 ids in one millisecond; wait out the tick
                while now <= clock.last_ms {
                    now = current_ms();
                }
            }
        } else {
            clock.sequence = 0;
        }
        clock.last_ms = now;

        (now << (NODE_BITS + SEQUENCE_BITS))
            | ((self.node_id as i64) << SEQUENCE_BITS)
            | clock.sequence as i64
    }
}

fn current_ms() -> i64 {
    chrono::Utc::now().timestamp_millis() - SNOWFLAKE_EPOCH_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_positive_and_fit_63_bits() {
        let generator = SnowflakeGenerator::new(1).unwrap();
        for _ in 0..100 {
            let id = generator.next();
            assert!(id > 0);
        }
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let generator = SnowflakeGenerator::new(3).unwrap();
        let mut prev = generator.next();
        for _ in 0..5000 {
            let id = generator.next();
            assert!(id > prev);
            prev = id;
        }
    }

    #[test]
    fn node_id_is_embedded() {
        let generator = SnowflakeGenerator::new(42).unwrap();
        let id = generator.next();
        assert_eq!((id >> SEQUENCE_BITS) & MAX_NODE as i64, 42);
    }

    #[test]
    fn rejects_out_of_range_node() {
        assert!(SnowflakeGenerator::new(1024).is_err());
    }
}
